//! Error types for coursebrief.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! generation-service, extraction, prompt and serialization failures.

use std::fmt;
use thiserror::Error;

/// Classification of a failed call to the text-generation service.
///
/// Every kind is treated as transient by the summarization client; the
/// distinction only matters for logging and the tracking stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorKind {
    /// The request never reached the service (DNS, TCP, TLS, timeout).
    Connectivity,

    /// The service rejected the request because of rate limiting (HTTP 429).
    RateLimit,

    /// The service answered with a non-success HTTP status.
    Status(u16),

    /// Anything else (undecodable body, unexpected payload shape).
    Unexpected,
}

impl ServiceErrorKind {
    /// Short tag used in tracking records.
    pub fn as_tag(&self) -> &'static str {
        match self {
            Self::Connectivity => "connectivity",
            Self::RateLimit => "rate_limit",
            Self::Status(_) => "status",
            Self::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for ServiceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(code) => write!(f, "status {}", code),
            other => f.write_str(other.as_tag()),
        }
    }
}

/// Unified error type for coursebrief.
///
/// Recoverable degradations (empty generations, unreadable documents) are not
/// errors; they travel as values. This enum is reserved for conditions that
/// abort the smallest enclosing unit of work.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Text-generation service errors
    #[error("Service error ({kind}): {message}")]
    Service {
        kind: ServiceErrorKind,
        message: String,
    },

    /// Source text extraction errors
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl AppError {
    /// Build a service error of the given kind.
    pub fn service(kind: ServiceErrorKind, message: impl Into<String>) -> Self {
        AppError::Service {
            kind,
            message: message.into(),
        }
    }

    /// The service failure kind, if this is a service error.
    pub fn service_kind(&self) -> Option<ServiceErrorKind> {
        match self {
            AppError::Service { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_display() {
        let err = AppError::service(ServiceErrorKind::Status(503), "overloaded");
        assert_eq!(err.to_string(), "Service error (status 503): overloaded");
        assert_eq!(err.service_kind(), Some(ServiceErrorKind::Status(503)));
    }

    #[test]
    fn test_service_kind_tags() {
        assert_eq!(ServiceErrorKind::Connectivity.as_tag(), "connectivity");
        assert_eq!(ServiceErrorKind::RateLimit.as_tag(), "rate_limit");
        assert_eq!(ServiceErrorKind::Status(500).as_tag(), "status");
        assert_eq!(ServiceErrorKind::Unexpected.as_tag(), "unexpected");
    }

    #[test]
    fn test_non_service_error_has_no_kind() {
        let err = AppError::Config("bad".to_string());
        assert!(err.service_kind().is_none());
    }
}
