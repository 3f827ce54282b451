//! Provider implementations and shared HTTP failure classification.

mod mock;
mod ollama;
mod openai;

pub use mock::{MockClient, MockReply};
pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

use coursebrief_core::{AppError, ServiceErrorKind};

/// Classify a transport-level reqwest failure.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> AppError {
    let kind = if err.is_decode() {
        ServiceErrorKind::Unexpected
    } else if err.is_connect() || err.is_timeout() || err.is_request() {
        ServiceErrorKind::Connectivity
    } else {
        ServiceErrorKind::Unexpected
    };

    AppError::service(kind, format!("{} request failed: {}", provider, err))
}

/// Classify a non-success HTTP status.
pub(crate) fn status_error(provider: &str, status: u16, body: &str) -> AppError {
    let kind = status_kind(status);
    AppError::service(kind, format!("{} API error ({}): {}", provider, status, body))
}

fn status_kind(status: u16) -> ServiceErrorKind {
    if status == 429 {
        ServiceErrorKind::RateLimit
    } else {
        ServiceErrorKind::Status(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_kind() {
        assert_eq!(status_kind(429), ServiceErrorKind::RateLimit);
        assert_eq!(status_kind(500), ServiceErrorKind::Status(500));
        assert_eq!(status_kind(401), ServiceErrorKind::Status(401));
    }

    #[test]
    fn test_status_error_message() {
        let err = status_error("openai", 503, "overloaded");
        assert_eq!(err.service_kind(), Some(ServiceErrorKind::Status(503)));
        assert!(err.to_string().contains("overloaded"));
    }
}
