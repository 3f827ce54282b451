//! Coursebrief Core Library
//!
//! This crate provides the foundational utilities shared by every coursebrief crate:
//! - Error handling (`AppError`, `AppResult`, `ServiceErrorKind`)
//! - Logging infrastructure
//! - Layered configuration

pub mod config;
pub mod error;
pub mod logging;

// Re-export commonly used types
pub use config::AppConfig;
pub use error::{AppError, AppResult, ServiceErrorKind};
