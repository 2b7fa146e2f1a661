//! Layered error types for route trees.
//!
//! The error hierarchy is structured for actionable diagnostics:
//! - [`ApiError`] - Top-level error type for every request outcome
//! - [`ClientError`] - Network failures, cancellation and unexpected statuses
//! - [`ValidationError`] - Validation responses carrying the parsed error tree
//! - [`ConfigError`] - Route tree construction and configuration errors

mod api_error;
mod client_error;
mod config_error;
mod validation_error;

pub use api_error::ApiError;
pub use client_error::{ClientError, MAX_STATUS_TEXT_CHARS};
pub use config_error::ConfigError;
pub use validation_error::ValidationError;
