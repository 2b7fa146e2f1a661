//! Top-level API error type.

use super::{ClientError, ConfigError, ValidationError};
use thiserror::Error;

/// Top-level error type for all route operations.
///
/// Configuration errors are raised synchronously, before any request is
/// sent. Every other variant describes a request outcome and passes through
/// the route's `mutate_error` hook before it reaches the caller.
///
/// ## Examples
///
/// ```rust,ignore
/// use routes::error::ApiError;
///
/// fn handle_error(err: ApiError) {
///     match err {
///         ApiError::Client(e) if e.is_aborted() => {}
///         ApiError::Client(e) => eprintln!("Request failed: {e}"),
///         ApiError::Validation(e) => eprintln!("Invalid input: {e}"),
///         ApiError::Config(e) => eprintln!("Configuration error: {e}"),
///     }
/// }
/// ```
#[derive(Debug, Error)]
pub enum ApiError {
    /// Network errors, cancellation and unexpected response statuses.
    #[error(transparent)]
    Client(#[from] ClientError),

    /// The server rejected the request with a validation status.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Route tree or configuration errors.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ApiError {
    /// Returns `true` if retrying the request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Client(e) => e.is_retryable(),
            Self::Validation(_) | Self::Config(_) => false,
        }
    }

    /// Returns `true` if the request was cancelled through its abort signal.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Client(e) if e.is_aborted())
    }

    /// Returns the validation error, if this is one.
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Self::Validation(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the HTTP status of the response, when one was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Client(e) => e.status_code(),
            Self::Validation(e) => Some(e.status()),
            Self::Config(_) => None,
        }
    }
}
