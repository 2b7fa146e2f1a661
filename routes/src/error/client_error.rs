//! Request outcome errors from the transport layer.

use thiserror::Error;

/// Response text beyond this many characters is cut from error messages.
pub const MAX_STATUS_TEXT_CHARS: usize = 256;

/// Errors from sending a request or receiving its response.
///
/// Cancellation is its own variant so callers can tell an intentional
/// abort apart from a network failure.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The HTTP client could not be constructed or failed mid-request.
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// No response was obtained.
    #[error("Network error: {message}")]
    Network {
        /// Description of the failure reported by the transport.
        message: String,
    },

    /// The request was cancelled through its abort signal.
    #[error("Request aborted")]
    Aborted,

    /// The response status is neither a success nor a validation status.
    #[error("Invalid response status {status}: {}", truncate_text(.text))]
    InvalidStatus {
        /// The HTTP status code returned.
        status: u16,
        /// The full response text.
        text: String,
    },
}

impl ClientError {
    /// Returns `true` if this error is retryable.
    ///
    /// Network failures are retryable, cancellation never is, and status
    /// errors depend on the status code.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Aborted => false,
            Self::InvalidStatus { status, .. } => {
                // 5xx errors and 429 (rate limit) are retryable
                *status >= 500 || *status == 429
            }
            Self::Request(e) => e.is_timeout() || e.is_connect(),
        }
    }

    /// Returns `true` if the request was aborted.
    pub fn is_aborted(&self) -> bool {
        matches!(self, Self::Aborted)
    }

    /// Returns the HTTP status code if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::InvalidStatus { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

fn truncate_text(text: &str) -> String {
    if text.chars().count() <= MAX_STATUS_TEXT_CHARS {
        return text.to_string();
    }
    let mut truncated: String = text.chars().take(MAX_STATUS_TEXT_CHARS).collect();
    truncated.push_str("...");
    truncated
}
