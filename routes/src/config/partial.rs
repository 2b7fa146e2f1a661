//! Partial (per-node or per-request) configuration.

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use super::resolved::{MutateErrorFn, MutateRawResponseFn, MutateResponseFn};
use super::source::HeaderSource;
use crate::error::{ApiError, ConfigError};
use crate::error_tree::{ParseErrorsFn, PrepareErrorFn};
use crate::signal::AbortSignal;
use crate::transport::TransportResponse;

/// A status set written either as a single code or as a list.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum StatusCodes {
    One(u16),
    Many(Vec<u16>),
}

impl StatusCodes {
    /// Normalizes to a list; a single code becomes a one-element list.
    pub fn to_vec(&self) -> Vec<u16> {
        match self {
            Self::One(code) => vec![*code],
            Self::Many(codes) => codes.clone(),
        }
    }
}

impl From<u16> for StatusCodes {
    fn from(code: u16) -> Self {
        Self::One(code)
    }
}

impl From<Vec<u16>> for StatusCodes {
    fn from(codes: Vec<u16>) -> Self {
        Self::Many(codes)
    }
}

impl<const N: usize> From<[u16; N]> for StatusCodes {
    fn from(codes: [u16; N]) -> Self {
        Self::Many(codes.to_vec())
    }
}

/// Configuration supplied by a single node or a single request.
///
/// Every key is optional; unset keys inherit from the parent (or the
/// defaults). Data keys can be loaded from JSON with
/// [`from_json`](PartialConfig::from_json); hooks, strategies and the abort
/// signal are set in code.
///
/// ## Examples
///
/// ```rust
/// use routes::PartialConfig;
///
/// let config = PartialConfig::new()
///     .api_root("https://api.example.com")
///     .headers([("Authorization", "Token abc")])
///     .status_success(200);
///
/// let loaded = PartialConfig::from_json(r#"{"status_success": [200, 201]}"#).unwrap();
/// assert!(loaded.api_root.is_none());
/// ```
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
    /// Prefix prepended to every endpoint path.
    pub api_root: Option<String>,
    pub headers: Option<HeaderSource>,
    pub cookies: Option<HeaderSource>,
    #[serde(skip)]
    pub mutate_response: Option<MutateResponseFn>,
    #[serde(skip)]
    pub mutate_error: Option<MutateErrorFn>,
    #[serde(skip)]
    pub mutate_raw_response: Option<MutateRawResponseFn>,
    pub status_success: Option<StatusCodes>,
    pub status_validation_error: Option<StatusCodes>,
    pub default_accept_header: Option<String>,
    pub allow_attachments: Option<bool>,
    #[serde(skip)]
    pub signal: Option<AbortSignal>,
    #[serde(skip)]
    pub parse_errors: Option<ParseErrorsFn>,
    #[serde(skip)]
    pub prepare_error: Option<PrepareErrorFn>,
}

impl PartialConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes the data keys of a configuration document.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::Parse`] if the document is not valid JSON or
    /// has a key of the wrong type.
    pub fn from_json(document: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(document)?)
    }

    /// Merges `other` on top of `self`: keys set in `other` overwrite,
    /// everything else is kept.
    pub fn merge(&mut self, other: PartialConfig) {
        fn take<T>(slot: &mut Option<T>, value: Option<T>) {
            if value.is_some() {
                *slot = value;
            }
        }

        take(&mut self.api_root, other.api_root);
        take(&mut self.headers, other.headers);
        take(&mut self.cookies, other.cookies);
        take(&mut self.mutate_response, other.mutate_response);
        take(&mut self.mutate_error, other.mutate_error);
        take(&mut self.mutate_raw_response, other.mutate_raw_response);
        take(&mut self.status_success, other.status_success);
        take(&mut self.status_validation_error, other.status_validation_error);
        take(&mut self.default_accept_header, other.default_accept_header);
        take(&mut self.allow_attachments, other.allow_attachments);
        take(&mut self.signal, other.signal);
        take(&mut self.parse_errors, other.parse_errors);
        take(&mut self.prepare_error, other.prepare_error);
    }

    pub fn api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = Some(api_root.into());
        self
    }

    pub fn headers(mut self, headers: impl Into<HeaderSource>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    pub fn cookies(mut self, cookies: impl Into<HeaderSource>) -> Self {
        self.cookies = Some(cookies.into());
        self
    }

    pub fn mutate_response<F>(mut self, f: F) -> Self
    where
        F: Fn(Value, &TransportResponse) -> Value + Send + Sync + 'static,
    {
        self.mutate_response = Some(Arc::new(f));
        self
    }

    pub fn mutate_error<F>(mut self, f: F) -> Self
    where
        F: Fn(ApiError, Option<&TransportResponse>) -> ApiError + Send + Sync + 'static,
    {
        self.mutate_error = Some(Arc::new(f));
        self
    }

    pub fn mutate_raw_response<F>(mut self, f: F) -> Self
    where
        F: Fn(TransportResponse) -> TransportResponse + Send + Sync + 'static,
    {
        self.mutate_raw_response = Some(Arc::new(f));
        self
    }

    pub fn status_success(mut self, codes: impl Into<StatusCodes>) -> Self {
        self.status_success = Some(codes.into());
        self
    }

    pub fn status_validation_error(mut self, codes: impl Into<StatusCodes>) -> Self {
        self.status_validation_error = Some(codes.into());
        self
    }

    pub fn default_accept_header(mut self, accept: impl Into<String>) -> Self {
        self.default_accept_header = Some(accept.into());
        self
    }

    pub fn allow_attachments(mut self, allow: bool) -> Self {
        self.allow_attachments = Some(allow);
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn parse_errors(mut self, strategy: ParseErrorsFn) -> Self {
        self.parse_errors = Some(strategy);
        self
    }

    pub fn prepare_error(mut self, strategy: PrepareErrorFn) -> Self {
        self.prepare_error = Some(strategy);
        self
    }
}

impl fmt::Debug for PartialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hook = |set: bool| if set { Some("<fn>") } else { None };

        f.debug_struct("PartialConfig")
            .field("api_root", &self.api_root)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies)
            .field("mutate_response", &hook(self.mutate_response.is_some()))
            .field("mutate_error", &hook(self.mutate_error.is_some()))
            .field("mutate_raw_response", &hook(self.mutate_raw_response.is_some()))
            .field("status_success", &self.status_success)
            .field("status_validation_error", &self.status_validation_error)
            .field("default_accept_header", &self.default_accept_header)
            .field("allow_attachments", &self.allow_attachments)
            .field("signal", &self.signal)
            .field("parse_errors", &hook(self.parse_errors.is_some()))
            .field("prepare_error", &hook(self.prepare_error.is_some()))
            .finish()
    }
}
