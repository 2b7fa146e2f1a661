//! The boundary between endpoints and the HTTP stack.
//!
//! An [`Endpoint`](crate::Endpoint) turns a call into a [`TransportRequest`]
//! and hands it to a [`Transport`]. The transport answers with a normalized
//! [`TransportResponse`] for any status, or a [`TransportError`] when no
//! response was obtained. Status classification happens in the endpoint.

mod http;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;
use url::Url;

use crate::config::{Config, HeaderMap};
use crate::method::RestMethod;
use crate::signal::AbortSignal;

pub use http::HttpTransport;

/// Boxed future type for async trait methods.
///
/// This type alias provides dyn-compatible async method returns.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Sends requests built by endpoints.
///
/// This trait is dyn-compatible so endpoints can hold any implementation
/// behind an `Arc<dyn Transport>`; [`HttpTransport`] is the default.
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Sends `request` and returns the normalized response.
    ///
    /// Must resolve to `Ok` for every status code; `Err` is reserved for
    /// requests that produced no response at all.
    fn execute(&self, request: TransportRequest)
        -> BoxFuture<'_, Result<TransportResponse, TransportError>>;
}

/// A file sent as a multipart part.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Attachment {
    pub fn new(
        field: impl Into<String>,
        file_name: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            field: field.into(),
            file_name: file_name.into(),
            content_type: None,
            data: data.into(),
        }
    }

    /// Sets the MIME type of the part.
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Everything a transport needs to send one request.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: RestMethod,
    pub url: Url,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub cookies: HeaderMap,
    /// JSON body; `None` for methods without a body. With attachments,
    /// the members of an object body are sent as text parts.
    pub body: Option<Value>,
    pub attachments: Vec<Attachment>,
    /// The configuration the request was resolved with.
    pub config: Arc<Config>,
}

impl TransportRequest {
    /// The abort signal from the resolved configuration.
    pub fn signal(&self) -> Option<&AbortSignal> {
        self.config.signal.as_ref()
    }

    /// Cookies joined into a single `Cookie` header value.
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .map(|(name, value)| format!("{name}={value}"))
            .collect();
        Some(pairs.join("; "))
    }
}

/// A response normalized for status classification.
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    pub status: u16,
    /// The raw response text.
    pub text: String,
    /// The text decoded as JSON, or the text itself as a JSON string when it
    /// does not decode. `Null` for an empty body.
    pub body: Value,
    /// Response headers with lowercase names.
    pub headers: HeaderMap,
    pub content_type: Option<String>,
    /// Set when the request was cancelled after the response arrived.
    pub was_aborted: bool,
}

impl TransportResponse {
    pub fn new(status: u16, text: impl Into<String>, headers: HeaderMap) -> Self {
        let text = text.into();
        let headers: HeaderMap = headers
            .into_iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value))
            .collect();
        let content_type = headers.get("content-type").cloned();
        let body = decode_body(&text);

        Self {
            status,
            text,
            body,
            headers,
            content_type,
            was_aborted: false,
        }
    }

    /// The status class: 2 for 2xx, 4 for 4xx and so on.
    pub fn status_class(&self) -> u16 {
        self.status / 100
    }
}

fn decode_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Reasons a transport produced no response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The request's abort signal fired.
    #[error("request aborted")]
    Aborted,

    /// The request could not be sent or the response could not be read.
    #[error("network error: {0}")]
    Network(String),

    /// The request was rejected before sending (bad header, bad attachment).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}
