//! The default transport, backed by `reqwest`.

use std::sync::{Arc, OnceLock};

use reqwest::header::{HeaderName, HeaderValue, COOKIE};
use reqwest::multipart::{Form, Part};
use serde_json::Value;
use tracing::{trace, warn};

use super::{BoxFuture, HeaderMap, Transport, TransportError, TransportRequest, TransportResponse};
use crate::error::ClientError;

static SHARED: OnceLock<Arc<HttpTransport>> = OnceLock::new();

/// Sends requests with a pooled `reqwest::Client`.
///
/// Requests carrying an abort signal race the exchange against the
/// signal; the first to finish wins.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a transport with its own connection pool.
    ///
    /// ## Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new() -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()
            .map_err(ClientError::Request)?;
        Ok(Self { client })
    }

    /// Wraps an existing client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// The process-wide transport endpoints use unless given another.
    ///
    /// Built like [`new`](HttpTransport::new); if that fails the default
    /// `reqwest::Client` is used instead.
    pub fn shared() -> Arc<HttpTransport> {
        SHARED
            .get_or_init(|| {
                let transport = HttpTransport::new().unwrap_or_else(|e| {
                    warn!(error = %e, "falling back to the default HTTP client");
                    HttpTransport::with_client(reqwest::Client::default())
                });
                Arc::new(transport)
            })
            .clone()
    }

    fn build(&self, request: TransportRequest) -> Result<reqwest::RequestBuilder, TransportError> {
        let cookie = request.cookie_header();
        let mut builder = self
            .client
            .request(request.method.to_reqwest(), request.url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(header_name(name)?, header_value(name, value)?);
        }
        if let Some(cookie) = cookie {
            builder = builder.header(COOKIE, header_value("Cookie", &cookie)?);
        }

        if !request.attachments.is_empty() {
            let mut form = Form::new();
            if let Some(Value::Object(fields)) = request.body {
                for (name, value) in fields {
                    let text = match value {
                        Value::String(text) => text,
                        other => other.to_string(),
                    };
                    form = form.text(name, text);
                }
            }
            for attachment in request.attachments {
                let mut part = Part::bytes(attachment.data.to_vec()).file_name(attachment.file_name);
                if let Some(content_type) = &attachment.content_type {
                    part = part.mime_str(content_type).map_err(|e| {
                        TransportError::InvalidRequest(format!(
                            "invalid content type {content_type:?}: {e}"
                        ))
                    })?;
                }
                form = form.part(attachment.field, part);
            }
            builder = builder.multipart(form);
        } else if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        Ok(builder)
    }
}

impl Transport for HttpTransport {
    fn execute(
        &self,
        request: TransportRequest,
    ) -> BoxFuture<'_, Result<TransportResponse, TransportError>> {
        Box::pin(async move {
            let signal = request.signal().cloned();
            if signal.as_ref().is_some_and(|signal| signal.is_aborted()) {
                return Err(TransportError::Aborted);
            }

            let builder = self.build(request)?;
            let exchange = async move {
                let response = builder.send().await.map_err(network)?;
                read_response(response).await
            };

            match signal {
                Some(signal) => {
                    tokio::select! {
                        biased;
                        _ = signal.aborted() => {
                            trace!("request aborted in flight");
                            Err(TransportError::Aborted)
                        }
                        result = exchange => result,
                    }
                }
                None => exchange.await,
            }
        })
    }
}

async fn read_response(response: reqwest::Response) -> Result<TransportResponse, TransportError> {
    let status = response.status().as_u16();
    let headers: HeaderMap = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let text = response.text().await.map_err(network)?;

    Ok(TransportResponse::new(status, text, headers))
}

fn network(error: reqwest::Error) -> TransportError {
    TransportError::Network(error.to_string())
}

fn header_name(name: &str) -> Result<HeaderName, TransportError> {
    HeaderName::try_from(name)
        .map_err(|e| TransportError::InvalidRequest(format!("invalid header name {name:?}: {e}")))
}

fn header_value(name: &str, value: &str) -> Result<HeaderValue, TransportError> {
    HeaderValue::try_from(value)
        .map_err(|e| TransportError::InvalidRequest(format!("invalid value for header {name:?}: {e}")))
}
