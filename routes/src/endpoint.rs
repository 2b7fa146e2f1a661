//! Endpoints: the leaves of a route tree, where requests are issued.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, Span};
use url::Url;

use crate::config::{Config, ConfigNode, NodeState, PartialConfig};
use crate::error::{ApiError, ClientError, ConfigError, ValidationError};
use crate::error_tree::ErrorPayload;
use crate::method::RestMethod;
use crate::template::render_template;
use crate::transport::{
    Attachment, HttpTransport, Transport, TransportError, TransportRequest, TransportResponse,
};

/// Per-call request inputs.
///
/// ## Examples
///
/// ```rust
/// use routes::{PartialConfig, RequestParams};
/// use serde_json::json;
///
/// let params = RequestParams::new()
///     .kwargs(json!({"pk": 7}))
///     .query("expand", "owner")
///     .data(json!({"name": "Rex"}))
///     .config(PartialConfig::new().status_success(200));
/// assert_eq!(params.query.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestParams {
    /// Values for the path template placeholders.
    pub kwargs: Value,
    pub query: Vec<(String, String)>,
    /// The request body. Ignored for methods without a body.
    pub data: Option<Value>,
    pub attachments: Vec<Attachment>,
    /// Configuration applied on top of the endpoint's for this call only.
    pub config: Option<PartialConfig>,
}

impl RequestParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kwargs(mut self, kwargs: Value) -> Self {
        self.kwargs = kwargs;
        self
    }

    /// Appends a query pair; repeated names are kept.
    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn attach(mut self, attachment: Attachment) -> Self {
        self.attachments.push(attachment);
        self
    }

    pub fn config(mut self, config: PartialConfig) -> Self {
        self.config = Some(config);
        self
    }
}

/// A remote resource at a path template.
///
/// The path is rendered against the resolved `api_root`, so an endpoint
/// only issues requests once it sits below a router supplying one (or
/// carries its own).
pub struct Endpoint {
    state: NodeState,
    path: String,
    transport: Arc<dyn Transport>,
}

impl Endpoint {
    /// An endpoint using the shared [`HttpTransport`].
    pub fn new(path: impl Into<String>) -> Arc<Self> {
        Self::build(path.into(), None, HttpTransport::shared())
    }

    /// An endpoint with a local configuration.
    pub fn with_config(path: impl Into<String>, config: PartialConfig) -> Arc<Self> {
        Self::build(path.into(), Some(config), HttpTransport::shared())
    }

    /// An endpoint sending its requests through `transport`.
    pub fn with_transport(
        path: impl Into<String>,
        config: Option<PartialConfig>,
        transport: Arc<dyn Transport>,
    ) -> Arc<Self> {
        Self::build(path.into(), config, transport)
    }

    fn build(path: String, config: Option<PartialConfig>, transport: Arc<dyn Transport>) -> Arc<Self> {
        Arc::new(Self {
            state: NodeState::new(config),
            path,
            transport,
        })
    }

    /// The path template.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The resolved `api_root` followed by the rendered path template.
    ///
    /// ## Errors
    ///
    /// Returns a [`ConfigError`] if the configuration cannot be resolved.
    pub fn render_path(&self, kwargs: &Value) -> Result<String, ConfigError> {
        let config = self.config(None)?;
        Ok(self.render_with(&config, kwargs))
    }

    fn render_with(&self, config: &Config, kwargs: &Value) -> String {
        format!("{}{}", config.api_root, render_template(&self.path, kwargs))
    }

    /// Issues a `GET`.
    pub async fn fetch(&self, params: RequestParams) -> Result<Value, ApiError> {
        self.request(RestMethod::Get, params).await
    }

    pub async fn head(&self, params: RequestParams) -> Result<Value, ApiError> {
        self.request(RestMethod::Head, params).await
    }

    pub async fn options(&self, params: RequestParams) -> Result<Value, ApiError> {
        self.request(RestMethod::Options, params).await
    }

    pub async fn post(&self, params: RequestParams) -> Result<Value, ApiError> {
        self.request(RestMethod::Post, params).await
    }

    pub async fn patch(&self, params: RequestParams) -> Result<Value, ApiError> {
        self.request(RestMethod::Patch, params).await
    }

    pub async fn put(&self, params: RequestParams) -> Result<Value, ApiError> {
        self.request(RestMethod::Put, params).await
    }

    /// Issues a `DELETE`.
    pub async fn del(&self, params: RequestParams) -> Result<Value, ApiError> {
        self.request(RestMethod::Delete, params).await
    }

    /// Issues a request and classifies its outcome.
    ///
    /// A status in `status_success` yields the response body passed through
    /// `mutate_response`. Every other outcome is an error passed through
    /// `mutate_error`:
    ///
    /// - a status in `status_validation_error` becomes a
    ///   [`ValidationError`] carrying the parsed error tree
    /// - any other status becomes [`ClientError::InvalidStatus`]
    /// - no response becomes [`ClientError::Network`] or
    ///   [`ClientError::Aborted`]
    ///
    /// ## Errors
    ///
    /// Configuration errors (including attachments on a route that does not
    /// allow them) are returned before anything is sent and skip
    /// `mutate_error`.
    #[instrument(
        name = "api_request",
        skip(self, params),
        fields(
            http.method = tracing::field::Empty,
            http.url = tracing::field::Empty,
            http.status_code = tracing::field::Empty,
            otel.kind = "client",
            otel.status_code = tracing::field::Empty,
        )
    )]
    pub async fn request(&self, method: RestMethod, params: RequestParams) -> Result<Value, ApiError> {
        Span::current().record("http.method", method.to_string().as_str());

        let overrides = params.config.as_ref();
        let config = self.config(overrides)?;
        if !params.attachments.is_empty() && !config.allow_attachments {
            return Err(ConfigError::AttachmentsNotAllowed.into());
        }

        let url = Url::parse(&self.render_with(&config, &params.kwargs)).map_err(ConfigError::from)?;
        Span::current().record("http.url", url.as_str());

        let request = TransportRequest {
            method,
            url,
            query: params.query,
            headers: self.get_headers(overrides)?,
            cookies: self.get_cookies(overrides)?,
            body: params.data.filter(|_| method.has_body()),
            attachments: params.attachments,
            config: config.clone(),
        };

        let outcome = self.transport.execute(request).await;
        settle(&config, outcome)
    }
}

fn settle(
    config: &Config,
    outcome: Result<TransportResponse, TransportError>,
) -> Result<Value, ApiError> {
    let span = Span::current();

    let response = match outcome {
        Ok(response) => (config.mutate_raw_response)(response),
        Err(TransportError::InvalidRequest(message)) => {
            return Err(ConfigError::InvalidRequest { message }.into());
        }
        Err(TransportError::Aborted) => {
            debug!("request aborted");
            return Err((config.mutate_error)(ClientError::Aborted.into(), None));
        }
        Err(TransportError::Network(message)) => {
            span.record("otel.status_code", "ERROR");
            debug!(%message, "no response received");
            return Err((config.mutate_error)(ClientError::Network { message }.into(), None));
        }
    };

    let status = response.status;
    span.record("http.status_code", status);
    debug!(status, "response received");

    if response.was_aborted {
        return Err((config.mutate_error)(ClientError::Aborted.into(), Some(&response)));
    }

    if config.is_success(status) {
        span.record("otel.status_code", "OK");
        return Ok((config.mutate_response)(response.body.clone(), &response));
    }

    span.record("otel.status_code", if status >= 500 { "ERROR" } else { "UNSET" });
    let error: ApiError = if config.is_validation_error(status) {
        let errors = config
            .error_strategies
            .parse(&ErrorPayload::from(response.text.as_str()));
        ValidationError::new(status, response.text.clone(), errors).into()
    } else {
        ClientError::InvalidStatus {
            status,
            text: response.text.clone(),
        }
        .into()
    };
    Err((config.mutate_error)(error, Some(&response)))
}

impl ConfigNode for Endpoint {
    fn state(&self) -> &NodeState {
        &self.state
    }
}

impl fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Endpoint")
            .field("path", &self.path)
            .field("bound_name", &self.bound_name())
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}
