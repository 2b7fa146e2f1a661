//! Fully resolved configuration and the process-wide defaults.

use std::fmt;
use std::sync::{Arc, OnceLock};

use serde_json::Value;

use super::partial::{PartialConfig, StatusCodes};
use super::source::HeaderSource;
use crate::error::{ApiError, ConfigError};
use crate::error_tree::ErrorStrategies;
use crate::signal::AbortSignal;
use crate::transport::TransportResponse;

/// Transforms a successful response body before it is returned.
pub type MutateResponseFn = Arc<dyn Fn(Value, &TransportResponse) -> Value + Send + Sync>;

/// Transforms every request error (network, aborted, invalid status,
/// validation) before it is returned.
pub type MutateErrorFn =
    Arc<dyn Fn(ApiError, Option<&TransportResponse>) -> ApiError + Send + Sync>;

/// Transforms the normalized response before its status is classified.
pub type MutateRawResponseFn = Arc<dyn Fn(TransportResponse) -> TransportResponse + Send + Sync>;

const DEFAULT_STATUS_SUCCESS: [u16; 3] = [200, 201, 204];
const DEFAULT_STATUS_VALIDATION_ERROR: [u16; 1] = [400];
const DEFAULT_ACCEPT_HEADER: &str = "application/json";

static DEFAULTS: OnceLock<Arc<Config>> = OnceLock::new();

/// Configuration with every key defined.
///
/// Produced by [`ConfigNode::config`](crate::ConfigNode::config) from the
/// defaults and each node's [`PartialConfig`] on the path from the root.
#[derive(Clone)]
pub struct Config {
    pub api_root: String,
    pub headers: HeaderSource,
    pub cookies: HeaderSource,
    pub mutate_response: MutateResponseFn,
    pub mutate_error: MutateErrorFn,
    pub mutate_raw_response: MutateRawResponseFn,
    pub status_success: Vec<u16>,
    pub status_validation_error: Vec<u16>,
    pub default_accept_header: String,
    pub allow_attachments: bool,
    pub signal: Option<AbortSignal>,
    pub error_strategies: ErrorStrategies,
}

impl Config {
    /// The shared default configuration.
    ///
    /// Built once and never mutated; trees override it through their own
    /// partial configurations.
    pub fn defaults() -> Arc<Config> {
        DEFAULTS
            .get_or_init(|| {
                Arc::new(Config {
                    api_root: String::new(),
                    headers: HeaderSource::default(),
                    cookies: HeaderSource::default(),
                    mutate_response: Arc::new(|body: Value, _: &TransportResponse| body),
                    mutate_error: Arc::new(|error: ApiError, _: Option<&TransportResponse>| error),
                    mutate_raw_response: Arc::new(|response: TransportResponse| response),
                    status_success: DEFAULT_STATUS_SUCCESS.to_vec(),
                    status_validation_error: DEFAULT_STATUS_VALIDATION_ERROR.to_vec(),
                    default_accept_header: DEFAULT_ACCEPT_HEADER.to_string(),
                    allow_attachments: false,
                    signal: None,
                    error_strategies: ErrorStrategies::default(),
                })
            })
            .clone()
    }

    /// Overwrites every key set in `partial`.
    ///
    /// ## Errors
    ///
    /// Returns [`ConfigError::InvalidStatusCode`] if a status set contains a
    /// value outside `100..=599`.
    pub fn apply(&mut self, partial: &PartialConfig) -> Result<(), ConfigError> {
        if let Some(api_root) = &partial.api_root {
            self.api_root = api_root.clone();
        }
        if let Some(headers) = &partial.headers {
            self.headers = headers.clone();
        }
        if let Some(cookies) = &partial.cookies {
            self.cookies = cookies.clone();
        }
        if let Some(hook) = &partial.mutate_response {
            self.mutate_response = hook.clone();
        }
        if let Some(hook) = &partial.mutate_error {
            self.mutate_error = hook.clone();
        }
        if let Some(hook) = &partial.mutate_raw_response {
            self.mutate_raw_response = hook.clone();
        }
        if let Some(codes) = &partial.status_success {
            self.status_success = normalize_status("status_success", codes)?;
        }
        if let Some(codes) = &partial.status_validation_error {
            self.status_validation_error = normalize_status("status_validation_error", codes)?;
        }
        if let Some(accept) = &partial.default_accept_header {
            self.default_accept_header = accept.clone();
        }
        if let Some(allow) = partial.allow_attachments {
            self.allow_attachments = allow;
        }
        if let Some(signal) = &partial.signal {
            self.signal = Some(signal.clone());
        }
        if let Some(strategy) = &partial.parse_errors {
            self.error_strategies.parse_errors = strategy.clone();
        }
        if let Some(strategy) = &partial.prepare_error {
            self.error_strategies.prepare_error = strategy.clone();
        }
        Ok(())
    }

    /// Returns `true` if `status` is in the success set.
    pub fn is_success(&self, status: u16) -> bool {
        self.status_success.contains(&status)
    }

    /// Returns `true` if `status` is in the validation-error set.
    pub fn is_validation_error(&self, status: u16) -> bool {
        self.status_validation_error.contains(&status)
    }
}

fn normalize_status(field: &'static str, codes: &StatusCodes) -> Result<Vec<u16>, ConfigError> {
    let codes = codes.to_vec();
    if let Some(&code) = codes.iter().find(|code| !(100..=599).contains(*code)) {
        return Err(ConfigError::InvalidStatusCode { field, code });
    }
    Ok(codes)
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_root", &self.api_root)
            .field("headers", &self.headers)
            .field("cookies", &self.cookies)
            .field("status_success", &self.status_success)
            .field("status_validation_error", &self.status_validation_error)
            .field("default_accept_header", &self.default_accept_header)
            .field("allow_attachments", &self.allow_attachments)
            .field("signal", &self.signal)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::defaults();
        assert_eq!(config.api_root, "");
        assert_eq!(config.status_success, vec![200, 201, 204]);
        assert_eq!(config.status_validation_error, vec![400]);
        assert_eq!(config.default_accept_header, "application/json");
        assert!(!config.allow_attachments);
        assert!(config.signal.is_none());
        assert!(Arc::ptr_eq(&config, &Config::defaults()));
    }

    #[test]
    fn test_apply_normalizes_scalar_status() {
        let mut config = (*Config::defaults()).clone();
        config
            .apply(&PartialConfig::new().status_success(200).status_validation_error(422))
            .unwrap();
        assert_eq!(config.status_success, vec![200]);
        assert_eq!(config.status_validation_error, vec![422]);
    }

    #[test]
    fn test_apply_rejects_invalid_status() {
        let mut config = (*Config::defaults()).clone();
        let err = config
            .apply(&PartialConfig::new().status_success([200, 42]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidStatusCode {
                field: "status_success",
                code: 42
            }
        ));
    }

    #[test]
    fn test_apply_leaves_unset_keys() {
        let mut config = (*Config::defaults()).clone();
        config.apply(&PartialConfig::new().api_root("/api")).unwrap();
        assert_eq!(config.api_root, "/api");
        assert_eq!(config.default_accept_header, "application/json");
    }

    #[test]
    fn test_status_membership() {
        let config = Config::defaults();
        assert!(config.is_success(204));
        assert!(!config.is_success(400));
        assert!(config.is_validation_error(400));
    }
}
