//! Route tree and configuration errors.

use thiserror::Error;

use crate::route_name::RouteNameError;

/// Errors in route tree construction or configuration.
///
/// These errors occur synchronously, typically indicating programmer errors
/// or invalid configuration. They are never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// URL parsing failed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Route name validation failed.
    #[error("Invalid route name: {0}")]
    InvalidRouteName(#[from] RouteNameError),

    /// A router already has a child with this name.
    #[error("Duplicate route name: {name}")]
    DuplicateRoute {
        /// The duplicate route name.
        name: String,
    },

    /// The route already has a parent (or is a top-level router).
    #[error("Route {name} is already bound and cannot be attached again")]
    AlreadyBound {
        /// The name the route was about to be attached under.
        name: String,
    },

    /// The router is the route itself or one of its descendants.
    #[error("Route {name} cannot be attached below itself")]
    CyclicRoute {
        /// The name the route was about to be attached under.
        name: String,
    },

    /// A status set contains something that is not an HTTP status.
    #[error("Invalid status code {code} in {field}")]
    InvalidStatusCode {
        /// The configuration key holding the code.
        field: &'static str,
        /// The offending value.
        code: u16,
    },

    /// The request carries attachments but the route does not allow them.
    #[error("Attachments are not allowed for this route; set allow_attachments to enable them")]
    AttachmentsNotAllowed,

    /// The transport rejected the request before sending it (bad header
    /// name or value, bad attachment content type).
    #[error("Invalid request: {message}")]
    InvalidRequest {
        /// Why the request was rejected.
        message: String,
    },

    /// A configuration document could not be decoded.
    #[error("Invalid configuration document: {0}")]
    Parse(#[from] serde_json::Error),
}
