//! HTTP methods an endpoint can issue.

use strum::{Display, EnumIter, EnumString};

/// HTTP methods exposed by [`Endpoint`](crate::Endpoint).
///
/// ## Examples
///
/// ```rust
/// use routes::RestMethod;
///
/// let method = RestMethod::Get;
/// assert!(!method.has_body());
///
/// // Parse from string
/// let parsed: RestMethod = "PATCH".parse().unwrap();
/// assert_eq!(parsed, RestMethod::Patch);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter, EnumString)]
#[strum(serialize_all = "UPPERCASE")]
pub enum RestMethod {
    /// Retrieve a resource (`Endpoint::fetch`).
    Get,
    /// Retrieve headers only.
    Head,
    /// Query supported methods.
    Options,
    /// Create a resource or trigger an action.
    Post,
    /// Partially update a resource.
    Patch,
    /// Replace a resource entirely.
    Put,
    /// Remove a resource (`Endpoint::del`).
    Delete,
}

impl RestMethod {
    /// Returns `true` if requests with this method carry a body.
    pub fn has_body(&self) -> bool {
        matches!(self, Self::Post | Self::Patch | Self::Put | Self::Delete)
    }

    /// Converts to the equivalent `reqwest::Method`.
    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Self::Get => reqwest::Method::GET,
            Self::Head => reqwest::Method::HEAD,
            Self::Options => reqwest::Method::OPTIONS,
            Self::Post => reqwest::Method::POST,
            Self::Patch => reqwest::Method::PATCH,
            Self::Put => reqwest::Method::PUT,
            Self::Delete => reqwest::Method::DELETE,
        }
    }
}

impl From<RestMethod> for reqwest::Method {
    fn from(method: RestMethod) -> Self {
        method.to_reqwest()
    }
}
