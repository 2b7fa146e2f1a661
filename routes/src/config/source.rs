//! Header and cookie sources.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Deserializer};

/// A flat name → value map used for both headers and cookies.
pub type HeaderMap = BTreeMap<String, String>;

/// Produces a header (or cookie) map each time a request is built.
pub type HeaderFn = Arc<dyn Fn() -> HeaderMap + Send + Sync>;

/// Where a node's headers or cookies come from.
///
/// Sources accumulate down the route tree: a request carries its
/// ancestors' values with its own merged on top.
#[derive(Clone)]
pub enum HeaderSource {
    /// A fixed map.
    Static(HeaderMap),
    /// A function evaluated for every request (e.g. to read a fresh token).
    Dynamic(HeaderFn),
}

impl HeaderSource {
    /// Wraps a function source.
    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn() -> HeaderMap + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Evaluates the source.
    pub fn resolve(&self) -> HeaderMap {
        match self {
            Self::Static(map) => map.clone(),
            Self::Dynamic(f) => f(),
        }
    }
}

impl Default for HeaderSource {
    fn default() -> Self {
        Self::Static(HeaderMap::new())
    }
}

impl fmt::Debug for HeaderSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(map) => f.debug_tuple("Static").field(map).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

impl From<HeaderMap> for HeaderSource {
    fn from(map: HeaderMap) -> Self {
        Self::Static(map)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for HeaderSource
where
    K: Into<String>,
    V: Into<String>,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::Static(
            pairs
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        )
    }
}

/// Configuration documents can only describe static maps.
impl<'de> Deserialize<'de> for HeaderSource {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        HeaderMap::deserialize(deserializer).map(Self::Static)
    }
}
