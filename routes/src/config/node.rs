//! Configuration resolution shared by routers and endpoints.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, PoisonError, RwLock, Weak};

use tracing::{debug, trace};

use super::partial::PartialConfig;
use super::resolved::Config;
use super::source::{HeaderMap, HeaderSource};
use crate::error::ConfigError;
use crate::router::Router;

/// Per-node configuration state: the local partial configuration, the
/// memoized resolved configuration and the link to the parent router.
///
/// The parent link is weak; routers own their children, never the reverse.
#[derive(Debug, Default)]
pub struct NodeState {
    local: RwLock<Option<PartialConfig>>,
    resolved: RwLock<Option<Arc<Config>>>,
    generation: AtomicU64,
    parent: OnceLock<Weak<Router>>,
    bound_name: OnceLock<String>,
    top_level: bool,
}

impl NodeState {
    pub(crate) fn new(local: Option<PartialConfig>) -> Self {
        Self {
            local: RwLock::new(local),
            ..Self::default()
        }
    }

    /// State for a tree root: bound from the start, so it can never be
    /// attached below another router.
    pub(crate) fn top_level(config: PartialConfig) -> Self {
        Self {
            local: RwLock::new(Some(config)),
            top_level: true,
            ..Self::default()
        }
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.top_level || self.parent.get().is_some()
    }

    /// Links this node to `parent` under `name`.
    pub(crate) fn bind(&self, parent: &Arc<Router>, name: &str) -> Result<(), ConfigError> {
        let already_bound = || ConfigError::AlreadyBound {
            name: name.to_string(),
        };

        if self.top_level {
            return Err(already_bound());
        }
        self.parent
            .set(Arc::downgrade(parent))
            .map_err(|_| already_bound())?;
        // the name is only ever set together with the parent
        let _ = self.bound_name.set(name.to_string());
        Ok(())
    }

    fn parent(&self) -> Option<Arc<Router>> {
        self.parent.get().and_then(Weak::upgrade)
    }

    fn bound_name(&self) -> &str {
        self.bound_name.get().map_or("", String::as_str)
    }

    fn local(&self) -> Option<PartialConfig> {
        self.local
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn merge_local(&self, partial: PartialConfig) {
        let mut local = self.local.write().unwrap_or_else(PoisonError::into_inner);
        match local.as_mut() {
            Some(existing) => existing.merge(partial),
            None => *local = Some(partial),
        }
    }

    fn cached(&self) -> Option<Arc<Config>> {
        self.resolved
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Stores `config` unless the cache was cleared since `generation` was read.
    fn store(&self, config: &Arc<Config>, generation: u64) {
        let mut resolved = self.resolved.write().unwrap_or_else(PoisonError::into_inner);
        if self.generation() == generation {
            *resolved = Some(config.clone());
        }
    }

    pub(crate) fn clear(&self) {
        let mut resolved = self.resolved.write().unwrap_or_else(PoisonError::into_inner);
        self.generation.fetch_add(1, Ordering::AcqRel);
        *resolved = None;
    }
}

/// A node of a route tree taking part in configuration resolution.
///
/// Implemented by [`Router`] and [`Endpoint`](crate::Endpoint).
pub trait ConfigNode {
    /// The node's configuration state.
    fn state(&self) -> &NodeState;

    /// Drops the memoized configuration.
    ///
    /// Routers also clear every descendant.
    fn clear_config_cache(&self) {
        trace!(route = self.bound_name(), "clearing configuration cache");
        self.state().clear();
    }

    /// Returns the resolved configuration.
    ///
    /// The base configuration (defaults, then every ancestor's local
    /// configuration, then this node's) is computed once and memoized, so
    /// repeated calls return the same `Arc`. `overrides` is applied on top
    /// of the memoized base and the result is not cached.
    ///
    /// ## Errors
    ///
    /// Returns a [`ConfigError`] if any partial configuration on the path
    /// holds an invalid value.
    fn config(&self, overrides: Option<&PartialConfig>) -> Result<Arc<Config>, ConfigError> {
        let state = self.state();
        let base = match state.cached() {
            Some(cached) => cached,
            None => {
                let generation = state.generation();
                let mut resolved = match state.parent() {
                    Some(parent) => (*parent.config(None)?).clone(),
                    None => (*Config::defaults()).clone(),
                };
                if let Some(local) = state.local() {
                    resolved.apply(&local)?;
                }

                let resolved = Arc::new(resolved);
                state.store(&resolved, generation);
                debug!(route = self.bound_name(), "resolved route configuration");
                resolved
            }
        };

        match overrides {
            None => Ok(base),
            Some(overrides) => {
                let mut config = (*base).clone();
                config.apply(overrides)?;
                Ok(Arc::new(config))
            }
        }
    }

    /// Merges `partial` into the local configuration (keys in `partial`
    /// win) and clears the cache of this node and its descendants.
    fn set_config(&self, partial: Option<PartialConfig>) {
        if let Some(partial) = partial {
            self.state().merge_local(partial);
        }
        self.clear_config_cache();
    }

    /// A copy of the local configuration.
    fn local_config(&self) -> Option<PartialConfig> {
        self.state().local()
    }

    /// Returns `true` if the node has a parent or is a tree root.
    fn is_bound(&self) -> bool {
        self.state().is_bound()
    }

    fn parent(&self) -> Option<Arc<Router>> {
        self.state().parent()
    }

    /// The name this node is attached under; empty until attached.
    fn bound_name(&self) -> &str {
        self.state().bound_name()
    }

    /// Headers a request from this node carries.
    ///
    /// Maps accumulate from the root down, each level's values winning
    /// over its ancestors'; headers in `overrides` win over everything.
    /// `Accept` falls back to the resolved `default_accept_header`.
    fn get_headers(&self, overrides: Option<&PartialConfig>) -> Result<HeaderMap, ConfigError> {
        let mut headers = accumulate(self, headers_of)?;
        if let Some(extra) = overrides.and_then(|o| o.headers.as_ref()) {
            headers.extend(extra.resolve());
        }

        if !headers.keys().any(|name| name.eq_ignore_ascii_case("accept")) {
            let config = self.config(overrides)?;
            headers.insert("Accept".to_string(), config.default_accept_header.clone());
        }
        Ok(headers)
    }

    /// Cookies a request from this node carries; accumulated like
    /// [`get_headers`](ConfigNode::get_headers).
    fn get_cookies(&self, overrides: Option<&PartialConfig>) -> Result<HeaderMap, ConfigError> {
        let mut cookies = accumulate(self, cookies_of)?;
        if let Some(extra) = overrides.and_then(|o| o.cookies.as_ref()) {
            cookies.extend(extra.resolve());
        }
        Ok(cookies)
    }
}

fn headers_of(config: &Config) -> &HeaderSource {
    &config.headers
}

fn cookies_of(config: &Config) -> &HeaderSource {
    &config.cookies
}

/// Merges the parent's accumulated map with this node's own source.
fn accumulate<N>(node: &N, pick: fn(&Config) -> &HeaderSource) -> Result<HeaderMap, ConfigError>
where
    N: ConfigNode + ?Sized,
{
    let mut map = match node.parent() {
        Some(parent) => accumulate(&*parent, pick)?,
        None => HeaderMap::new(),
    };
    let config = node.config(None)?;
    map.extend(pick(&config).resolve());
    Ok(map)
}
