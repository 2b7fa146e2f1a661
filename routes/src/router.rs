//! Routers: named, ordered collections of routes.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::trace;

use crate::config::{ConfigNode, NodeState, PartialConfig};
use crate::endpoint::Endpoint;
use crate::error::ConfigError;
use crate::route_name::RouteName;

/// Serializes binding across every tree, so two concurrent attaches cannot
/// each pass the cycle check and bind routers below one another.
static ATTACH_LOCK: Mutex<()> = Mutex::new(());

/// A child of a [`Router`].
#[derive(Debug, Clone)]
pub enum Route {
    Router(Arc<Router>),
    Endpoint(Arc<Endpoint>),
}

impl Route {
    /// The route as a configuration node.
    pub fn as_node(&self) -> &dyn ConfigNode {
        match self {
            Self::Router(router) => &**router,
            Self::Endpoint(endpoint) => &**endpoint,
        }
    }

    pub fn as_router(&self) -> Option<&Arc<Router>> {
        match self {
            Self::Router(router) => Some(router),
            Self::Endpoint(_) => None,
        }
    }

    pub fn as_endpoint(&self) -> Option<&Arc<Endpoint>> {
        match self {
            Self::Endpoint(endpoint) => Some(endpoint),
            Self::Router(_) => None,
        }
    }
}

impl From<Arc<Router>> for Route {
    fn from(router: Arc<Router>) -> Self {
        Self::Router(router)
    }
}

impl From<Arc<Endpoint>> for Route {
    fn from(endpoint: Arc<Endpoint>) -> Self {
        Self::Endpoint(endpoint)
    }
}

/// A node owning named child routes.
///
/// Children keep their insertion order. A route can be attached once;
/// afterwards it inherits this router's configuration.
///
/// ## Examples
///
/// ```rust
/// use routes::{Endpoint, PartialConfig, Router};
/// use serde_json::json;
///
/// let dogs = Router::new()
///     .with_routes([("details", Endpoint::new("/dogs/${pk}"))])
///     .unwrap();
/// let root = Router::root(PartialConfig::new().api_root("/api"))
///     .with_routes([("dogs", dogs)])
///     .unwrap();
///
/// let details = root.resolve("dogs.details").unwrap();
/// let details = details.as_endpoint().unwrap();
/// assert_eq!(details.render_path(&json!({"pk": "7"})).unwrap(), "/api/dogs/7");
/// ```
#[derive(Debug)]
pub struct Router {
    state: NodeState,
    routes: RwLock<Vec<(RouteName, Route)>>,
}

impl Router {
    /// An empty router without configuration of its own.
    pub fn new() -> Arc<Self> {
        Self::build(NodeState::new(None))
    }

    /// An empty router with a local configuration, to be attached later.
    pub fn with_config(config: PartialConfig) -> Arc<Self> {
        Self::build(NodeState::new(Some(config)))
    }

    /// The root of a route tree.
    ///
    /// A root counts as bound: it cannot be attached below another router.
    pub fn root(config: PartialConfig) -> Arc<Self> {
        Self::build(NodeState::top_level(config))
    }

    fn build(state: NodeState) -> Arc<Self> {
        Arc::new(Self {
            state,
            routes: RwLock::new(Vec::new()),
        })
    }

    /// Attaches every `(name, route)` pair in order, stopping at the first
    /// failure.
    ///
    /// ## Errors
    ///
    /// See [`attach`](Router::attach).
    pub fn with_routes<I, N, R>(self: Arc<Self>, routes: I) -> Result<Arc<Self>, ConfigError>
    where
        I: IntoIterator<Item = (N, R)>,
        N: AsRef<str>,
        R: Into<Route>,
    {
        for (name, route) in routes {
            self.attach(name.as_ref(), route)?;
        }
        Ok(self)
    }

    /// Attaches `route` under `name`.
    ///
    /// ## Errors
    ///
    /// - [`ConfigError::InvalidRouteName`] if `name` is empty, starts with
    ///   the reserved prefix or shadows a router operation
    /// - [`ConfigError::DuplicateRoute`] if `name` is taken
    /// - [`ConfigError::AlreadyBound`] if `route` has a parent or is a root
    /// - [`ConfigError::CyclicRoute`] if `route` is this router or one of its
    ///   ancestors
    pub fn attach(self: &Arc<Self>, name: &str, route: impl Into<Route>) -> Result<(), ConfigError> {
        let name = RouteName::new(name)?;
        let route = route.into();

        let _attaching = ATTACH_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        if routes.iter().any(|(existing, _)| existing == &name) {
            return Err(ConfigError::DuplicateRoute {
                name: name.to_string(),
            });
        }
        if route.as_node().is_bound() {
            return Err(ConfigError::AlreadyBound {
                name: name.to_string(),
            });
        }
        if let Route::Router(child) = &route {
            if self.is_or_descends_from(child) {
                return Err(ConfigError::CyclicRoute {
                    name: name.to_string(),
                });
            }
        }

        route.as_node().state().bind(self, name.as_str())?;
        // anything memoized before binding was resolved without this parent
        route.as_node().clear_config_cache();
        routes.push((name, route));
        Ok(())
    }

    fn is_or_descends_from(self: &Arc<Self>, other: &Arc<Router>) -> bool {
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if Arc::ptr_eq(&node, other) {
                return true;
            }
            current = node.parent();
        }
        false
    }

    /// The child attached under `name`.
    pub fn route(&self, name: &str) -> Option<Route> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(existing, _)| existing.as_str() == name)
            .map(|(_, route)| route.clone())
    }

    /// The child router attached under `name`.
    pub fn router(&self, name: &str) -> Option<Arc<Router>> {
        self.route(name)?.as_router().cloned()
    }

    /// The child endpoint attached under `name`.
    pub fn endpoint(&self, name: &str) -> Option<Arc<Endpoint>> {
        self.route(name)?.as_endpoint().cloned()
    }

    /// Walks a dotted path (`"dogs.details"`) from this router.
    pub fn resolve(&self, path: &str) -> Option<Route> {
        let mut segments = path.split('.');
        let mut current = self.route(segments.next()?)?;
        for segment in segments {
            current = current.as_router()?.route(segment)?;
        }
        Some(current)
    }

    /// Child names in insertion order.
    pub fn route_names(&self) -> Vec<String> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, _)| name.to_string())
            .collect()
    }

    /// Children in insertion order.
    pub fn routes(&self) -> Vec<(String, Route)> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(name, route)| (name.to_string(), route.clone()))
            .collect()
    }
}

impl ConfigNode for Router {
    fn state(&self) -> &NodeState {
        &self.state
    }

    fn clear_config_cache(&self) {
        trace!(route = self.bound_name(), "clearing configuration cache");
        self.state.clear();

        let routes = self.routes.read().unwrap_or_else(PoisonError::into_inner);
        for (_, route) in routes.iter() {
            route.as_node().clear_config_cache();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeaderMap, HeaderSource};
    use crate::route_name::RouteNameError;

    fn tree() -> (Arc<Router>, Arc<Router>, Arc<Endpoint>) {
        let details = Endpoint::new("/dogs/${pk}");
        let dogs = Router::new()
            .with_routes([("details", details.clone())])
            .unwrap();
        let root = Router::root(PartialConfig::new().api_root("/api"))
            .with_routes([("dogs", dogs.clone())])
            .unwrap();
        (root, dogs, details)
    }

    #[test]
    fn test_attach_binds_parent_and_name() {
        let (root, dogs, details) = tree();

        assert!(root.is_bound());
        assert!(root.parent().is_none());
        assert_eq!(root.bound_name(), "");

        assert!(dogs.is_bound());
        assert_eq!(dogs.bound_name(), "dogs");
        assert!(Arc::ptr_eq(&dogs.parent().unwrap(), &root));
        assert!(Arc::ptr_eq(&details.parent().unwrap(), &dogs));
    }

    #[test]
    fn test_unattached_nodes_are_unbound() {
        assert!(!Router::new().is_bound());
        assert!(!Router::with_config(PartialConfig::new().api_root("/x")).is_bound());
        assert!(!Endpoint::new("/x").is_bound());
    }

    #[test]
    fn test_lookup() {
        let (root, dogs, details) = tree();

        assert!(Arc::ptr_eq(&root.router("dogs").unwrap(), &dogs));
        assert!(root.endpoint("dogs").is_none());
        assert!(Arc::ptr_eq(&dogs.endpoint("details").unwrap(), &details));
        assert!(root.route("cats").is_none());

        let resolved = root.resolve("dogs.details").unwrap();
        assert!(Arc::ptr_eq(resolved.as_endpoint().unwrap(), &details));
        assert!(root.resolve("dogs.details.more").is_none());
        assert!(root.resolve("dogs.missing").is_none());
    }

    #[test]
    fn test_route_names_keep_insertion_order() {
        let root = Router::root(PartialConfig::new())
            .with_routes([
                ("zebras", Route::from(Endpoint::new("/z"))),
                ("apes", Route::from(Router::new())),
                ("moles", Route::from(Endpoint::new("/m"))),
            ])
            .unwrap();

        assert_eq!(root.route_names(), vec!["zebras", "apes", "moles"]);
        let routes = root.routes();
        assert!(routes[1].1.as_router().is_some());
    }

    #[test]
    fn test_attach_twice_fails() {
        let details = Endpoint::new("/dogs/${pk}");
        let first = Router::new();
        let second = Router::new();

        first.attach("details", details.clone()).unwrap();
        let err = second.attach("details", details).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyBound { name } if name == "details"));
        assert!(second.route_names().is_empty());
    }

    #[test]
    fn test_attach_twice_to_same_parent_fails() {
        let details = Endpoint::new("/dogs/${pk}");
        let dogs = Router::new();

        dogs.attach("a", details.clone()).unwrap();
        let err = dogs.attach("b", details).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyBound { name } if name == "b"));
        assert_eq!(dogs.route_names(), vec!["a"]);
    }

    #[test]
    fn test_concurrent_cross_attach_binds_once() {
        for _ in 0..64 {
            let a = Router::new();
            let b = Router::new();

            let (first, second) = std::thread::scope(|scope| {
                let first = scope.spawn(|| a.attach("b", b.clone()));
                let second = scope.spawn(|| b.attach("a", a.clone()));
                (first.join().unwrap(), second.join().unwrap())
            });

            assert!(first.is_ok() != second.is_ok());
            let failed = first.err().or(second.err()).unwrap();
            assert!(matches!(failed, ConfigError::CyclicRoute { .. }));
        }
    }

    #[test]
    fn test_root_cannot_be_attached() {
        let root = Router::root(PartialConfig::new());
        let err = Router::new().attach("nested", root).unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyBound { .. }));
    }

    #[test]
    fn test_duplicate_name_fails() {
        let router = Router::new();
        router.attach("dogs", Endpoint::new("/dogs")).unwrap();

        let err = router.attach("dogs", Endpoint::new("/other")).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateRoute { name } if name == "dogs"));
    }

    #[test]
    fn test_invalid_names_fail() {
        let router = Router::new();

        let err = router.attach("_private", Endpoint::new("/p")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidRouteName(RouteNameError::ReservedPrefix('_'))
        ));

        let err = router.attach("set_config", Endpoint::new("/p")).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidRouteName(RouteNameError::ReservedName(_))
        ));
    }

    #[test]
    fn test_cycles_are_rejected() {
        let outer = Router::new();
        let inner = Router::new();
        outer.attach("inner", inner.clone()).unwrap();

        let err = inner.attach("outer", outer.clone()).unwrap_err();
        assert!(matches!(err, ConfigError::CyclicRoute { .. }));

        let lonely = Router::new();
        let err = lonely.attach("me", lonely.clone()).unwrap_err();
        assert!(matches!(err, ConfigError::CyclicRoute { .. }));
    }

    #[test]
    fn test_config_is_memoized() {
        let (_root, _dogs, details) = tree();

        let first = details.config(None).unwrap();
        let second = details.config(None).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.api_root, "/api");
    }

    #[test]
    fn test_override_is_not_memoized() {
        let (_root, _dogs, details) = tree();

        let base = details.config(None).unwrap();
        let overridden = details
            .config(Some(&PartialConfig::new().status_success(200)))
            .unwrap();
        assert_eq!(overridden.status_success, vec![200]);
        assert_eq!(overridden.api_root, "/api");

        let again = details.config(None).unwrap();
        assert!(Arc::ptr_eq(&base, &again));
        assert_eq!(again.status_success, vec![200, 201, 204]);
    }

    #[test]
    fn test_set_config_cascades() {
        let (root, dogs, details) = tree();
        let before = details.config(None).unwrap();
        let dogs_before = dogs.config(None).unwrap();

        root.set_config(Some(PartialConfig::new().api_root("/v2")));

        let after = details.config(None).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.api_root, "/v2");
        assert!(!Arc::ptr_eq(&dogs_before, &dogs.config(None).unwrap()));
    }

    #[test]
    fn test_set_config_merges_local() {
        let root = Router::root(PartialConfig::new().api_root("/api").allow_attachments(true));
        root.set_config(Some(PartialConfig::new().default_accept_header("text/plain")));

        let local = root.local_config().unwrap();
        assert_eq!(local.api_root.as_deref(), Some("/api"));
        assert_eq!(local.allow_attachments, Some(true));
        assert_eq!(root.config(None).unwrap().default_accept_header, "text/plain");
    }

    #[test]
    fn test_set_config_none_only_invalidates() {
        let (root, _dogs, details) = tree();
        let before = details.config(None).unwrap();

        root.set_config(None);

        let after = details.config(None).unwrap();
        assert!(!Arc::ptr_eq(&before, &after));
        assert_eq!(after.api_root, before.api_root);
    }

    #[test]
    fn test_attach_discards_stale_memo() {
        let details = Endpoint::new("/dogs/${pk}");
        assert_eq!(details.config(None).unwrap().api_root, "");

        let root = Router::root(PartialConfig::new().api_root("/api"));
        root.attach("details", details.clone()).unwrap();
        assert_eq!(details.config(None).unwrap().api_root, "/api");
    }

    #[test]
    fn test_invalid_status_fails_resolution() {
        let root = Router::root(PartialConfig::new().status_validation_error(1000));
        let err = root.config(None).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidStatusCode { code: 1000, .. }));
    }

    #[test]
    fn test_headers_accumulate() {
        let leaf = Endpoint::with_config(
            "/leaf",
            PartialConfig::new().headers(HeaderSource::from_fn(|| {
                HeaderMap::from([("a".to_string(), "3".to_string())])
            })),
        );
        let mid = Router::with_config(PartialConfig::new().headers([("b", "2")]))
            .with_routes([("leaf", leaf.clone())])
            .unwrap();
        let _root = Router::root(PartialConfig::new().headers([("a", "1")]))
            .with_routes([("mid", mid)])
            .unwrap();

        let headers = leaf.get_headers(None).unwrap();
        assert_eq!(headers["a"], "3");
        assert_eq!(headers["b"], "2");
        assert_eq!(headers["Accept"], "application/json");
        assert_eq!(headers.len(), 3);
    }

    #[test]
    fn test_explicit_accept_wins() {
        let root = Router::root(PartialConfig::new().headers([("accept", "text/csv")]));
        let headers = root.get_headers(None).unwrap();
        assert_eq!(headers["accept"], "text/csv");
        assert!(!headers.contains_key("Accept"));
    }

    #[test]
    fn test_override_headers_and_accept() {
        let root = Router::root(PartialConfig::new().headers([("a", "1")]));
        let overrides = PartialConfig::new()
            .headers([("b", "2")])
            .default_accept_header("text/plain");

        let headers = root.get_headers(Some(&overrides)).unwrap();
        assert_eq!(headers["a"], "1");
        assert_eq!(headers["b"], "2");
        assert_eq!(headers["Accept"], "text/plain");
    }

    #[test]
    fn test_cookies_accumulate() {
        let leaf = Endpoint::with_config("/leaf", PartialConfig::new().cookies([("session", "leaf")]));
        let _root = Router::root(PartialConfig::new().cookies([("csrftoken", "abc"), ("session", "root")]))
            .with_routes([("leaf", leaf.clone())])
            .unwrap();

        let cookies = leaf.get_cookies(None).unwrap();
        assert_eq!(cookies["csrftoken"], "abc");
        assert_eq!(cookies["session"], "leaf");
        assert!(!cookies.contains_key("Accept"));
    }
}
