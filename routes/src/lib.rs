//! Hierarchical REST route trees.
//!
//! A tree of [`Router`]s and [`Endpoint`]s describes a remote API. Every
//! node can carry a [`PartialConfig`]; the configuration a request uses is
//! the process defaults overridden by each node's configuration from the
//! root down (see [`ConfigNode::config`]). Resolved configurations are
//! memoized per node and invalidated when a node or an ancestor changes.
//!
//! Responses with a validation status are parsed into an
//! [`ErrorNode`](error_tree::ErrorNode) tree that can be queried per field.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use routes::{ConfigNode, Endpoint, PartialConfig, RequestParams, Router};
//! use serde_json::json;
//!
//! # async fn run() -> Result<(), routes::error::ApiError> {
//! let root = Router::root(
//!     PartialConfig::new()
//!         .api_root("https://api.example.com")
//!         .headers([("Authorization", "Token abc")]),
//! )
//! .with_routes([("dogs", Endpoint::new("/dogs/${pk}/"))])?;
//!
//! let dogs = root.endpoint("dogs").expect("attached above");
//! match dogs.patch(RequestParams::new().kwargs(json!({"pk": 7})).data(json!({"name": ""}))).await {
//!     Ok(dog) => println!("updated {dog}"),
//!     Err(err) => match err.as_validation() {
//!         Some(validation) => println!("name: {:?}", validation.get_error("name", false)),
//!         None => return Err(err),
//!     },
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod endpoint;
pub mod error;
pub mod error_tree;
pub mod method;
pub mod route_name;
pub mod router;
pub mod signal;
pub mod template;
pub mod transport;

pub use config::{Config, ConfigNode, HeaderMap, HeaderSource, PartialConfig, StatusCodes};
pub use endpoint::{Endpoint, RequestParams};
pub use error::{ApiError, ClientError, ConfigError, ValidationError};
pub use error_tree::{ErrorNode, FieldError, FieldKey, LeafError, ListError};
pub use method::RestMethod;
pub use route_name::{RouteName, RouteNameError};
pub use router::{Route, Router};
pub use signal::{AbortController, AbortSignal};
pub use transport::{Attachment, HttpTransport, Transport, TransportError, TransportRequest, TransportResponse};
