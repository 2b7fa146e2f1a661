//! Route configuration: partial configurations supplied per node or per
//! request, the resolved configuration and the cascade that joins them.

mod node;
mod partial;
mod resolved;
mod source;

pub use node::{ConfigNode, NodeState};
pub use partial::{PartialConfig, StatusCodes};
pub use resolved::{Config, MutateErrorFn, MutateRawResponseFn, MutateResponseFn};
pub use source::{HeaderFn, HeaderMap, HeaderSource};
