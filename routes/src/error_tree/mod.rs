//! Structured server errors.
//!
//! Validation responses are parsed into a tree of [`ErrorNode`]s that can be
//! queried per field ([`ErrorNode::get_error`]), walked by path
//! ([`ErrorNode::get_error_path`]), iterated and rendered as text.
//!
//! The parsing pipeline is pluggable through [`ErrorStrategies`]; the
//! defaults are [`parse_errors`] and [`prepare_error`].

mod classifier;
mod iter;
mod node;

pub use classifier::{
    parse_errors, prepare_error, ErrorPayload, ErrorStrategies, ParseErrorsFn, PrepareErrorFn,
    EMPTY_MESSAGE_PLACEHOLDER, ERRORS_WRAPPER_KEY, NON_FIELD_ERRORS_KEY,
};
pub use iter::{ErrorItem, Iter};
pub use node::{ErrorNode, FieldError, FieldKey, LeafError, ListError, LEAF_GLUE, STRUCTURE_GLUE};
