//! Validation responses.

use std::fmt;

use crate::error_tree::{ErrorNode, FieldKey};

/// The server answered with a validation status.
///
/// Carries the error tree parsed from the response text. The tree is
/// `None` when the payload held no error at all, in which case
/// [`has_error`](ValidationError::has_error) is `false`.
#[derive(Debug)]
pub struct ValidationError {
    status: u16,
    text: String,
    errors: Option<ErrorNode>,
}

impl ValidationError {
    pub fn new(status: u16, text: String, errors: Option<ErrorNode>) -> Self {
        Self {
            status,
            text,
            errors,
        }
    }

    /// The HTTP status code of the response.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// The raw response text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// The parsed error tree.
    pub fn errors(&self) -> Option<&ErrorNode> {
        self.errors.as_ref()
    }

    pub fn has_error(&self) -> bool {
        self.errors.as_ref().is_some_and(ErrorNode::has_error)
    }

    /// Looks up the error for `key`; see [`ErrorNode::get_error`].
    pub fn get_error(&self, key: impl Into<FieldKey>, allow_non_field: bool) -> Option<&ErrorNode> {
        self.errors.as_ref()?.get_error(key, allow_non_field)
    }

    /// Returns the first error; see [`ErrorNode::first_error`].
    pub fn first_error(&self, allow_non_field: bool) -> Option<&ErrorNode> {
        self.errors.as_ref()?.first_error(allow_non_field)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.errors {
            Some(errors) => write!(f, "Validation failed (HTTP {}): {errors}", self.status),
            None => write!(f, "Validation failed (HTTP {})", self.status),
        }
    }
}

impl std::error::Error for ValidationError {}
