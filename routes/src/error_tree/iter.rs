//! Sequential access over error nodes.

use super::node::ErrorNode;

/// One entry yielded while iterating an [`ErrorNode`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ErrorItem<'a> {
    /// A message of a leaf error.
    Message(&'a str),
    /// A child of a field or list error.
    Error(&'a ErrorNode),
    /// A list position without errors.
    Empty,
}

impl<'a> ErrorItem<'a> {
    /// Returns the child node, if this item is one.
    pub fn as_error(&self) -> Option<&'a ErrorNode> {
        match self {
            Self::Error(node) => Some(node),
            _ => None,
        }
    }

    /// Returns the message, if this item is one.
    pub fn as_message(&self) -> Option<&'a str> {
        match self {
            Self::Message(message) => Some(message),
            _ => None,
        }
    }
}

/// Iterator driven by [`ErrorNode::error_by_index`].
///
/// Iteration stops at the first index that yields `None`. Calling
/// [`ErrorNode::iter`] again starts over.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    node: &'a ErrorNode,
    index: usize,
}

impl<'a> Iter<'a> {
    pub(crate) fn new(node: &'a ErrorNode) -> Self {
        Self { node, index: 0 }
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = ErrorItem<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.node.error_by_index(self.index)?;
        self.index += 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.node.len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
