//! Error tree node types.
//!
//! A parsed server error is one of three shapes:
//!
//! - [`LeafError`] - a flat list of messages for a single field
//! - [`FieldError`] - errors keyed by field name, plus an optional non-field error
//! - [`ListError`] - errors by position (one per submitted list item), where
//!   `None` marks an item without errors
//!
//! Nodes learn their own field name when they are attached to a parent
//! ([`FieldKey::Name`] under a [`FieldError`], [`FieldKey::Index`] under a
//! [`ListError`]).

use std::fmt;

use tracing::warn;

use super::iter::{ErrorItem, Iter};

/// Default glue used when rendering a [`LeafError`].
pub const LEAF_GLUE: &str = " ";

/// Default glue used when rendering a [`FieldError`] or [`ListError`].
pub const STRUCTURE_GLUE: &str = "; ";

/// The name a node is bound to inside its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldKey {
    /// Key inside a [`FieldError`].
    Name(String),
    /// Position inside a [`ListError`].
    Index(usize),
}

impl fmt::Display for FieldKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for FieldKey {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for FieldKey {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl From<usize> for FieldKey {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// Messages reported for a single field.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LeafError {
    messages: Vec<String>,
    field_name: Option<FieldKey>,
}

impl LeafError {
    /// Creates a leaf from a sequence of messages.
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
            field_name: None,
        }
    }

    /// Returns the raw messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// A leaf is an error only when it carries at least one message.
    pub fn has_error(&self) -> bool {
        !self.messages.is_empty()
    }

    fn render(&self, glue: &str) -> String {
        self.messages.join(glue)
    }
}

/// Errors keyed by field name.
///
/// Keys keep the order in which they were inserted; that order drives
/// iteration, rendering and [`ErrorNode::first_error`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldError {
    fields: Vec<(String, ErrorNode)>,
    non_field: Option<Box<ErrorNode>>,
    field_name: Option<FieldKey>,
}

impl FieldError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field error, binding `node` to `key`.
    pub fn with_field(mut self, key: impl Into<String>, node: ErrorNode) -> Self {
        self.insert(key, node);
        self
    }

    /// Sets the non-field error.
    pub fn with_non_field(mut self, node: ErrorNode) -> Self {
        self.set_non_field(node);
        self
    }

    /// Inserts a field error, replacing an existing entry with the same key
    /// in place.
    pub fn insert(&mut self, key: impl Into<String>, mut node: ErrorNode) {
        let key = key.into();
        node.bind_field_name(FieldKey::Name(key.clone()));

        match self.fields.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = node,
            None => self.fields.push((key, node)),
        }
    }

    pub fn set_non_field(&mut self, node: ErrorNode) {
        self.non_field = Some(Box::new(node));
    }

    /// Returns the error stored for `key`.
    pub fn get(&self, key: &str) -> Option<&ErrorNode> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, node)| node)
    }

    /// Iterates over `(key, error)` pairs in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &ErrorNode)> {
        self.fields.iter().map(|(key, node)| (key.as_str(), node))
    }

    pub fn non_field(&self) -> Option<&ErrorNode> {
        self.non_field.as_deref()
    }

    /// Number of keyed fields (the non-field error is not counted).
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn has_error(&self) -> bool {
        self.non_field.as_ref().is_some_and(|node| node.has_error())
            || self.fields.iter().any(|(_, node)| node.has_error())
    }

    fn render(&self, glue: &str) -> String {
        let mut parts = Vec::with_capacity(self.fields.len() + 1);
        if let Some(non_field) = &self.non_field {
            parts.push(non_field.as_string(None));
        }
        parts.extend(
            self.fields
                .iter()
                .map(|(key, node)| format!("{key}: {}", node.as_string(None))),
        );
        parts.join(glue)
    }
}

/// Errors by list position.
///
/// Slots are never dropped: an item without errors is stored as `None` so the
/// indices keep lining up with the submitted list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListError {
    items: Vec<Option<ErrorNode>>,
    non_field: Option<Box<ErrorNode>>,
    field_name: Option<FieldKey>,
}

impl ListError {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a list from slots, binding each present node to its index.
    pub fn from_items<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Option<ErrorNode>>,
    {
        let mut list = Self::new();
        for item in items {
            list.push(item);
        }
        list
    }

    /// Sets the non-field error.
    pub fn with_non_field(mut self, node: ErrorNode) -> Self {
        self.non_field = Some(Box::new(node));
        self
    }

    /// Appends a slot.
    pub fn push(&mut self, item: Option<ErrorNode>) {
        let index = self.items.len();
        self.items.push(item.map(|mut node| {
            node.bind_field_name(FieldKey::Index(index));
            node
        }));
    }

    /// Returns the error at `index`; empty slots and out-of-range indices
    /// both return `None`.
    pub fn get(&self, index: usize) -> Option<&ErrorNode> {
        self.items.get(index).and_then(Option::as_ref)
    }

    pub fn items(&self) -> &[Option<ErrorNode>] {
        &self.items
    }

    pub fn non_field(&self) -> Option<&ErrorNode> {
        self.non_field.as_deref()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn has_error(&self) -> bool {
        self.non_field.as_ref().is_some_and(|node| node.has_error())
            || self.items.iter().flatten().any(ErrorNode::has_error)
    }

    fn render(&self, glue: &str) -> String {
        self.items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Some(node) => format!("{index}: {}", node.as_string(None)),
                None => format!("{index}: null"),
            })
            .collect::<Vec<_>>()
            .join(glue)
    }
}

/// A parsed server error.
///
/// ## Examples
///
/// ```rust
/// use routes::error_tree::{ErrorNode, FieldError, LeafError};
///
/// let errors = ErrorNode::Field(
///     FieldError::new()
///         .with_non_field(LeafError::new(["Invalid data"]).into())
///         .with_field("email", LeafError::new(["Enter a valid email"]).into()),
/// );
///
/// assert!(errors.has_error());
/// assert_eq!(errors.to_string(), "Invalid data; email: Enter a valid email");
/// assert_eq!(
///     errors.get_error("email", false).map(ToString::to_string),
///     Some("Enter a valid email".to_string())
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorNode {
    Leaf(LeafError),
    Field(FieldError),
    List(ListError),
}

impl ErrorNode {
    /// The name this node was bound to, if it has a parent.
    pub fn field_name(&self) -> Option<&FieldKey> {
        match self {
            Self::Leaf(leaf) => leaf.field_name.as_ref(),
            Self::Field(field) => field.field_name.as_ref(),
            Self::List(list) => list.field_name.as_ref(),
        }
    }

    /// Binds this node to `key`.
    ///
    /// The first bind wins. Binding again under a different name means the
    /// same error was attached to two parents; that is reported through
    /// `tracing` and otherwise ignored.
    pub fn bind_field_name(&mut self, key: FieldKey) {
        let slot = match self {
            Self::Leaf(leaf) => &mut leaf.field_name,
            Self::Field(field) => &mut field.field_name,
            Self::List(list) => &mut list.field_name,
        };

        match slot {
            None => *slot = Some(key),
            Some(existing) if *existing == key => {}
            Some(existing) => {
                warn!(
                    bound = %existing,
                    requested = %key,
                    "error node is already bound to a different field name"
                );
            }
        }
    }

    /// Returns `true` if this node (or any of its children) carries a message.
    pub fn has_error(&self) -> bool {
        match self {
            Self::Leaf(leaf) => leaf.has_error(),
            Self::Field(field) => field.has_error(),
            Self::List(list) => list.has_error(),
        }
    }

    /// The non-field error attached to a structural node.
    pub fn non_field(&self) -> Option<&ErrorNode> {
        match self {
            Self::Leaf(_) => None,
            Self::Field(field) => field.non_field(),
            Self::List(list) => list.non_field(),
        }
    }

    /// Looks up the error for a single key.
    ///
    /// When the key has no error and `allow_non_field` is set, the non-field
    /// error is returned instead. Numeric keys address list positions;
    /// a [`FieldError`] is looked up by the key's string form.
    pub fn get_error(&self, key: impl Into<FieldKey>, allow_non_field: bool) -> Option<&ErrorNode> {
        let key = key.into();
        let found = match (self, &key) {
            (Self::Leaf(_), _) => None,
            (Self::Field(field), FieldKey::Name(name)) => field.get(name),
            (Self::Field(field), FieldKey::Index(index)) => field.get(&index.to_string()),
            (Self::List(list), FieldKey::Index(index)) => list.get(*index),
            (Self::List(list), FieldKey::Name(name)) => {
                name.parse::<usize>().ok().and_then(|index| list.get(index))
            }
        };

        match found {
            Some(node) => Some(node),
            None if allow_non_field => self.non_field(),
            None => None,
        }
    }

    /// Walks `path` one segment at a time.
    ///
    /// Intermediate segments never fall back to non-field errors;
    /// `allow_non_field` only applies to the final segment. A missing
    /// intermediate segment ends the walk with `None`.
    pub fn get_error_path(&self, path: &[FieldKey], allow_non_field: bool) -> Option<&ErrorNode> {
        let Some((last, parents)) = path.split_last() else {
            return Some(self);
        };

        let mut current = self;
        for segment in parents {
            current = current.get_error(segment.clone(), false)?;
        }
        current.get_error(last.clone(), allow_non_field)
    }

    /// Returns the first error.
    ///
    /// With `allow_non_field`, a present non-field error wins. Otherwise
    /// the entry at position 0 is returned; an empty first list slot yields
    /// `None` rather than skipping ahead. A leaf carrying messages is its
    /// own first error.
    pub fn first_error(&self, allow_non_field: bool) -> Option<&ErrorNode> {
        if allow_non_field {
            if let Some(non_field) = self.non_field() {
                return Some(non_field);
            }
        }

        match self {
            Self::Leaf(leaf) => leaf.has_error().then_some(self),
            Self::Field(field) => field.fields.first().map(|(_, node)| node),
            Self::List(list) => list.items.first().and_then(Option::as_ref),
        }
    }

    /// Renders the error, joining parts with `glue`.
    ///
    /// The default glue is `" "` for leaves and `"; "` for structural nodes.
    /// Children are always rendered with their own default glue.
    pub fn as_string(&self, glue: Option<&str>) -> String {
        match self {
            Self::Leaf(leaf) => leaf.render(glue.unwrap_or(LEAF_GLUE)),
            Self::Field(field) => field.render(glue.unwrap_or(STRUCTURE_GLUE)),
            Self::List(list) => list.render(glue.unwrap_or(STRUCTURE_GLUE)),
        }
    }

    /// Number of iterable entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Leaf(leaf) => leaf.messages.len(),
            Self::Field(field) => field.len(),
            Self::List(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entry at `index` in iteration order, or `None` past the end.
    pub fn error_by_index(&self, index: usize) -> Option<ErrorItem<'_>> {
        match self {
            Self::Leaf(leaf) => leaf
                .messages
                .get(index)
                .map(|message| ErrorItem::Message(message.as_str())),
            Self::Field(field) => field.fields.get(index).map(|(_, node)| ErrorItem::Error(node)),
            Self::List(list) => list.items.get(index).map(|item| match item {
                Some(node) => ErrorItem::Error(node),
                None => ErrorItem::Empty,
            }),
        }
    }

    /// Iterates over messages (leaf) or direct children (field/list).
    ///
    /// The non-field error is not part of the sequence.
    pub fn iter(&self) -> Iter<'_> {
        Iter::new(self)
    }
}

impl fmt::Display for ErrorNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string(None))
    }
}

impl From<LeafError> for ErrorNode {
    fn from(leaf: LeafError) -> Self {
        Self::Leaf(leaf)
    }
}

impl From<FieldError> for ErrorNode {
    fn from(field: FieldError) -> Self {
        Self::Field(field)
    }
}

impl From<ListError> for ErrorNode {
    fn from(list: ListError) -> Self {
        Self::List(list)
    }
}

impl<'a> IntoIterator for &'a ErrorNode {
    type Item = ErrorItem<'a>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(messages: &[&str]) -> ErrorNode {
        LeafError::new(messages.iter().copied()).into()
    }

    fn sample_fields() -> ErrorNode {
        FieldError::new()
            .with_non_field(leaf(&["Form is invalid"]))
            .with_field("name", leaf(&["Too short", "Not unique"]))
            .with_field("email", leaf(&["Required"]))
            .into()
    }

    #[test]
    fn test_leaf_rendering() {
        let node = leaf(&["Too short", "Not unique"]);
        assert_eq!(node.as_string(None), "Too short Not unique");
        assert_eq!(node.as_string(Some(", ")), "Too short, Not unique");
    }

    #[test]
    fn test_empty_leaf_has_no_error() {
        assert!(!leaf(&[]).has_error());
        assert!(leaf(&["x"]).has_error());
    }

    #[test]
    fn test_field_rendering_puts_non_field_first() {
        assert_eq!(
            sample_fields().to_string(),
            "Form is invalid; name: Too short Not unique; email: Required"
        );
    }

    #[test]
    fn test_field_rendering_without_fields_has_no_trailing_glue() {
        let node: ErrorNode = FieldError::new().with_non_field(leaf(&["Nope"])).into();
        assert_eq!(node.to_string(), "Nope");
    }

    #[test]
    fn test_list_rendering_keeps_empty_slots() {
        let node: ErrorNode =
            ListError::from_items([None, Some(leaf(&["Bad"])), None]).into();
        assert_eq!(node.to_string(), "0: null; 1: Bad; 2: null");
        assert_eq!(node.as_string(Some(" | ")), "0: null | 1: Bad | 2: null");
    }

    #[test]
    fn test_get_error_with_non_field_fallback() {
        let node = sample_fields();
        assert_eq!(
            node.get_error("name", false).map(|n| n.to_string()).as_deref(),
            Some("Too short Not unique")
        );
        assert!(node.get_error("missing", false).is_none());
        assert_eq!(
            node.get_error("missing", true).map(|n| n.to_string()).as_deref(),
            Some("Form is invalid")
        );
    }

    #[test]
    fn test_get_error_on_list() {
        let node: ErrorNode = ListError::from_items([None, Some(leaf(&["Bad"]))]).into();
        assert!(node.get_error(0usize, false).is_none());
        assert!(node.get_error(1usize, false).is_some());
        assert!(node.get_error(7usize, false).is_none());
        assert!(node.get_error("1", false).is_some());
    }

    #[test]
    fn test_get_error_path() {
        let node: ErrorNode = FieldError::new()
            .with_non_field(leaf(&["top"]))
            .with_field(
                "items",
                ListError::from_items([
                    None,
                    Some(FieldError::new().with_field("qty", leaf(&["Too many"])).into()),
                ])
                .into(),
            )
            .into();

        let path = [FieldKey::from("items"), FieldKey::Index(1), FieldKey::from("qty")];
        assert_eq!(
            node.get_error_path(&path, false).map(|n| n.to_string()).as_deref(),
            Some("Too many")
        );

        let missing = [FieldKey::from("items"), FieldKey::Index(0), FieldKey::from("qty")];
        assert!(node.get_error_path(&missing, true).is_none());

        // a missing intermediate never falls back to the root's non-field error
        let broken = [FieldKey::from("nope"), FieldKey::from("qty")];
        assert!(node.get_error_path(&broken, true).is_none());
    }

    #[test]
    fn test_first_error() {
        let node = sample_fields();
        assert_eq!(
            node.first_error(true).map(|n| n.to_string()).as_deref(),
            Some("Form is invalid")
        );
        assert_eq!(
            node.first_error(false).map(|n| n.to_string()).as_deref(),
            Some("Too short Not unique")
        );
    }

    #[test]
    fn test_first_error_of_leaf_is_itself() {
        let node = leaf(&["Service unavailable"]);
        assert_eq!(
            node.first_error(false).map(|n| n.to_string()).as_deref(),
            Some("Service unavailable")
        );
        assert!(node.first_error(true).is_some());

        let empty = leaf(&[]);
        assert!(empty.first_error(true).is_none());
    }

    #[test]
    fn test_first_error_does_not_skip_empty_slot() {
        let node: ErrorNode = ListError::from_items([None, Some(leaf(&["Bad"]))]).into();
        assert!(node.first_error(false).is_none());
    }

    #[test]
    fn test_children_are_bound_to_their_keys() {
        let node = sample_fields();
        let ErrorNode::Field(field) = &node else {
            panic!("expected a field error");
        };
        let names: Vec<_> = field.fields().map(|(_, n)| n.field_name().cloned()).collect();
        assert_eq!(
            names,
            vec![Some(FieldKey::from("name")), Some(FieldKey::from("email"))]
        );

        let list: ErrorNode = ListError::from_items([None, Some(leaf(&["x"]))]).into();
        assert_eq!(
            list.get_error(1usize, false).and_then(ErrorNode::field_name),
            Some(&FieldKey::Index(1))
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn test_rebinding_warns_and_keeps_first_name() {
        let mut node = leaf(&["x"]);
        node.bind_field_name(FieldKey::from("first"));
        node.bind_field_name(FieldKey::from("first"));
        assert!(!logs_contain("already bound"));

        node.bind_field_name(FieldKey::from("second"));
        assert!(logs_contain("already bound to a different field name"));
        assert_eq!(node.field_name(), Some(&FieldKey::from("first")));
    }

    #[test]
    fn test_insert_replaces_existing_key_in_place() {
        let mut field = FieldError::new()
            .with_field("a", leaf(&["1"]))
            .with_field("b", leaf(&["2"]));
        field.insert("a", leaf(&["3"]));

        let rendered = ErrorNode::from(field).to_string();
        assert_eq!(rendered, "a: 3; b: 2");
    }
}
