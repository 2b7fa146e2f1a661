//! Turns raw server error payloads into [`ErrorNode`] trees.
//!
//! Classification never fails: payloads that do not look like structured
//! errors degrade to a leaf carrying their text.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::node::{ErrorNode, FieldError, LeafError, ListError};

/// Key whose value is routed into the non-field slot of a [`FieldError`].
pub const NON_FIELD_ERRORS_KEY: &str = "non_field_errors";

/// Wrapper key some APIs nest their errors under.
pub const ERRORS_WRAPPER_KEY: &str = "errors";

/// Message used in place of an empty error string.
pub const EMPTY_MESSAGE_PLACEHOLDER: &str = "<empty error message>";

/// A raw error payload as received from the server.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorPayload {
    /// Response text; decoded as JSON when possible.
    Text(String),
    /// An already decoded JSON value.
    Json(Value),
    /// No payload at all.
    Undefined,
}

impl From<&str> for ErrorPayload {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<String> for ErrorPayload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<Value> for ErrorPayload {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<Option<Value>> for ErrorPayload {
    fn from(value: Option<Value>) -> Self {
        value.map_or(Self::Undefined, Self::Json)
    }
}

/// Strategy that turns a whole payload into an error tree.
pub type ParseErrorsFn =
    Arc<dyn Fn(&ErrorPayload, &ErrorStrategies) -> Option<ErrorNode> + Send + Sync>;

/// Strategy that classifies one decoded value.
pub type PrepareErrorFn = Arc<dyn Fn(&Value, &ErrorStrategies) -> Option<ErrorNode> + Send + Sync>;

/// The pair of pluggable classification strategies.
///
/// Both strategies receive the strategy set itself so that custom
/// implementations can recurse through whatever `prepare_error` is active.
#[derive(Clone)]
pub struct ErrorStrategies {
    pub parse_errors: ParseErrorsFn,
    pub prepare_error: PrepareErrorFn,
}

impl ErrorStrategies {
    /// Runs the active `parse_errors` strategy.
    pub fn parse(&self, payload: &ErrorPayload) -> Option<ErrorNode> {
        (self.parse_errors)(payload, self)
    }

    /// Runs the active `prepare_error` strategy.
    pub fn prepare(&self, value: &Value) -> Option<ErrorNode> {
        (self.prepare_error)(value, self)
    }
}

impl Default for ErrorStrategies {
    fn default() -> Self {
        Self {
            parse_errors: Arc::new(parse_errors),
            prepare_error: Arc::new(prepare_error),
        }
    }
}

impl fmt::Debug for ErrorStrategies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorStrategies").finish_non_exhaustive()
    }
}

/// Default `parse_errors` strategy.
///
/// Text is decoded as JSON, falling back to the text itself when it is not
/// valid JSON. A missing payload becomes the text `"undefined"`. An object
/// whose only key is [`ERRORS_WRAPPER_KEY`] is unwrapped here, at the root
/// only; nested `errors` keys are ordinary fields. Returns `None` when the
/// resulting tree carries no error.
///
/// ## Examples
///
/// ```rust
/// use routes::error_tree::{parse_errors, ErrorPayload, ErrorStrategies};
///
/// let strategies = ErrorStrategies::default();
/// let payload = ErrorPayload::from(r#"{"name": ["This field is required."]}"#);
///
/// let errors = parse_errors(&payload, &strategies).unwrap();
/// assert_eq!(errors.to_string(), "name: This field is required.");
/// ```
pub fn parse_errors(payload: &ErrorPayload, strategies: &ErrorStrategies) -> Option<ErrorNode> {
    let value = match payload {
        ErrorPayload::Text(text) => decode_text(text),
        ErrorPayload::Json(value) => value.clone(),
        ErrorPayload::Undefined => decode_text("undefined"),
    };

    let root = match &value {
        Value::Object(map) => wrapped_errors(map).unwrap_or(&value),
        _ => &value,
    };

    strategies.prepare(root).filter(ErrorNode::has_error)
}

fn decode_text(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// Default `prepare_error` strategy.
///
/// - strings become a single-message leaf (empty strings use
///   [`EMPTY_MESSAGE_PLACEHOLDER`])
/// - arrays of strings become a leaf; other arrays become a list whose
///   error-free positions are `None`
/// - objects become a field error; [`NON_FIELD_ERRORS_KEY`] feeds the
///   non-field slot
/// - `null` is no error; booleans and numbers become their text
///
/// The [`ERRORS_WRAPPER_KEY`] unwrap belongs to [`parse_errors`], so a
/// field named `errors` at any depth below the root is kept as a field.
pub fn prepare_error(value: &Value, strategies: &ErrorStrategies) -> Option<ErrorNode> {
    match value {
        Value::Null => None,
        Value::String(message) if message.is_empty() => {
            Some(LeafError::new([EMPTY_MESSAGE_PLACEHOLDER]).into())
        }
        Value::String(message) => Some(LeafError::new([message.as_str()]).into()),
        Value::Bool(flag) => Some(LeafError::new([flag.to_string()]).into()),
        Value::Number(number) => {
            let text = number.to_string();
            (!text.is_empty()).then(|| LeafError::new([text]).into())
        }
        Value::Array(items) => Some(classify_array(items, strategies)),
        Value::Object(map) => Some(classify_object(value, map, strategies)),
    }
}

fn wrapped_errors(map: &Map<String, Value>) -> Option<&Value> {
    if map.len() != 1 {
        return None;
    }
    map.get(ERRORS_WRAPPER_KEY).filter(|inner| !inner.is_null())
}

fn classify_array(items: &[Value], strategies: &ErrorStrategies) -> ErrorNode {
    let messages: Option<Vec<&str>> = items.iter().map(Value::as_str).collect();
    if let Some(messages) = messages {
        return LeafError::new(messages).into();
    }

    ListError::from_items(
        items
            .iter()
            .map(|item| strategies.prepare(item).filter(ErrorNode::has_error)),
    )
    .into()
}

fn classify_object(
    original: &Value,
    map: &Map<String, Value>,
    strategies: &ErrorStrategies,
) -> ErrorNode {
    let mut node = FieldError::new();

    for (key, child) in map {
        let Some(child) = strategies.prepare(child).filter(ErrorNode::has_error) else {
            continue;
        };
        if key == NON_FIELD_ERRORS_KEY {
            node.set_non_field(child);
        } else {
            node.insert(key.as_str(), child);
        }
    }

    if node.is_empty() && node.non_field().is_none() && !map.is_empty() {
        // keys were present but none of them held an error
        return FieldError::new()
            .with_non_field(LeafError::new([original.to_string()]).into())
            .into();
    }

    node.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error_tree::FieldKey;
    use serde_json::json;

    fn prepare(value: Value) -> Option<ErrorNode> {
        let strategies = ErrorStrategies::default();
        strategies.prepare(&value)
    }

    fn parse(payload: impl Into<ErrorPayload>) -> Option<ErrorNode> {
        let strategies = ErrorStrategies::default();
        parse_errors(&payload.into(), &strategies)
    }

    #[test]
    fn test_string_becomes_leaf() {
        let node = prepare(json!("Nope")).unwrap();
        assert!(matches!(&node, ErrorNode::Leaf(leaf) if leaf.messages() == ["Nope"]));
    }

    #[test]
    fn test_empty_string_uses_placeholder() {
        let node = parse("").unwrap();
        assert!(
            matches!(&node, ErrorNode::Leaf(leaf) if leaf.messages() == [EMPTY_MESSAGE_PLACEHOLDER])
        );
    }

    #[test]
    fn test_invalid_json_text_is_kept_whole() {
        let node = parse("<h1>Bad Request</h1>").unwrap();
        assert_eq!(node.to_string(), "<h1>Bad Request</h1>");
    }

    #[test]
    fn test_undefined_payload_is_stringified() {
        let node = parse(ErrorPayload::Undefined).unwrap();
        assert_eq!(node.to_string(), "undefined");
    }

    #[test]
    fn test_null_is_no_error() {
        assert!(prepare(Value::Null).is_none());
        assert!(parse("null").is_none());
    }

    #[test]
    fn test_scalars_are_stringified() {
        assert_eq!(prepare(json!(42)).unwrap().to_string(), "42");
        assert_eq!(prepare(json!(false)).unwrap().to_string(), "false");
    }

    #[test]
    fn test_string_array_becomes_leaf() {
        let node = prepare(json!(["a", "b"])).unwrap();
        assert!(matches!(&node, ErrorNode::Leaf(leaf) if leaf.messages() == ["a", "b"]));
    }

    #[test]
    fn test_mixed_array_keeps_positions() {
        let node = prepare(json!([{}, {"foo": ["bad"]}, null])).unwrap();
        let ErrorNode::List(list) = &node else {
            panic!("expected a list error, got {node:?}");
        };

        assert_eq!(list.len(), 3);
        assert!(list.items()[0].is_none());
        assert!(matches!(&list.items()[1], Some(ErrorNode::Field(field)) if field.get("foo").is_some()));
        assert!(list.items()[2].is_none());
    }

    #[test]
    fn test_wrapper_key_is_unwrapped() {
        let node = parse(r#"{"errors": {"non_field_errors": ["X"], "f": ["Y"]}}"#).unwrap();
        let ErrorNode::Field(field) = &node else {
            panic!("expected a field error, got {node:?}");
        };

        assert_eq!(field.non_field().map(ToString::to_string).as_deref(), Some("X"));
        assert_eq!(field.get("f").map(ToString::to_string).as_deref(), Some("Y"));
        assert_eq!(node.to_string(), "X; f: Y");
    }

    #[test]
    fn test_wrapper_key_is_unwrapped_once() {
        let node = parse(json!({"errors": {"errors": ["deep"]}})).unwrap();
        assert_eq!(node.to_string(), "errors: deep");
    }

    #[test]
    fn test_nested_errors_key_is_a_field() {
        let node = parse(json!({"items": {"errors": ["bad"]}})).unwrap();
        assert_eq!(node.to_string(), "items: errors: bad");
        let path = [FieldKey::from("items"), FieldKey::from("errors")];
        assert_eq!(
            node.get_error_path(&path, false).map(ToString::to_string).as_deref(),
            Some("bad")
        );
    }

    #[test]
    fn test_prepare_does_not_unwrap() {
        let node = prepare(json!({"errors": ["a"]})).unwrap();
        assert_eq!(node.to_string(), "errors: a");
    }

    #[test]
    fn test_wrapper_key_with_siblings_is_a_field() {
        let node = prepare(json!({"errors": ["a"], "name": ["b"]})).unwrap();
        assert_eq!(node.to_string(), "errors: a; name: b");
    }

    #[test]
    fn test_error_free_keys_are_omitted() {
        let node = prepare(json!({"a": null, "b": ["bad"], "c": []})).unwrap();
        let ErrorNode::Field(field) = &node else {
            panic!("expected a field error, got {node:?}");
        };
        let keys: Vec<_> = field.fields().map(|(key, _)| key).collect();
        assert_eq!(keys, vec!["b"]);
    }

    #[test]
    fn test_empty_object_is_no_error() {
        let node = prepare(json!({})).unwrap();
        assert!(!node.has_error());
        assert!(parse("{}").is_none());
    }

    #[test]
    fn test_keyed_object_without_errors_falls_back_to_dump() {
        let node = parse(r#"{"detail": null}"#).unwrap();
        let non_field = node.non_field().unwrap();
        assert_eq!(non_field.to_string(), r#"{"detail":null}"#);
    }

    #[test]
    fn test_field_order_follows_payload() {
        let node = parse(r#"{"zeta": ["z"], "alpha": ["a"]}"#).unwrap();
        assert_eq!(node.to_string(), "zeta: z; alpha: a");
        assert_eq!(
            node.first_error(false).map(ToString::to_string).as_deref(),
            Some("z")
        );
    }

    #[test]
    fn test_custom_prepare_strategy_is_used_recursively() {
        let strategies = ErrorStrategies {
            prepare_error: Arc::new(|value: &Value, strategies: &ErrorStrategies| match value {
                Value::String(message) => Some(LeafError::new([message.to_uppercase()]).into()),
                other => prepare_error(other, strategies),
            }),
            ..ErrorStrategies::default()
        };

        let node = strategies
            .parse(&ErrorPayload::from(r#"{"name": "too short"}"#))
            .unwrap();
        assert_eq!(node.to_string(), "name: TOO SHORT");
    }
}
