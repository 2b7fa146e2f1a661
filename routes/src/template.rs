//! Path template rendering.
//!
//! Templates contain `${name}` or `{name}` placeholders. Names may be dotted
//! paths (`${user.id}`) that walk into nested objects (and arrays, by
//! index). Missing values render as an empty string.

use serde_json::Value;

/// Renders `template`, replacing placeholders with values from `params`.
///
/// ## Examples
///
/// ```rust
/// use routes::template::render_template;
/// use serde_json::json;
///
/// let params = json!({"pk": 7, "owner": {"name": "ann"}});
/// assert_eq!(render_template("/dogs/${pk}", &params), "/dogs/7");
/// assert_eq!(render_template("/users/{owner.name}/", &params), "/users/ann/");
/// assert_eq!(render_template("/cats/${missing}", &params), "/cats/");
/// ```
pub fn render_template(template: &str, params: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        let (before, tail) = rest.split_at(start);
        let Some(end) = tail.find('}') else {
            break;
        };

        let dollar = before.ends_with('$');
        out.push_str(if dollar { &before[..before.len() - 1] } else { before });

        let key = tail[1..end].trim();
        out.push_str(&lookup(params, key));
        rest = &tail[end + 1..];
    }

    out.push_str(rest);
    out
}

fn lookup(params: &Value, key: &str) -> String {
    let found = key.split('.').try_fold(params, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    });

    match found {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}
