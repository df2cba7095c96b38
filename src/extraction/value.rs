//! Small accessors over `serde_yaml::Value` trees

use serde_yaml::Value;

/// Looks up a string key in a mapping; `None` for non-mappings
pub fn get<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    value.as_mapping()?.get(key)
}

/// Follows a chain of string keys through nested mappings
pub fn get_path<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, key| get(current, key))
}

/// Like `get_path`, but only returns mappings
pub fn get_mapping<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    get_path(value, path).filter(|v| v.is_mapping())
}

/// Renders a scalar as text; mappings, sequences and null yield `None`
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        Value::Null | Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

/// Renders a mapping key as a path segment
///
/// YAML allows non-string keys (`8080: x`, `true: y`, `~: z`); scalars are
/// rendered as their text, structured keys are not addressable.
pub fn key_to_string(key: &Value) -> Option<String> {
    match key {
        Value::Null => Some("null".to_string()),
        other => scalar_to_string(other),
    }
}

/// Mapping entries whose keys are addressable, in document order
pub fn entries(value: &Value) -> Vec<(String, &Value)> {
    match value.as_mapping() {
        Some(map) => map
            .iter()
            .filter_map(|(k, v)| key_to_string(k).map(|k| (k, v)))
            .collect(),
        None => Vec::new(),
    }
}
