//! Value coercion helpers
//!
//! Small, pure functions over raw `serde_json::Value` input shared by the
//! normalizer and the operator compiler.

use serde_json::{Map, Value};

/// Returns true for null, `""`, `[]` and `{}`.
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// First key of an object in insertion order.
pub fn first_key(map: &Map<String, Value>) -> Option<&str> {
    map.keys().next().map(String::as_str)
}

/// First value of an object or first element of a sequence.
/// Scalars are returned as-is.
pub fn first_value(value: &Value) -> Option<&Value> {
    match value {
        Value::Object(map) => map.values().next(),
        Value::Array(items) => items.first(),
        other => Some(other),
    }
}

/// Coerces a raw value into a sequence of values.
///
/// - empty input yields an empty sequence
/// - a string containing `,` is split and each part trimmed
/// - any other scalar is wrapped in a one-element sequence
/// - a sequence is passed through
pub fn to_value_list(value: &Value) -> Vec<Value> {
    if is_empty_value(value) {
        return Vec::new();
    }

    match value {
        Value::String(s) if s.contains(',') => s
            .split(',')
            .map(|part| Value::String(part.trim().to_string()))
            .collect(),
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

/// Splits a comma-delimited string, or an already-split sequence, into
/// trimmed, non-empty tokens.
pub fn split_tokens(value: &Value) -> Vec<String> {
    match value {
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .collect(),
        Value::Array(items) => items.iter().flat_map(split_tokens).collect(),
        Value::Number(n) => vec![n.to_string()],
        _ => Vec::new(),
    }
}
