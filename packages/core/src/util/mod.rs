//! Shared utilities

pub mod array_utils;

use serde_json::Value;

/// Text form of a bound value as rendered into text nodes and attributes.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
