//! Class list diffing

use indexmap::IndexMap;
use serde_json::Value;

/// Splits a class list into tokens. Whitespace runs and empty input yield no tokens.
pub fn split_class_list(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

/// Net class changes between two class lists.
///
/// Returns `(class, true)` for classes to add and `(class, false)` for classes to remove, old
/// tokens first, each group in source order. Tokens present in both lists produce nothing.
pub fn compute_class_changes(old_value: &str, new_value: &str) -> Vec<(String, bool)> {
    let mut changes: IndexMap<&str, Option<bool>> = IndexMap::new();
    for token in split_class_list(old_value) {
        changes.insert(token, Some(false));
    }
    for token in split_class_list(new_value) {
        match changes.get(token).copied() {
            Some(Some(false)) => {
                changes.insert(token, None);
            }
            Some(_) => {}
            None => {
                changes.insert(token, Some(true));
            }
        }
    }
    changes
        .into_iter()
        .filter_map(|(token, change)| change.map(|add| (token.to_string(), add)))
        .collect()
}

/// Adds or removes `class_name` in a space separated class list.
pub fn toggle_class(text: &str, class_name: &str, add: bool) -> String {
    let mut found = false;
    let mut tokens: Vec<&str> = Vec::new();
    for token in split_class_list(text) {
        if token == class_name {
            if add && !found {
                tokens.push(token);
            }
            found = true;
        } else {
            tokens.push(token);
        }
    }
    if add && !found {
        tokens.push(class_name);
    }
    tokens.join(" ")
}

/// Flattens a class binding value (string, array of names or `{name: truthy}` map) into a list.
pub fn normalize_class_value(value: &Value) -> String {
    match value {
        Value::String(text) => split_class_list(text).collect::<Vec<_>>().join(" "),
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .flat_map(split_class_list)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(map) => map
            .iter()
            .filter(|(_, enabled)| is_truthy(enabled))
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    }
}

/// JavaScript-style truthiness of a bound value.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(flag) => *flag,
        Value::Number(number) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Value::String(text) => !text.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
