//! Style declaration parsing and diffing

use indexmap::IndexMap;

/// Parses the text of a `style` attribute into `(property, value)` pairs.
///
/// Property names are hyphenated (`fontSize` becomes `font-size`). Semicolons and colons inside
/// parentheses or quotes do not split declarations, so `background: url("a;b")` stays whole.
/// Declarations without a colon or with an empty name are dropped.
pub fn parse_style(value: &str) -> Vec<(String, String)> {
    let mut styles = Vec::new();

    let mut paren_depth = 0i32;
    let mut quote: Option<char> = None;
    let mut prop_start = 0;
    let mut value_start = 0;
    let mut current_prop: Option<String> = None;
    let mut previous: Option<char> = None;

    for (i, ch) in value.char_indices() {
        match ch {
            '(' if quote.is_none() => paren_depth += 1,
            ')' if quote.is_none() => paren_depth -= 1,
            '\'' | '"' => match quote {
                None => quote = Some(ch),
                Some(open) if open == ch && previous != Some('\\') => quote = None,
                Some(_) => {}
            },
            ':' if current_prop.is_none() && paren_depth == 0 && quote.is_none() => {
                current_prop = Some(hyphenate(value[prop_start..i].trim()));
                value_start = i + ch.len_utf8();
            }
            ';' if paren_depth == 0 && quote.is_none() => {
                if let Some(prop) = current_prop.take() {
                    push_declaration(&mut styles, prop, &value[value_start..i]);
                }
                prop_start = i + ch.len_utf8();
            }
            _ => {}
        }
        previous = Some(ch);
    }

    if let Some(prop) = current_prop {
        push_declaration(&mut styles, prop, &value[value_start..]);
    }

    styles
}

fn push_declaration(styles: &mut Vec<(String, String)>, prop: String, value: &str) {
    if !prop.is_empty() {
        styles.push((prop, value.trim().to_string()));
    }
}

/// Converts camelCase to kebab-case. Custom properties (`--myVar`) are left untouched.
pub fn hyphenate(value: &str) -> String {
    if value.starts_with("--") {
        return value.to_string();
    }
    let mut result = String::with_capacity(value.len() + 4);
    let mut previous_lowercase = false;
    for ch in value.chars() {
        if ch.is_uppercase() && previous_lowercase {
            result.push('-');
        }
        previous_lowercase = ch.is_lowercase();
        result.extend(ch.to_lowercase());
    }
    result
}

/// Serializes declarations back to `name: value; name: value` form.
pub fn stringify_style<'a>(declarations: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    declarations
        .into_iter()
        .map(|(name, value)| format!("{}: {}", name, value))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Net style changes between two declaration blocks.
///
/// Returns `(property, None)` for properties that disappeared and `(property, Some(value))` for
/// properties that were added or changed. When a property is declared more than once the last
/// declaration wins.
pub fn compute_style_changes(old_value: &str, new_value: &str) -> Vec<(String, Option<String>)> {
    let mut changes: IndexMap<String, (Option<String>, Option<String>)> = IndexMap::new();
    for (name, value) in parse_style(old_value) {
        changes.entry(name).or_default().0 = Some(value);
    }
    for (name, value) in parse_style(new_value) {
        changes.entry(name).or_default().1 = Some(value);
    }
    changes
        .into_iter()
        .filter_map(|(name, (old, new))| match (old, new) {
            (Some(_), None) => Some((name, None)),
            (old, Some(new)) if old.as_deref() != Some(new.as_str()) => Some((name, Some(new))),
            _ => None,
        })
        .collect()
}

/// Removes every declaration of `name` from a declaration block.
pub fn remove_style(text: &str, name: &str) -> String {
    let declarations = parse_style(text);
    if !declarations.iter().any(|(prop, _)| prop == name) {
        return text.to_string();
    }
    stringify_style(
        declarations
            .iter()
            .filter(|(prop, _)| prop != name)
            .map(|(prop, value)| (prop.as_str(), value.as_str())),
    )
}
