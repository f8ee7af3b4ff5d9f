//! Styling binding priority list
//!
//! Bindings of one kind on one node are chained lowest priority first:
//!
//! ```text
//! static attribute -> host bindings (last applied directive first) -> template bindings
//! ```
//!
//! Concatenation walks the chain in that order so the highest priority writer of a key wins.
//! Each entry also records whether a lower or higher priority entry may write the same key;
//! only then does concatenation have to search and replace instead of appending.

use serde_json::Value;
use tracing::trace;

use super::class_differ::{is_truthy, split_class_list, toggle_class};
use super::style_differ::{hyphenate, parse_style, remove_style};
use crate::error::{Result, RuntimeError};
use crate::render3::interfaces::styling::{TStylingKey, TStylingLink};
use crate::render3::interfaces::view::{LSlot, TData, TView};

fn styling_entry(data: &[TData], index: usize) -> Result<(&TStylingKey, TStylingLink)> {
    match data.get(index) {
        Some(TData::Styling { key, link }) => Ok((key, *link)),
        _ => Err(RuntimeError::UnexpectedSlot {
            index,
            expected: "a styling binding",
        }),
    }
}

fn styling_link_mut(data: &mut [TData], index: usize) -> Result<&mut TStylingLink> {
    match data.get_mut(index) {
        Some(TData::Styling { link, .. }) => Ok(link),
        _ => Err(RuntimeError::UnexpectedSlot {
            index,
            expected: "a styling binding",
        }),
    }
}

/// Registers the binding at `index` in the priority list of `tnode_index`.
///
/// Host bindings go to the head of the list, template bindings to the tail. Must run during the
/// first update pass of `tview`.
pub fn insert_t_styling_binding(
    tview: &mut TView,
    tnode_index: usize,
    key: TStylingKey,
    index: usize,
    is_host: bool,
    is_class: bool,
) -> Result<()> {
    if !tview.first_update_pass {
        return Err(RuntimeError::PhaseViolation(format!(
            "styling binding at {} registered outside the first update pass",
            index
        )));
    }
    if index + 1 >= tview.data.len() {
        return Err(RuntimeError::IndexMismatch {
            index: index + 1,
            expected: tview.data.len(),
        });
    }

    let (range, static_duplicate) = {
        let tnode = tview.node(tnode_index)?;
        (
            tnode.bindings(is_class),
            tnode.has_static_styling(is_class, key.key()),
        )
    };

    let mut link = TStylingLink::default();
    let mut new_range = range;
    if is_host {
        link.next = range.head;
        if let Some(head) = range.head {
            styling_link_mut(&mut tview.data, head)?.prev = Some(index);
        }
        new_range.head = Some(index);
        if range.tail.is_none() {
            new_range.tail = Some(index);
        }
    } else {
        link.prev = range.tail;
        if let Some(tail) = range.tail {
            styling_link_mut(&mut tview.data, tail)?.next = Some(index);
        }
        new_range.tail = Some(index);
        if range.head.is_none() {
            new_range.head = Some(index);
        }
    }

    trace!(tnode_index, index, is_host, is_class, ?key, "insert styling binding");
    tview.data[index] = TData::Styling { key, link };
    tview.data[index + 1] = TData::Empty;

    mark_duplicates(&mut tview.data, index, static_duplicate, true)?;
    mark_duplicates(&mut tview.data, index, false, false)?;

    *tview.node_mut(tnode_index)?.bindings_mut(is_class) = new_range;
    Ok(())
}

/// Marks entries writing the same key as `index` (maps collide with every key), scanning toward
/// lower priority when `is_prev_dir` and toward higher priority otherwise.
fn mark_duplicates(
    data: &mut [TData],
    index: usize,
    static_duplicate: bool,
    is_prev_dir: bool,
) -> Result<()> {
    let (key, link) = {
        let (key, link) = styling_entry(data, index)?;
        (key.key().map(str::to_string), link)
    };
    let is_map = key.is_none();
    let mut cursor = if is_prev_dir { link.prev } else { link.next };
    let mut found_duplicate = false;

    while let Some(position) = cursor {
        if found_duplicate && !is_map {
            break;
        }
        let (key_at_cursor, link_at_cursor) = {
            let (key_at_cursor, link_at_cursor) = styling_entry(data, position)?;
            (key_at_cursor.key().map(str::to_string), link_at_cursor)
        };
        if is_map || key_at_cursor.is_none() || key_at_cursor == key {
            found_duplicate = true;
            let link_at_cursor = styling_link_mut(data, position)?;
            if is_prev_dir {
                link_at_cursor.next_duplicate = true;
            } else {
                link_at_cursor.prev_duplicate = true;
            }
        }
        cursor = if is_prev_dir {
            link_at_cursor.prev
        } else {
            link_at_cursor.next
        };
    }

    if is_prev_dir && static_duplicate {
        found_duplicate = true;
    }
    if found_duplicate {
        let link = styling_link_mut(data, index)?;
        if is_prev_dir {
            link.prev_duplicate = true;
        } else {
            link.next_duplicate = true;
        }
    }
    Ok(())
}

/// Binding indexes of a node's list, lowest priority first.
pub fn binding_chain(tview: &TView, tnode_index: usize, is_class: bool) -> Result<Vec<usize>> {
    let mut chain = Vec::new();
    let mut cursor = tview.node(tnode_index)?.bindings(is_class).head;
    while let Some(index) = cursor {
        chain.push(index);
        cursor = styling_entry(&tview.data, index)?.1.next;
    }
    Ok(chain)
}

/// Recomputes the concatenated text from the binding at `index` to the tail of the list.
///
/// Concatenation is seeded with the cached text of the previous binding (or the static value at
/// the head) and every visited binding caches its own result at `index + 1`.
pub fn flush_style_binding(
    tview: &TView,
    tnode_index: usize,
    slots: &mut Vec<LSlot>,
    index: usize,
    is_class: bool,
) -> Result<String> {
    let tnode = tview.node(tnode_index)?;
    let (_, link) = styling_entry(&tview.data, index)?;
    let mut text = match link.prev {
        None => tnode.static_styling(is_class).to_string(),
        Some(prev) => match slots.get(prev + 1).and_then(LSlot::value) {
            Some(Value::String(cached)) => cached.clone(),
            _ => match tnode.bindings(is_class).head {
                // Lower priority bindings never flushed yet.
                Some(head) if head != index => {
                    return flush_style_binding(tview, tnode_index, slots, head, is_class)
                }
                _ => tnode.static_styling(is_class).to_string(),
            },
        },
    };

    let mut cursor = Some(index);
    while let Some(position) = cursor {
        let (key, link) = styling_entry(&tview.data, position)?;
        let value = slots
            .get(position)
            .and_then(LSlot::value)
            .cloned()
            .unwrap_or(Value::Null);
        text = append_styling(text, key, &value, link.prev_duplicate, is_class)?;
        if slots.len() <= position + 1 {
            slots.resize(position + 2, LSlot::Empty);
        }
        slots[position + 1] = LSlot::Value(Value::String(text.clone()));
        cursor = link.next;
    }
    trace!(tnode_index, index, is_class, %text, "flushed styling");
    Ok(text)
}

fn concat(text: String, addition: &str, separator: &str) -> String {
    if addition.is_empty() {
        text
    } else if text.is_empty() {
        addition.to_string()
    } else {
        text + separator + addition
    }
}

fn style_value(value: &Value, suffix: Option<&str>) -> Option<String> {
    let text = match value {
        Value::String(text) if !text.is_empty() => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => return None,
    };
    Some(match suffix {
        Some(suffix) => text + suffix,
        None => text,
    })
}

/// Appends one binding's contribution to the concatenated text.
///
/// With `has_previous_duplicate` a lower priority binding may already have written the key, so
/// the key is replaced rather than appended.
pub fn append_styling(
    text: String,
    key: &TStylingKey,
    value: &Value,
    has_previous_duplicate: bool,
    is_class: bool,
) -> Result<String> {
    match key {
        TStylingKey::ClassMap => append_class_map(text, value, has_previous_duplicate),
        TStylingKey::StyleMap => append_style_map(text, value, has_previous_duplicate),
        TStylingKey::Prop { name, suffix } => {
            if is_class {
                let enabled = is_truthy(value);
                Ok(if has_previous_duplicate {
                    toggle_class(&text, name, enabled)
                } else if enabled {
                    concat(text, name, " ")
                } else {
                    text
                })
            } else {
                // An absent value leaves lower priority writers of the key in place.
                Ok(match style_value(value, suffix.as_deref()) {
                    Some(value) => {
                        let text = if has_previous_duplicate {
                            remove_style(&text, name)
                        } else {
                            text
                        };
                        concat(text, &format!("{}: {}", name, value), "; ")
                    }
                    None => text,
                })
            }
        }
    }
}

fn append_class_map(mut text: String, value: &Value, has_previous_duplicate: bool) -> Result<String> {
    match value {
        Value::Null => {}
        Value::Array(items) => {
            for item in items.iter().filter_map(Value::as_str) {
                for class_name in split_class_list(item) {
                    text = append_styling(
                        text,
                        &TStylingKey::prop(class_name),
                        &Value::Bool(true),
                        has_previous_duplicate,
                        true,
                    )?;
                }
            }
        }
        Value::Object(map) => {
            for (class_name, enabled) in map {
                text = append_styling(
                    text,
                    &TStylingKey::prop(class_name.as_str()),
                    enabled,
                    has_previous_duplicate,
                    true,
                )?;
            }
        }
        Value::String(classes) => {
            for class_name in split_class_list(classes) {
                text = append_styling(
                    text,
                    &TStylingKey::prop(class_name),
                    &Value::Bool(true),
                    has_previous_duplicate,
                    true,
                )?;
            }
        }
        other => {
            return Err(RuntimeError::UnsupportedBinding(format!(
                "class binding to {}",
                other
            )))
        }
    }
    Ok(text)
}

fn append_style_map(mut text: String, value: &Value, has_previous_duplicate: bool) -> Result<String> {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (name, value) in map {
                text = append_styling(
                    text,
                    &TStylingKey::prop(hyphenate(name)),
                    value,
                    has_previous_duplicate,
                    false,
                )?;
            }
        }
        Value::String(styles) => {
            for (name, value) in parse_style(styles) {
                text = append_styling(
                    text,
                    &TStylingKey::prop(name),
                    &Value::String(value),
                    has_previous_duplicate,
                    false,
                )?;
            }
        }
        other => {
            return Err(RuntimeError::UnsupportedBinding(format!(
                "style binding to {}",
                other
            )))
        }
    }
    Ok(text)
}
