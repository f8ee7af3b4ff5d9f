//! Writing styling to live elements
//!
//! The runtime remembers what it last wrote to each element's `class` and `style` attributes.
//! When the live attribute still holds that text the new value is written in one overwrite.
//! When something else changed the attribute in between, only the net difference between the
//! old and new runtime values is applied, leaving foreign classes and styles in place.

use tracing::warn;

use super::class_differ::compute_class_changes;
use super::style_differ::compute_style_changes;
use crate::render3::interfaces::renderer::{RNode, Renderer, RendererStyleFlags};

/// Whether the live attribute still holds `expected` and can be overwritten in one write.
///
/// The attribute is read back on every write, so an element whose attribute drifted once goes
/// back to overwrites as soon as it matches the runtime's value again.
fn can_overwrite(renderer: &dyn Renderer, element: RNode, name: &str, expected: &str) -> bool {
    match renderer.get_attribute(element, name) {
        Some(current) if current == expected => true,
        Some(current) => {
            warn!(
                %element,
                attribute = name,
                expected,
                %current,
                "attribute changed outside the runtime, reconciling incrementally"
            );
            false
        }
        None => false,
    }
}

/// Writes `new_value` as the element's class list.
///
/// Returns the overwritten value, or `None` when the incremental path was taken.
pub fn write_and_reconcile_class(
    renderer: &dyn Renderer,
    element: RNode,
    expected: &str,
    new_value: &str,
) -> Option<String> {
    if can_overwrite(renderer, element, "class", expected) {
        if expected != new_value {
            renderer.set_attribute(element, "class", new_value, None);
        }
        return Some(new_value.to_string());
    }
    reconcile_class_names(renderer, element, expected, new_value);
    None
}

/// Writes `new_value` as the element's style declarations. See [`write_and_reconcile_class`].
pub fn write_and_reconcile_style(
    renderer: &dyn Renderer,
    element: RNode,
    expected: &str,
    new_value: &str,
) -> Option<String> {
    if can_overwrite(renderer, element, "style", expected) {
        if expected != new_value {
            renderer.set_attribute(element, "style", new_value, None);
        }
        return Some(new_value.to_string());
    }
    reconcile_style_names(renderer, element, expected, new_value);
    None
}

pub fn reconcile_class_names(renderer: &dyn Renderer, element: RNode, old_value: &str, new_value: &str) {
    for (class_name, add) in compute_class_changes(old_value, new_value) {
        if add {
            renderer.add_class(element, &class_name);
        } else {
            renderer.remove_class(element, &class_name);
        }
    }
}

pub fn reconcile_style_names(renderer: &dyn Renderer, element: RNode, old_value: &str, new_value: &str) {
    for (name, value) in compute_style_changes(old_value, new_value) {
        match value {
            Some(value) => renderer.set_style(element, &name, &value, RendererStyleFlags::DASH_CASE),
            None => renderer.remove_style(element, &name, RendererStyleFlags::DASH_CASE),
        }
    }
}
