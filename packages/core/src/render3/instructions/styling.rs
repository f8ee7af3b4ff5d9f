//! Class and style binding instructions
//!
//! Binding instructions only store values and record which binding changed. Once the template
//! and host bindings of a view have run, [`RenderContext::flush_styling`] recomputes the text of
//! every touched node from the lowest priority changed binding and writes it through the
//! reconciler.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::trace;

use crate::error::{Result, RuntimeError};
use crate::render3::interfaces::styling::TStylingKey;
use crate::render3::interfaces::view::{StylingDirty, ViewId};
use crate::render3::state::RenderContext;
use crate::render3::styling::reconcile::{write_and_reconcile_class, write_and_reconcile_style};
use crate::render3::styling::style_binding_list::{
    binding_chain, flush_style_binding, insert_t_styling_binding,
};

impl RenderContext {
    /// `[class.name]="value"`
    pub fn class_prop(&mut self, class_name: &str, value: Value) -> Result<()> {
        self.styling_binding(TStylingKey::prop(class_name), value, true)
    }

    /// `[style.name.suffix]="value"`
    pub fn style_prop(&mut self, style_name: &str, value: Value, suffix: Option<&str>) -> Result<()> {
        self.styling_binding(TStylingKey::prop_with_suffix(style_name, suffix), value, false)
    }

    /// `[class]="value"` with a string, array or object value.
    pub fn class_map(&mut self, value: Value) -> Result<()> {
        self.styling_binding(TStylingKey::ClassMap, value, true)
    }

    /// `[style]="value"` with a string or object value.
    pub fn style_map(&mut self, value: Value) -> Result<()> {
        if value.is_array() {
            return Err(RuntimeError::UnsupportedBinding(format!("[style] bound to {}", value)));
        }
        self.styling_binding(TStylingKey::StyleMap, value, false)
    }

    fn styling_binding(&mut self, key: TStylingKey, value: Value, is_class: bool) -> Result<()> {
        let node = self.selected_index()?;
        let (index, is_host) = {
            let frame = self.frame_mut()?;
            let index = frame.binding_index;
            // value slot plus cached concatenation
            frame.binding_index += 2;
            (index, frame.in_host_bindings)
        };

        let tview = self.current_tview()?;
        {
            let mut tview = tview.borrow_mut();
            if tview.first_update_pass {
                insert_t_styling_binding(&mut tview, node, key, index, is_host, is_class)?;
            }
        }

        if self.binding_updated(index, value)? {
            let dirty = StylingDirty {
                node,
                is_class,
                binding_index: index,
            };
            let lview = self.lview_mut()?;
            if !lview.styling_dirty.contains(&dirty) {
                lview.styling_dirty.push(dirty);
            }
        }
        Ok(())
    }

    /// Writes the styling of every node with changed bindings in `view`.
    pub(crate) fn flush_styling(&mut self, view: ViewId) -> Result<()> {
        let dirty = std::mem::take(&mut self.view_mut(view)?.styling_dirty);
        if dirty.is_empty() {
            return Ok(());
        }

        let mut by_node: BTreeMap<(usize, bool), Vec<usize>> = BTreeMap::new();
        for entry in dirty {
            by_node
                .entry((entry.node, entry.is_class))
                .or_default()
                .push(entry.binding_index);
        }

        let tview_ref = self.view(view)?.tview.clone();
        let renderer = self.renderer();
        for ((node, is_class), changed) in by_node {
            let tview = tview_ref.borrow();
            let chain = binding_chain(&tview, node, is_class)?;
            let Some(start) = chain.into_iter().find(|index| changed.contains(index)) else {
                continue;
            };

            let lview = self.view_mut(view)?;
            let text = flush_style_binding(&tview, node, &mut lview.slots, start, is_class)?;
            let Some(element) = lview.native(node) else {
                continue;
            };
            let expected = match lview.styling_written.get(&(node, is_class)) {
                Some(written) => written.clone(),
                None => tview
                    .node(node)
                    .map(|tnode| tnode.static_styling(is_class).to_string())
                    .unwrap_or_default(),
            };
            trace!(%view, node, is_class, %text, "write styling");
            let overwritten = if is_class {
                write_and_reconcile_class(renderer.as_ref(), element, &expected, &text)
            } else {
                write_and_reconcile_style(renderer.as_ref(), element, &expected, &text)
            };
            if overwritten.is_none() {
                trace!(%view, node, is_class, "styling reconciled incrementally");
            }
            lview.styling_written.insert((node, is_class), text);
        }
        Ok(())
    }
}
