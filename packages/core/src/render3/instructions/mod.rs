//! Rendering instructions
//!
//! Compiled templates drive the runtime through these calls. Creation instructions build the
//! TNode graph on the first pass of a template and create natives into the current view;
//! update instructions only read the graph and compare bound values against the view slots.

mod binding;
mod container;
mod element;
mod listener;
mod styling;

use tracing::trace;

use super::interfaces::node::{TAttributes, TNode, TNodeType};
use super::interfaces::view::{HostBindingEntry, LSlot, RenderFlags, TData, TView};
use super::state::RenderContext;
use crate::error::{Result, RuntimeError};

/// Reserves `count` entries at the end of the expando and returns the first index.
pub(crate) fn allocate_expando(tview: &mut TView, count: usize) -> usize {
    let start = tview.data.len();
    tview.data.resize_with(start + count, || TData::Empty);
    start
}

/// Fails unless `index` is the lowest free declaration slot of `tview`: nodes are declared in
/// index order, without gaps.
pub(crate) fn assert_data_next(tview: &TView, index: usize) -> Result<()> {
    let decls = tview.decls.min(tview.data.len());
    let next = tview.data[..decls]
        .iter()
        .position(|data| matches!(data, TData::Empty))
        .unwrap_or(decls);
    if index == next && index < decls {
        Ok(())
    } else {
        Err(RuntimeError::IndexMismatch {
            index,
            expected: next,
        })
    }
}

impl RenderContext {
    /// Builds the TNode at `index` on the first pass (linking it after the previous node, or
    /// under the current parent) and makes it the current parent.
    pub(crate) fn get_or_create_tnode(
        &mut self,
        index: usize,
        node_type: TNodeType,
        tag_name: Option<&str>,
        attrs: Option<TAttributes>,
    ) -> Result<()> {
        let (tview, previous, is_parent) = {
            let frame = self.frame()?;
            (frame.tview.clone(), frame.previous_or_parent, frame.is_parent)
        };
        {
            let mut tview = tview.borrow_mut();
            if tview.first_create_pass && !tview.has_node(index) {
                assert_data_next(&tview, index)?;
                let parent = match previous {
                    Some(previous) if is_parent => Some(previous),
                    Some(previous) => tview.node(previous)?.parent,
                    None => None,
                };
                trace!(index, ?node_type, ?parent, "create tnode");
                tview.data[index] =
                    TData::Node(TNode::new(node_type, index, tag_name, attrs, parent));

                match previous {
                    Some(previous) if is_parent => {
                        let parent_tnode = tview.node_mut(previous)?;
                        if parent_tnode.child.is_none() {
                            parent_tnode.child = Some(index);
                        }
                    }
                    Some(previous) => {
                        let previous_tnode = tview.node_mut(previous)?;
                        if previous_tnode.next.is_none() {
                            previous_tnode.next = Some(index);
                        }
                    }
                    None => {}
                }
                if parent.is_none() && tview.first_child.is_none() {
                    tview.first_child = Some(index);
                }
            } else if !tview.has_node(index) {
                return Err(RuntimeError::MissingTNode(index));
            }
        }

        let frame = self.frame_mut()?;
        frame.previous_or_parent = Some(index);
        frame.is_parent = true;
        Ok(())
    }

    /// Closes the current parent node and returns its index.
    pub(crate) fn close_parent_node(&mut self) -> Result<usize> {
        let (tview, previous, is_parent) = {
            let frame = self.frame()?;
            (frame.tview.clone(), frame.previous_or_parent, frame.is_parent)
        };
        let closed = match previous {
            Some(previous) if is_parent => Some(previous),
            Some(previous) => tview.borrow().node(previous)?.parent,
            None => None,
        }
        .ok_or_else(|| {
            RuntimeError::PhaseViolation("end instruction without a matching start".to_string())
        })?;

        let frame = self.frame_mut()?;
        frame.previous_or_parent = Some(closed);
        frame.is_parent = false;
        Ok(closed)
    }

    /// Index of the element targeted by update instructions.
    pub(crate) fn selected_index(&self) -> Result<usize> {
        self.frame()?.selected_index.ok_or_else(|| {
            RuntimeError::PhaseViolation("no element selected for binding".to_string())
        })
    }

    /// Runs a directive's host binding function against its host element.
    pub(crate) fn invoke_host_bindings(
        &mut self,
        entry: HostBindingEntry,
        flags: RenderFlags,
    ) -> Result<()> {
        let host_bindings = {
            let tview = self.current_tview()?;
            let tview = tview.borrow();
            tview
                .directive(entry.directive_index)
                .and_then(|def| def.host_bindings.clone())
        };
        let Some(host_bindings) = host_bindings else {
            return Ok(());
        };
        let instance = match self.lview()?.slot(entry.directive_index) {
            Some(LSlot::Instance(instance)) => instance.clone(),
            _ => {
                return Err(RuntimeError::UnexpectedSlot {
                    index: entry.directive_index,
                    expected: "a directive instance",
                })
            }
        };

        let saved = self.frame()?.clone();
        {
            let frame = self.frame_mut()?;
            frame.selected_index = Some(entry.element_index);
            frame.previous_or_parent = Some(entry.element_index);
            frame.is_parent = true;
            frame.binding_index = entry.binding_start;
            frame.in_host_bindings = true;
        }
        let result = host_bindings(self, flags, &instance);
        let frame = self.frame_mut()?;
        frame.selected_index = saved.selected_index;
        frame.previous_or_parent = saved.previous_or_parent;
        frame.is_parent = saved.is_parent;
        frame.binding_index = saved.binding_index;
        frame.in_host_bindings = saved.in_host_bindings;
        result
    }
}
