//! Placement of native nodes
//!
//! Nodes are appended to their render parent as they are created. The render parent is the
//! closest ancestor element, skipping `<ng-container>` nodes (their children go before the
//! container's comment). Children of a component host are not appended at all; they only reach
//! the DOM through projection. Root nodes of embedded views wait until the view is inserted in
//! a container.

use super::interfaces::node::TNodeType;
use super::interfaces::renderer::RNode;
use super::interfaces::view::{LSlot, ViewId, ViewParent};
use super::state::RenderContext;
use crate::error::Result;

impl RenderContext {
    /// Native parent (and insertion reference) for a child of `parent` in `view`.
    pub(crate) fn render_parent(
        &self,
        view: ViewId,
        parent: Option<usize>,
    ) -> Result<Option<(RNode, Option<RNode>)>> {
        let lview = self.view(view)?;
        let Some(parent) = parent else {
            return Ok(match lview.parent {
                Some(ViewParent::Component { view, host }) => {
                    self.view(view)?.native(host).map(|native| (native, None))
                }
                _ => None,
            });
        };

        let (node_type, is_component, grand_parent) = {
            let tview = lview.tview.borrow();
            let tnode = tview.node(parent)?;
            (tnode.node_type, tnode.is_component_host(), tnode.parent)
        };
        match node_type {
            TNodeType::Element if is_component => Ok(None),
            TNodeType::Element => Ok(lview.native(parent).map(|native| (native, None))),
            TNodeType::ElementContainer => {
                let comment = lview.native(parent);
                Ok(self
                    .render_parent(view, grand_parent)?
                    .map(|(render_parent, _)| (render_parent, comment)))
            }
            _ => Ok(None),
        }
    }

    /// Attaches `native` under the render parent of `parent`, if there is one yet.
    pub(crate) fn append_child(
        &self,
        view: ViewId,
        parent: Option<usize>,
        native: RNode,
    ) -> Result<bool> {
        match self.render_parent(view, parent)? {
            Some((render_parent, before)) => {
                self.renderer().insert_before(render_parent, native, before);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Detaches `native` from whatever parent it currently has.
    pub(crate) fn remove_native(&self, native: RNode) {
        let renderer = self.renderer();
        if let Some(parent) = renderer.parent_node(native) {
            renderer.remove_child(parent, native);
        }
    }

    /// Root natives of `view` in DOM order, including nested container views and projected
    /// content.
    pub fn collect_view_natives(&self, view: ViewId) -> Result<Vec<RNode>> {
        let roots = self.view(view)?.tview.borrow().root_nodes();
        let mut natives = Vec::new();
        for index in roots {
            self.collect_tnode_natives(view, index, &mut natives)?;
        }
        Ok(natives)
    }

    pub(crate) fn collect_tnode_natives(
        &self,
        view: ViewId,
        index: usize,
        natives: &mut Vec<RNode>,
    ) -> Result<()> {
        let lview = self.view(view)?;
        let (node_type, detached, children) = {
            let tview = lview.tview.borrow();
            let tnode = tview.node(index)?;
            let children = if tnode.node_type == TNodeType::ElementContainer {
                tview.child_nodes(index)
            } else {
                Vec::new()
            };
            (tnode.node_type, tnode.is_detached(), children)
        };
        if detached {
            return Ok(());
        }

        match node_type {
            TNodeType::Element
            | TNodeType::Text
            | TNodeType::Container
            | TNodeType::ElementContainer => {
                // `<ng-container>` children sit before its comment.
                for child in children {
                    self.collect_tnode_natives(view, child, natives)?;
                }
                match lview.slot(index) {
                    Some(LSlot::Container(container)) => {
                        natives.extend(container.host_native);
                        natives.push(container.anchor);
                        let views = container.views.clone();
                        for child_view in views {
                            natives.extend(self.collect_view_natives(child_view)?);
                        }
                    }
                    Some(slot) => natives.extend(slot.native()),
                    None => {}
                }
            }
            TNodeType::Projection => {
                self.collect_projected_natives(view, index, natives, false)?;
            }
            TNodeType::View => {}
        }
        Ok(())
    }

    /// Removes every root native of `view` from the DOM.
    pub(crate) fn detach_view_natives(&self, view: ViewId) -> Result<()> {
        for native in self.collect_view_natives(view)? {
            self.remove_native(native);
        }
        Ok(())
    }
}
