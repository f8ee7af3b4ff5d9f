//! Containers, templates and inline embedded views

use std::rc::Rc;

use tracing::debug;

use crate::error::{Result, RuntimeError};
use crate::render3::hooks::register_post_order_hooks;
use crate::render3::interfaces::container::LContainer;
use crate::render3::interfaces::definition::DirectiveDefRef;
use crate::render3::interfaces::node::{TAttributes, TNodeType};
use crate::render3::interfaces::view::{
    LSlot, LViewFlags, RenderFlags, TView, TViewRef, TViewType, TemplateFn, ViewId, ViewParent,
};
use crate::render3::state::RenderContext;

impl RenderContext {
    /// Declares an `<ng-template>`: a container anchor plus the TView of its content.
    pub fn template(
        &mut self,
        index: usize,
        template: TemplateFn,
        decls: usize,
        vars: usize,
        tag_name: Option<&str>,
        attrs: &[(&str, &str)],
    ) -> Result<()> {
        self.template_with(index, template, decls, vars, tag_name, attrs, &[])
    }

    /// `template` with directives applied to the `<ng-template>` node.
    #[allow(clippy::too_many_arguments)]
    pub fn template_with(
        &mut self,
        index: usize,
        template: TemplateFn,
        decls: usize,
        vars: usize,
        tag_name: Option<&str>,
        attrs: &[(&str, &str)],
        directives: &[DirectiveDefRef],
    ) -> Result<()> {
        let view = self.current_view()?;
        let attrs = if attrs.is_empty() {
            None
        } else {
            Some(TAttributes::from_pairs(attrs))
        };
        self.container_internal(index, tag_name, attrs)?;

        let tview = self.current_tview()?;
        {
            let mut tview = tview.borrow_mut();
            if tview.first_create_pass {
                let embedded = TView::new(TViewType::Embedded, Some(template), decls, vars);
                tview.node_mut(index)?.tview = Some(embedded);
            }
        }

        self.register_directives(index, directives)?;
        if self.tnode(view, index)?.has_directives() {
            self.instantiate_directives(view, index)?;
            let mut tview = tview.borrow_mut();
            if tview.first_create_pass {
                register_post_order_hooks(&mut tview, index)?;
            }
        }
        self.frame_mut()?.is_parent = false;
        Ok(())
    }

    /// Declares an anchor for views created at runtime or by inline embedded view blocks.
    pub fn container(&mut self, index: usize) -> Result<()> {
        self.container_internal(index, None, None)?;
        self.frame_mut()?.is_parent = false;
        Ok(())
    }

    fn container_internal(
        &mut self,
        index: usize,
        tag_name: Option<&str>,
        attrs: Option<TAttributes>,
    ) -> Result<()> {
        let view = self.current_view()?;
        self.get_or_create_tnode(index, TNodeType::Container, tag_name, attrs)?;
        let parent = self.tnode(view, index)?.parent;
        let anchor = self
            .renderer()
            .create_comment(self.config().container_comment());
        self.view_mut(view)?
            .set_slot(index, LSlot::Container(LContainer::new(index, anchor, None)));
        self.register_native(anchor, view, index)?;
        self.append_child(view, parent, anchor)?;
        Ok(())
    }

    /// Starts refreshing the inline embedded views of the container at `index`.
    pub fn container_refresh_start(&mut self, index: usize) -> Result<()> {
        let frame = self.frame_mut()?;
        frame.previous_or_parent = Some(index);
        frame.is_parent = true;
        let container = self
            .lview_mut()?
            .container_mut(index)
            .ok_or(RuntimeError::UnexpectedSlot {
                index,
                expected: "a container",
            })?;
        container.active_index = 0;
        container.inline = true;
        Ok(())
    }

    /// Enters the inline embedded view for `block_id`, reusing the one at the container cursor
    /// when it was created for the same block.
    ///
    /// Returns the flags the caller runs the block with: creation and update for a new view,
    /// update only for a reused one.
    pub fn embedded_view_start(
        &mut self,
        block_id: usize,
        decls: usize,
        vars: usize,
    ) -> Result<RenderFlags> {
        let host_view = self.current_view()?;
        let container_index = self.frame()?.previous_or_parent.ok_or_else(|| {
            RuntimeError::PhaseViolation("embedded view outside of a container".to_string())
        })?;
        let tview = self.current_tview()?;

        let block_tview = {
            let mut tview = tview.borrow_mut();
            let tnode = tview.node_mut(container_index)?;
            tnode
                .inline_tviews
                .entry(block_id)
                .or_insert_with(|| TView::new(TViewType::Embedded, None, decls, vars))
                .clone()
        };

        let (active_index, views) = {
            let container = self.view(host_view)?.container(container_index).ok_or(
                RuntimeError::UnexpectedSlot {
                    index: container_index,
                    expected: "a container",
                },
            )?;
            (container.active_index, container.views.clone())
        };

        let mut found = None;
        let mut stale = Vec::new();
        for candidate in views.iter().skip(active_index) {
            let candidate_block = self.inline_block_id(*candidate, &tview, container_index)?;
            match candidate_block {
                Some(id) if id == block_id => {
                    found = Some(*candidate);
                    break;
                }
                Some(id) if id < block_id => stale.push(*candidate),
                _ => break,
            }
        }
        for view in stale {
            self.remove_container_view(host_view, container_index, view)?;
        }

        let (view, flags) = match found {
            Some(view) => (view, RenderFlags::UPDATE),
            None => {
                let context = self.view_context(host_view)?;
                let view = self.create_view(
                    block_tview,
                    context,
                    Some(ViewParent::Container {
                        view: host_view,
                        index: container_index,
                    }),
                    Some((host_view, container_index)),
                );
                let lview = self.view_mut(view)?;
                lview.flags |= LViewFlags::ATTACHED;
                let container = self
                    .view_mut(host_view)?
                    .container_mut(container_index)
                    .ok_or(RuntimeError::UnexpectedSlot {
                        index: container_index,
                        expected: "a container",
                    })?;
                container.views.insert(container.active_index, view);
                debug!(%host_view, container_index, block_id, %view, "create inline view");
                (view, RenderFlags::CREATE | RenderFlags::UPDATE)
            }
        };

        if let Some(container) = self.view_mut(host_view)?.container_mut(container_index) {
            container.active_index += 1;
        }
        self.enter_view(view)?;
        Ok(flags)
    }

    fn inline_block_id(
        &self,
        view: ViewId,
        host_tview: &TViewRef,
        container_index: usize,
    ) -> Result<Option<usize>> {
        let view_tview = self.view(view)?.tview.clone();
        let host_tview = host_tview.borrow();
        let tnode = host_tview.node(container_index)?;
        Ok(tnode
            .inline_tviews
            .iter()
            .find(|(_, candidate)| Rc::ptr_eq(candidate, &view_tview))
            .map(|(block_id, _)| *block_id))
    }

    /// Completes the inline embedded view entered by `embedded_view_start`.
    pub fn embedded_view_end(&mut self) -> Result<()> {
        let view = self.current_view()?;
        let creation = self.view(view)?.is_creation_mode();
        self.leave_view();
        if creation {
            self.render_view(view)?;
        }
        self.refresh_view(view)?;

        if creation {
            if let Some(ViewParent::Container { view: host_view, index }) = self.view(view)?.parent
            {
                self.attach_view_natives(host_view, index, view)?;
            }
        }
        Ok(())
    }

    /// Removes the inline views the last refresh did not reach.
    pub fn container_refresh_end(&mut self) -> Result<()> {
        let index = self.close_parent_node()?;
        let host_view = self.current_view()?;
        let stale = {
            let container = self.view(host_view)?.container(index).ok_or(
                RuntimeError::UnexpectedSlot {
                    index,
                    expected: "a container",
                },
            )?;
            container.views[container.active_index.min(container.views.len())..].to_vec()
        };
        for view in stale {
            self.remove_container_view(host_view, index, view)?;
        }
        Ok(())
    }
}
