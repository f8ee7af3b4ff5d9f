//! View containers and embedded views
//!
//! A [`ViewContainerRef`] addresses the container stored at one slot of one view. Its views are
//! kept in DOM order: view `i`'s root natives follow the anchor and the natives of views
//! `0..i`. Every mutation checks its inputs before touching the DOM.

use tracing::debug;

use super::interfaces::container::LContainer;
use super::interfaces::node::TNodeType;
use super::interfaces::renderer::RNode;
use super::interfaces::view::{
    Instance, LSlot, LViewFlags, TViewRef, ViewId, ViewParent,
};
use super::state::RenderContext;
use crate::error::{Result, RuntimeError};

/// Template of an `<ng-template>` node, able to stamp out embedded views.
#[derive(Debug, Clone)]
pub struct EmbeddedViewFactory {
    pub declaration_view: ViewId,
    pub tnode_index: usize,
    pub tview: TViewRef,
}

/// Handle on the view container at slot `index` of `view`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewContainerRef {
    pub view: ViewId,
    pub index: usize,
}

impl ViewContainerRef {
    fn container<'a>(&self, ctx: &'a RenderContext) -> Result<&'a LContainer> {
        ctx.view(self.view)?
            .container(self.index)
            .ok_or(RuntimeError::UnexpectedSlot {
                index: self.index,
                expected: "a container",
            })
    }

    pub fn length(&self, ctx: &RenderContext) -> Result<usize> {
        Ok(self.container(ctx)?.views.len())
    }

    pub fn get(&self, ctx: &RenderContext, index: usize) -> Result<Option<ViewId>> {
        Ok(self.container(ctx)?.views.get(index).copied())
    }

    pub fn index_of(&self, ctx: &RenderContext, view: ViewId) -> Result<Option<usize>> {
        Ok(self.container(ctx)?.index_of(view))
    }

    /// Anchor comment the views are inserted after.
    pub fn anchor(&self, ctx: &RenderContext) -> Result<RNode> {
        Ok(self.container(ctx)?.anchor)
    }

    /// Inserts `view` at `index` (at the end when `None`) and returns its position.
    pub fn insert(
        &self,
        ctx: &mut RenderContext,
        view: ViewId,
        index: Option<usize>,
    ) -> Result<usize> {
        if ctx.is_destroyed(view)? {
            return Err(RuntimeError::InvalidOperation(format!(
                "cannot insert destroyed {}",
                view
            )));
        }
        let already_here = self.index_of(ctx, view)?.is_some();
        let length = self.length(ctx)? - usize::from(already_here);
        let position = index.unwrap_or(length);
        if position > length {
            return Err(RuntimeError::InvalidOperation(format!(
                "index {} out of range for container of length {}",
                position, length
            )));
        }

        if let Some(ViewParent::Container {
            view: host_view,
            index: container_index,
        }) = ctx.view(view)?.parent
        {
            ViewContainerRef {
                view: host_view,
                index: container_index,
            }
            .detach_view(ctx, view)?;
        }

        let container = ctx
            .view_mut(self.view)?
            .container_mut(self.index)
            .ok_or(RuntimeError::UnexpectedSlot {
                index: self.index,
                expected: "a container",
            })?;
        container.views.insert(position, view);
        let lview = ctx.view_mut(view)?;
        lview.parent = Some(ViewParent::Container {
            view: self.view,
            index: self.index,
        });
        lview.flags |= LViewFlags::ATTACHED;

        debug!(container = %self.view, slot = self.index, %view, position, "insert view");
        ctx.attach_view_natives(self.view, self.index, view)?;
        Ok(position)
    }

    /// Inserts `view` right after `after`, or first when `after` is `None`.
    pub fn insert_after(
        &self,
        ctx: &mut RenderContext,
        view: ViewId,
        after: Option<ViewId>,
    ) -> Result<usize> {
        if ctx.is_destroyed(view)? {
            return Err(RuntimeError::InvalidOperation(format!(
                "cannot insert destroyed {}",
                view
            )));
        }
        let position = match after {
            None => 0,
            Some(after) => {
                self.index_of(ctx, after)?
                    .ok_or_else(|| {
                        RuntimeError::InvalidOperation(format!("{} is not in this container", after))
                    })?
                    + 1
            }
        };
        // A view already before the reference shifts it by one once detached.
        let position = match self.index_of(ctx, view)? {
            Some(current) if current < position => position - 1,
            _ => position,
        };
        self.insert(ctx, view, Some(position))
    }

    pub fn append(&self, ctx: &mut RenderContext, view: ViewId) -> Result<usize> {
        let last = self.container(ctx)?.views.last().copied();
        self.insert_after(ctx, view, last)
    }

    /// Moves an attached view to `new_index`.
    pub fn move_view(&self, ctx: &mut RenderContext, view: ViewId, new_index: usize) -> Result<usize> {
        if self.index_of(ctx, view)?.is_none() {
            return Err(RuntimeError::InvalidOperation(format!(
                "{} is not in this container",
                view
            )));
        }
        self.insert(ctx, view, Some(new_index))
    }

    /// Detaches the view at `index` (the last one when `None`) without destroying it.
    pub fn detach(&self, ctx: &mut RenderContext, index: Option<usize>) -> Result<Option<ViewId>> {
        let view = match index {
            Some(index) => self.get(ctx, index)?,
            None => self.container(ctx)?.views.last().copied(),
        };
        match view {
            Some(view) => {
                self.detach_view(ctx, view)?;
                Ok(Some(view))
            }
            None => Ok(None),
        }
    }

    /// Removes and destroys the view at `index` (the last one when `None`).
    pub fn remove(&self, ctx: &mut RenderContext, index: Option<usize>) -> Result<()> {
        if let Some(view) = self.detach(ctx, index)? {
            ctx.destroy_view(view)?;
        }
        Ok(())
    }

    pub fn clear(&self, ctx: &mut RenderContext) -> Result<()> {
        while self.length(ctx)? > 0 {
            self.remove(ctx, None)?;
        }
        Ok(())
    }

    /// Creates a view from `factory` and inserts it at `index`.
    pub fn create_embedded_view(
        &self,
        ctx: &mut RenderContext,
        factory: &EmbeddedViewFactory,
        context: Instance,
        index: Option<usize>,
    ) -> Result<ViewId> {
        let view = ctx.create_embedded_view(factory, context)?;
        self.insert(ctx, view, index)?;
        Ok(view)
    }

    fn detach_view(&self, ctx: &mut RenderContext, view: ViewId) -> Result<()> {
        ctx.detach_view_natives(view)?;
        if let Some(container) = ctx.view_mut(self.view)?.container_mut(self.index) {
            container.views.retain(|candidate| *candidate != view);
        }
        let lview = ctx.view_mut(view)?;
        lview.parent = None;
        lview.flags.remove(LViewFlags::ATTACHED);
        debug!(container = %self.view, slot = self.index, %view, "detach view");
        Ok(())
    }
}

impl RenderContext {
    /// Inserts the natives of `view` after those of the views preceding it in its container.
    pub(crate) fn attach_view_natives(
        &self,
        host_view: ViewId,
        container_index: usize,
        view: ViewId,
    ) -> Result<()> {
        let container = self.view(host_view)?.container(container_index).ok_or(
            RuntimeError::UnexpectedSlot {
                index: container_index,
                expected: "a container",
            },
        )?;
        if container.detached {
            return Ok(());
        }
        let renderer = self.renderer();
        let Some(parent) = renderer.parent_node(container.anchor) else {
            return Ok(());
        };
        let Some(position) = container.index_of(view) else {
            return Ok(());
        };

        let mut reference = container.anchor;
        for previous in container.views[..position].iter().rev() {
            if let Some(last) = self.collect_view_natives(*previous)?.last() {
                reference = *last;
                break;
            }
        }
        let before = renderer.next_sibling(reference);
        for native in self.collect_view_natives(view)? {
            renderer.insert_before(parent, native, before);
        }
        Ok(())
    }

    /// Detaches `view` from the container at `container_index` of `host_view` and destroys it.
    pub(crate) fn remove_container_view(
        &mut self,
        host_view: ViewId,
        container_index: usize,
        view: ViewId,
    ) -> Result<()> {
        ViewContainerRef {
            view: host_view,
            index: container_index,
        }
        .detach_view(self, view)?;
        self.destroy_view(view)
    }

    /// Destroys `view` and everything below it: nested views first, then destroy hooks and
    /// listeners of the view itself.
    pub fn destroy_view(&mut self, view: ViewId) -> Result<()> {
        if self.is_destroyed(view)? {
            return Ok(());
        }
        let children: Vec<ViewId> = self
            .view(view)?
            .slots
            .iter()
            .flat_map(|slot| match slot {
                LSlot::Container(container) => container.views.clone(),
                LSlot::Component { view, .. } => vec![*view],
                _ => Vec::new(),
            })
            .collect();
        for child in children {
            self.destroy_view(child)?;
        }

        self.execute_destroy_hooks(view)?;
        let lview = self.view_mut(view)?;
        for unlisten in std::mem::take(&mut lview.cleanup) {
            unlisten();
        }
        lview.flags.insert(LViewFlags::DESTROYED);
        lview.flags.remove(LViewFlags::ATTACHED);
        self.forget_natives(view)?;
        self.release_view(view);
        debug!(%view, "destroy view");
        Ok(())
    }

    /// Creates and renders (creation pass only) an embedded view; it is not inserted anywhere.
    pub fn create_embedded_view(
        &mut self,
        factory: &EmbeddedViewFactory,
        context: Instance,
    ) -> Result<ViewId> {
        let view = self.create_view(
            factory.tview.clone(),
            context,
            None,
            Some((factory.declaration_view, factory.tnode_index)),
        );
        self.render_view(view)?;
        Ok(view)
    }

    /// Container for the node that created `native`, promoting a plain element or comment slot
    /// into a container anchored right after it.
    pub fn get_view_container(&mut self, native: RNode) -> Result<ViewContainerRef> {
        let (view, index) = self.locate(native).ok_or_else(|| {
            RuntimeError::InvalidOperation(format!("{} was not created by a template", native))
        })?;
        self.view_container_at(view, index)
    }

    pub(crate) fn view_container_at(&mut self, view: ViewId, index: usize) -> Result<ViewContainerRef> {
        let host_native = match self.view(view)?.slot(index) {
            Some(LSlot::Container(_)) => return Ok(ViewContainerRef { view, index }),
            Some(LSlot::Native(native)) => *native,
            Some(LSlot::Component { .. }) => {
                return Err(RuntimeError::InvalidOperation(format!(
                    "component host at {} cannot become a view container",
                    index
                )))
            }
            _ => {
                return Err(RuntimeError::UnexpectedSlot {
                    index,
                    expected: "a node",
                })
            }
        };

        let renderer = self.renderer();
        let anchor = renderer.create_comment(self.config().container_comment());
        if let Some(parent) = renderer.parent_node(host_native) {
            let before = renderer.next_sibling(host_native);
            renderer.insert_before(parent, anchor, before);
        }
        self.view_mut(view)?.set_slot(
            index,
            LSlot::Container(LContainer::new(index, anchor, Some(host_native))),
        );
        self.register_native(anchor, view, index)?;
        debug!(%view, index, "promoted node to view container");
        Ok(ViewContainerRef { view, index })
    }

    /// Template declared by the `<ng-template>` that created `native`.
    pub fn get_embedded_view_factory(&self, native: RNode) -> Result<EmbeddedViewFactory> {
        let (view, index) = self.locate(native).ok_or_else(|| {
            RuntimeError::InvalidOperation(format!("{} was not created by a template", native))
        })?;
        self.embedded_view_factory_at(view, index)
    }

    pub(crate) fn embedded_view_factory_at(
        &self,
        view: ViewId,
        index: usize,
    ) -> Result<EmbeddedViewFactory> {
        let tnode = self.tnode(view, index)?;
        match (tnode.node_type, tnode.tview) {
            (TNodeType::Container, Some(tview)) => Ok(EmbeddedViewFactory {
                declaration_view: view,
                tnode_index: index,
                tview,
            }),
            _ => Err(RuntimeError::InvalidOperation(format!(
                "node {} of {} is not a template",
                index, view
            ))),
        }
    }

    fn injection_point(&self) -> Result<(ViewId, usize)> {
        let (view, index) = match self.inject_context {
            Some(context) => context,
            None => {
                let frame = self.frame()?;
                (frame.view, frame.previous_or_parent)
            }
        };
        let index = index.ok_or_else(|| {
            RuntimeError::InvalidOperation("no node to inject from".to_string())
        })?;
        Ok((view, index))
    }

    /// View container of the node being created, for directive factories.
    pub fn inject_view_container_ref(&mut self) -> Result<ViewContainerRef> {
        let (view, index) = self.injection_point()?;
        self.view_container_at(view, index)
    }

    /// Template of the `<ng-template>` being created, for directive factories.
    pub fn inject_template_ref(&self) -> Result<EmbeddedViewFactory> {
        let (view, index) = self.injection_point()?;
        self.embedded_view_factory_at(view, index)
    }
}
