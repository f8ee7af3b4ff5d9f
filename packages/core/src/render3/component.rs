//! Component bootstrap and change detection
//!
//! A root component is rendered into a root view holding a single host node. Rendering a view
//! runs its template in creation mode; refreshing it runs the update pass in this order:
//!
//! 1. template update
//! 2. onInit / doCheck hooks
//! 3. embedded views of the view's containers
//! 4. content hooks
//! 5. host bindings, then the styling flush
//! 6. child component views
//! 7. view hooks

use std::any::Any;
use std::rc::Rc;

use tracing::debug;

use super::di::register_node_injectables;
use super::hooks::register_post_order_hooks;
use super::instructions::allocate_expando;
use super::interfaces::definition::DirectiveDefRef;
use super::interfaces::node::{ProjectionSlot, TNode, TNodeType, TProjection};
use super::interfaces::renderer::RNode;
use super::interfaces::view::{
    HostBindingEntry, Instance, LSlot, LViewFlags, RenderFlags, TData, TView, TViewType, ViewId,
};
use super::state::RenderContext;
use crate::error::{Result, RuntimeError};

/// Options of [`RenderContext::render_component`].
#[derive(Debug, Clone, Default)]
pub struct CreateComponentOptions {
    /// Natives projected into each `<ng-content>` bucket of the component.
    pub projectable_nodes: Vec<Vec<RNode>>,
}

/// A bootstrapped component.
#[derive(Clone)]
pub struct ComponentRef {
    pub root_view: ViewId,
    pub component_view: ViewId,
    pub host_native: RNode,
    pub instance: Instance,
}

impl ComponentRef {
    pub fn instance<T: Any>(&self) -> Option<&T> {
        self.instance.downcast_ref::<T>()
    }

    /// Runs change detection over the component tree.
    pub fn detect_changes(&self, ctx: &mut RenderContext) -> Result<()> {
        ctx.refresh_view(self.root_view)
    }

    /// Removes the component's nodes from its host and destroys every view below it.
    pub fn destroy(&self, ctx: &mut RenderContext) -> Result<()> {
        if ctx.is_destroyed(self.root_view)? {
            return Ok(());
        }
        ctx.detach_view_natives(self.component_view)?;
        ctx.destroy_view(self.root_view)
    }
}

impl std::fmt::Debug for ComponentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRef")
            .field("root_view", &self.root_view)
            .field("component_view", &self.component_view)
            .field("host_native", &self.host_native)
            .finish()
    }
}

impl RenderContext {
    /// Renders `def` into the element matching `host_selector` and runs a first change
    /// detection.
    pub fn render_component(
        &mut self,
        def: DirectiveDefRef,
        host_selector: &str,
        options: CreateComponentOptions,
    ) -> Result<ComponentRef> {
        if !def.is_component() {
            return Err(RuntimeError::InvalidOperation(format!(
                "{} is not a component",
                def.type_name
            )));
        }
        let host_native = self
            .renderer()
            .select_root_element(host_selector)
            .ok_or_else(|| {
                RuntimeError::InvalidOperation(format!(
                    "the selector \"{}\" did not match any elements",
                    host_selector
                ))
            })?;

        let root_tview = TView::new(TViewType::Root, None, 1, 0);
        {
            let mut tview = root_tview.borrow_mut();
            let mut host = TNode::new(TNodeType::Element, 0, None, None, None);
            if !options.projectable_nodes.is_empty() {
                host.projection = TProjection::Slots(
                    options
                        .projectable_nodes
                        .into_iter()
                        .map(|nodes| Some(ProjectionSlot::Native(nodes)))
                        .collect(),
                );
            }
            tview.data[0] = TData::Node(host);
            tview.first_child = Some(0);
            register_node_injectables(&mut tview, 0, std::slice::from_ref(&def))?;
            if def.host_bindings.is_some() {
                let directive_index = tview.node(0)?.directive_start;
                let binding_start = allocate_expando(&mut tview, def.host_vars);
                tview.host_bindings.push(HostBindingEntry {
                    directive_index,
                    element_index: 0,
                    binding_start,
                });
            }
        }

        let root_view = self.create_view(root_tview.clone(), Rc::new(()), None, None);
        self.view_mut(root_view)?
            .set_slot(0, LSlot::Native(host_native));
        self.register_native(host_native, root_view, 0)?;
        self.run_in_view(root_view, |ctx| {
            {
                let frame = ctx.frame_mut()?;
                frame.previous_or_parent = Some(0);
                frame.is_parent = true;
            }
            ctx.instantiate_directives(root_view, 0)?;
            register_post_order_hooks(&mut root_tview.borrow_mut(), 0)
        })?;

        let (component_view, instance) = {
            let lview = self.view(root_view)?;
            let directive_index = root_tview.borrow().node(0)?.directive_start;
            let instance = match lview.slot(directive_index) {
                Some(LSlot::Instance(instance)) => instance.clone(),
                _ => {
                    return Err(RuntimeError::UnexpectedSlot {
                        index: directive_index,
                        expected: "a component instance",
                    })
                }
            };
            let component_view = lview.component_view(0).ok_or(RuntimeError::UnexpectedSlot {
                index: 0,
                expected: "a component view",
            })?;
            (component_view, instance)
        };
        debug!(component = %def.type_name, %root_view, %component_view, "bootstrap component");

        self.render_view(root_view)?;
        self.refresh_view(root_view)?;
        Ok(ComponentRef {
            root_view,
            component_view,
            host_native,
            instance,
        })
    }

    /// Creation pass of `view` and of the component views it hosts.
    pub(crate) fn render_view(&mut self, view: ViewId) -> Result<()> {
        self.run_in_view(view, |ctx| {
            let (tview, context) = {
                let lview = ctx.view(view)?;
                (lview.tview.clone(), lview.context.clone())
            };
            let template = tview.borrow().template.clone();
            if let Some(template) = template {
                template(ctx, RenderFlags::CREATE, &context)?;
            }
            tview.borrow_mut().first_create_pass = false;

            for component_view in ctx.child_component_views(view)? {
                ctx.render_view(component_view)?;
            }
            ctx.view_mut(view)?.flags.remove(LViewFlags::CREATION_MODE);
            Ok(())
        })
    }

    /// Update pass of `view` and, recursively, of its embedded and component views.
    pub fn refresh_view(&mut self, view: ViewId) -> Result<()> {
        if self.is_destroyed(view)? {
            return Err(RuntimeError::InvalidOperation(format!(
                "cannot refresh destroyed {}",
                view
            )));
        }
        self.run_in_view(view, |ctx| {
            let (tview, context) = {
                let lview = ctx.view(view)?;
                (lview.tview.clone(), lview.context.clone())
            };
            let template = tview.borrow().template.clone();
            if let Some(template) = template {
                template(ctx, RenderFlags::UPDATE, &context)?;
            }

            let pre_order_hooks = tview.borrow().pre_order_hooks.clone();
            ctx.execute_hooks(view, &pre_order_hooks)?;

            for embedded in ctx.child_embedded_views(view)? {
                ctx.refresh_view(embedded)?;
            }

            let content_hooks = tview.borrow().content_hooks.clone();
            ctx.execute_hooks(view, &content_hooks)?;

            let host_bindings = tview.borrow().host_bindings.clone();
            for entry in host_bindings {
                ctx.invoke_host_bindings(entry, RenderFlags::UPDATE)?;
            }
            ctx.flush_styling(view)?;
            tview.borrow_mut().first_update_pass = false;

            for component_view in ctx.child_component_views(view)? {
                ctx.refresh_view(component_view)?;
            }

            let view_hooks = tview.borrow().view_hooks.clone();
            ctx.execute_hooks(view, &view_hooks)?;
            ctx.view_mut(view)?.flags.remove(LViewFlags::FIRST_LVIEW_PASS);
            Ok(())
        })
    }

    fn child_component_views(&self, view: ViewId) -> Result<Vec<ViewId>> {
        let lview = self.view(view)?;
        let decls = lview.tview.borrow().decls;
        Ok((0..decls)
            .filter_map(|index| lview.component_view(index))
            .collect())
    }

    /// Views of the containers not refreshed inline by the template.
    fn child_embedded_views(&self, view: ViewId) -> Result<Vec<ViewId>> {
        let lview = self.view(view)?;
        let decls = lview.tview.borrow().decls;
        Ok((0..decls)
            .filter_map(|index| lview.container(index))
            .filter(|container| !container.inline)
            .flat_map(|container| container.views.iter().copied())
            .collect())
    }
}
