//! Render context
//!
//! All mutable rendering state lives in a [`RenderContext`]: the arena of view instances, the
//! renderer and the cursor of the view currently executing instructions. Entering a child view
//! saves the current cursor and leaving it restores the saved one, so nested template execution
//! never observes another view's cursor.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use super::di::Injector;
use super::interfaces::renderer::{RNode, RendererRef};
use super::interfaces::node::TNode;
use super::interfaces::view::{Instance, LView, TViewRef, TViewType, ViewId, ViewParent};
use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};

/// Cursor of the view currently executing instructions.
#[derive(Clone)]
pub(crate) struct LFrame {
    pub view: ViewId,
    pub tview: TViewRef,
    /// Last node created or selected; `None` at the root of the view.
    pub previous_or_parent: Option<usize>,
    /// `previous_or_parent` is the parent of the next node rather than its previous sibling.
    pub is_parent: bool,
    pub selected_index: Option<usize>,
    pub binding_index: usize,
    pub in_host_bindings: bool,
}

/// Arena slot. `view` is `None` while the slot sits on the free list.
struct ViewEntry {
    generation: u32,
    view: Option<LView>,
}

pub struct RenderContext {
    views: Vec<ViewEntry>,
    free_views: Vec<usize>,
    renderer: RendererRef,
    config: RuntimeConfig,
    frame: Option<LFrame>,
    saved_frames: Vec<LFrame>,
    /// Location of every native node created from a template.
    pub(crate) node_locations: HashMap<RNode, (ViewId, usize)>,
    module_injector: Option<Rc<dyn Injector>>,
    /// Node whose injector a provider or directive factory resolves against.
    pub(crate) inject_context: Option<(ViewId, Option<usize>)>,
}

impl RenderContext {
    pub fn new(renderer: RendererRef, config: RuntimeConfig) -> Self {
        RenderContext {
            views: Vec::new(),
            free_views: Vec::new(),
            renderer,
            config,
            frame: None,
            saved_frames: Vec::new(),
            node_locations: HashMap::new(),
            module_injector: None,
            inject_context: None,
        }
    }

    pub fn renderer(&self) -> RendererRef {
        self.renderer.clone()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    pub fn dev_mode(&self) -> bool {
        self.config.dev_mode()
    }

    /// Injector consulted when no node injector provides a token.
    pub fn set_module_injector(&mut self, injector: Rc<dyn Injector>) {
        self.module_injector = Some(injector);
    }

    pub fn module_injector(&self) -> Option<Rc<dyn Injector>> {
        self.module_injector.clone()
    }

    pub(crate) fn create_view(
        &mut self,
        tview: TViewRef,
        context: Instance,
        parent: Option<ViewParent>,
        declaration: Option<(ViewId, usize)>,
    ) -> ViewId {
        let index = match self.free_views.pop() {
            Some(index) => index,
            None => {
                self.views.push(ViewEntry {
                    generation: 0,
                    view: None,
                });
                self.views.len() - 1
            }
        };
        let entry = &mut self.views[index];
        let id = ViewId::new(index, entry.generation);
        debug!(%id, ?parent, ?declaration, "create view");
        entry.view = Some(LView::new(id, tview, self.renderer.clone(), context, parent, declaration));
        id
    }

    /// Frees the arena slot of a destroyed view. Handles on it become stale.
    pub(crate) fn release_view(&mut self, id: ViewId) {
        if let Some(entry) = self.views.get_mut(id.index()) {
            if entry.generation == id.generation() && entry.view.take().is_some() {
                entry.generation = entry.generation.wrapping_add(1);
                self.free_views.push(id.index());
            }
        }
    }

    pub fn view(&self, id: ViewId) -> Result<&LView> {
        self.views
            .get(id.index())
            .filter(|entry| entry.generation == id.generation())
            .and_then(|entry| entry.view.as_ref())
            .ok_or(RuntimeError::UnknownView(id.index()))
    }

    pub fn view_mut(&mut self, id: ViewId) -> Result<&mut LView> {
        self.views
            .get_mut(id.index())
            .filter(|entry| entry.generation == id.generation())
            .and_then(|entry| entry.view.as_mut())
            .ok_or(RuntimeError::UnknownView(id.index()))
    }

    /// Whether `id` was destroyed. A handle whose slot was released or reused counts as
    /// destroyed; an id this context never handed out is an error.
    pub fn is_destroyed(&self, id: ViewId) -> Result<bool> {
        let entry = self
            .views
            .get(id.index())
            .ok_or(RuntimeError::UnknownView(id.index()))?;
        Ok(entry.generation != id.generation()
            || entry.view.as_ref().map_or(true, LView::is_destroyed))
    }

    /// Number of views alive in the arena.
    pub fn live_view_count(&self) -> usize {
        self.views.len() - self.free_views.len()
    }

    /// Context object of a view (component instance or embedded view context).
    pub fn view_context(&self, id: ViewId) -> Result<Instance> {
        Ok(self.view(id)?.context.clone())
    }

    pub(crate) fn enter_view(&mut self, id: ViewId) -> Result<()> {
        let tview = self.view(id)?.tview.clone();
        let binding_index = tview.borrow().binding_start_index;
        let frame = LFrame {
            view: id,
            tview,
            previous_or_parent: None,
            is_parent: true,
            selected_index: None,
            binding_index,
            in_host_bindings: false,
        };
        if let Some(previous) = self.frame.replace(frame) {
            self.saved_frames.push(previous);
        }
        Ok(())
    }

    pub(crate) fn leave_view(&mut self) {
        self.frame = self.saved_frames.pop();
    }

    /// Runs `f` with `id` as the current view; the previous cursor is restored even on error.
    pub(crate) fn run_in_view<R>(
        &mut self,
        id: ViewId,
        f: impl FnOnce(&mut Self) -> Result<R>,
    ) -> Result<R> {
        self.enter_view(id)?;
        let result = f(self);
        self.leave_view();
        result
    }

    pub(crate) fn frame(&self) -> Result<&LFrame> {
        self.frame
            .as_ref()
            .ok_or_else(|| RuntimeError::PhaseViolation("no view is being rendered".to_string()))
    }

    pub(crate) fn frame_mut(&mut self) -> Result<&mut LFrame> {
        self.frame
            .as_mut()
            .ok_or_else(|| RuntimeError::PhaseViolation("no view is being rendered".to_string()))
    }

    pub fn current_view(&self) -> Result<ViewId> {
        Ok(self.frame()?.view)
    }

    pub(crate) fn current_tview(&self) -> Result<TViewRef> {
        Ok(self.frame()?.tview.clone())
    }

    pub(crate) fn lview(&self) -> Result<&LView> {
        let id = self.current_view()?;
        self.view(id)
    }

    pub(crate) fn lview_mut(&mut self) -> Result<&mut LView> {
        let id = self.current_view()?;
        self.view_mut(id)
    }

    /// Copy of the node at `index` of a view's template.
    pub(crate) fn tnode(&self, view: ViewId, index: usize) -> Result<TNode> {
        let tview = self.view(view)?.tview.clone();
        let tview = tview.borrow();
        Ok(tview.node(index)?.clone())
    }

    /// Closest component (or root) view enclosing `view`, following embedded view declarations.
    pub(crate) fn find_component_view(&self, mut view: ViewId) -> Result<ViewId> {
        loop {
            let lview = self.view(view)?;
            let view_type = lview.tview.borrow().view_type;
            match (view_type, lview.declaration) {
                (TViewType::Embedded, Some((declaration, _))) => view = declaration,
                _ => return Ok(view),
            }
        }
    }

    pub(crate) fn register_native(&mut self, native: RNode, view: ViewId, index: usize) -> Result<()> {
        self.view_mut(view)?.natives.push(native);
        self.node_locations.insert(native, (view, index));
        Ok(())
    }

    /// View and slot that created `native`.
    pub fn locate(&self, native: RNode) -> Option<(ViewId, usize)> {
        self.node_locations.get(&native).copied()
    }

    /// Drops the locations of natives created by `view`.
    pub(crate) fn forget_natives(&mut self, view: ViewId) -> Result<()> {
        let natives = std::mem::take(&mut self.view_mut(view)?.natives);
        for native in natives {
            if matches!(self.node_locations.get(&native), Some((owner, _)) if *owner == view) {
                self.node_locations.remove(&native);
            }
        }
        Ok(())
    }
}
