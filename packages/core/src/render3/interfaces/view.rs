//! Template views and view instances
//!
//! [`TView`] is the static, shared half of a template: its node graph, binding metadata and hook
//! queues. [`LView`] is one instance of it. Slot `i` of every `LView` corresponds to entry `i` of
//! its TView's `data`:
//!
//! ```text
//! 0 .. decls                     nodes (TData::Node)             natives, containers, components
//! decls .. decls + vars          template bindings               bound values
//! decls + vars ..                expando                         providers, directives, host
//!                                                                binding values, i18n text nodes
//! ```

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use serde_json::Value;

use super::container::LContainer;
use super::definition::{DirectiveDefRef, HookFn, ProviderRef};
use super::node::TNode;
use super::renderer::{RNode, RendererRef, Unlisten};
use super::styling::{TStylingKey, TStylingLink};
use crate::error::{Result, RuntimeError};
use crate::render3::di::NodeInjectorFactory;
use crate::render3::state::RenderContext;

/// Component instance or embedded view context.
pub type Instance = Rc<dyn Any>;

pub type TemplateFn = Rc<dyn Fn(&mut RenderContext, RenderFlags, &Instance) -> Result<()>>;

bitflags! {
    /// Which half of a template function to run.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u8 {
        const CREATE = 0b01;
        const UPDATE = 0b10;
    }
}

/// Handle on an `LView` inside its render context.
///
/// Arena slots are reused once a view is destroyed; the generation tells a stale handle apart
/// from the view now occupying its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewId {
    index: usize,
    generation: u32,
}

impl ViewId {
    pub(crate) fn new(index: usize, generation: u32) -> Self {
        ViewId { index, generation }
    }

    /// Arena slot of the view.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "view#{}", self.index)
        } else {
            write!(f, "view#{}.{}", self.index, self.generation)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TViewType {
    /// Bootstrap view holding a single host element.
    Root,
    Component,
    Embedded,
}

/// Static entry of a TView.
#[derive(Debug, Clone)]
pub enum TData {
    Empty,
    Node(TNode),
    Styling {
        key: TStylingKey,
        link: TStylingLink,
    },
    Directive(DirectiveDefRef),
    Provider {
        provider: ProviderRef,
        view_provider: bool,
    },
}

/// Lifecycle hook registered for the directive instance stored at `directive_index`.
#[derive(Clone)]
pub struct HookEntry {
    pub directive_index: usize,
    pub hook: HookFn,
    /// Init-style hooks run on the first refresh of each view only.
    pub once: bool,
}

impl fmt::Debug for HookEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookEntry")
            .field("directive_index", &self.directive_index)
            .field("once", &self.once)
            .finish()
    }
}

/// Host binding function of a directive, with its reserved binding slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostBindingEntry {
    pub directive_index: usize,
    pub element_index: usize,
    pub binding_start: usize,
}

pub type TViewRef = Rc<RefCell<TView>>;

pub struct TView {
    pub view_type: TViewType,
    pub template: Option<TemplateFn>,
    pub data: Vec<TData>,
    pub decls: usize,
    pub vars: usize,
    pub binding_start_index: usize,
    pub expando_start_index: usize,
    pub first_create_pass: bool,
    pub first_update_pass: bool,
    /// First root-level node
    pub first_child: Option<usize>,

    pub pre_order_hooks: Vec<HookEntry>,
    pub content_hooks: Vec<HookEntry>,
    pub view_hooks: Vec<HookEntry>,
    pub destroy_hooks: Vec<HookEntry>,
    pub host_bindings: Vec<HostBindingEntry>,
    /// Text nodes created by i18n replays, in creation order.
    pub i18n_text_nodes: Vec<usize>,
}

impl TView {
    pub fn new(
        view_type: TViewType,
        template: Option<TemplateFn>,
        decls: usize,
        vars: usize,
    ) -> TViewRef {
        let mut data = Vec::with_capacity(decls + vars);
        data.resize_with(decls + vars, || TData::Empty);
        Rc::new(RefCell::new(TView {
            view_type,
            template,
            data,
            decls,
            vars,
            binding_start_index: decls,
            expando_start_index: decls + vars,
            first_create_pass: true,
            first_update_pass: true,
            first_child: None,
            pre_order_hooks: Vec::new(),
            content_hooks: Vec::new(),
            view_hooks: Vec::new(),
            destroy_hooks: Vec::new(),
            host_bindings: Vec::new(),
            i18n_text_nodes: Vec::new(),
        }))
    }

    pub fn node(&self, index: usize) -> Result<&TNode> {
        match self.data.get(index) {
            Some(TData::Node(tnode)) => Ok(tnode),
            _ => Err(RuntimeError::MissingTNode(index)),
        }
    }

    pub fn node_mut(&mut self, index: usize) -> Result<&mut TNode> {
        match self.data.get_mut(index) {
            Some(TData::Node(tnode)) => Ok(tnode),
            _ => Err(RuntimeError::MissingTNode(index)),
        }
    }

    pub fn has_node(&self, index: usize) -> bool {
        matches!(self.data.get(index), Some(TData::Node(_)))
    }

    pub fn directive(&self, index: usize) -> Option<&DirectiveDefRef> {
        match self.data.get(index) {
            Some(TData::Directive(def)) => Some(def),
            _ => None,
        }
    }

    /// Root-level nodes in sibling order.
    pub fn root_nodes(&self) -> Vec<usize> {
        self.sibling_chain(self.first_child)
    }

    pub fn child_nodes(&self, parent: usize) -> Vec<usize> {
        let first = self.node(parent).ok().and_then(|tnode| tnode.child);
        self.sibling_chain(first)
    }

    fn sibling_chain(&self, mut cursor: Option<usize>) -> Vec<usize> {
        let mut chain = Vec::new();
        while let Some(index) = cursor {
            chain.push(index);
            cursor = self.node(index).ok().and_then(|tnode| tnode.next);
        }
        chain
    }
}

impl fmt::Debug for TView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TView")
            .field("view_type", &self.view_type)
            .field("decls", &self.decls)
            .field("vars", &self.vars)
            .field("data_len", &self.data.len())
            .field("first_create_pass", &self.first_create_pass)
            .field("first_update_pass", &self.first_update_pass)
            .finish()
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LViewFlags: u8 {
        /// Creation pass not yet completed.
        const CREATION_MODE = 0b0001;
        /// No refresh has completed yet; init hooks are due.
        const FIRST_LVIEW_PASS = 0b0010;
        const ATTACHED = 0b0100;
        const DESTROYED = 0b1000;
    }
}

/// Where a view is attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewParent {
    /// Component view of the host node `host` in `view`.
    Component { view: ViewId, host: usize },
    /// Embedded view inside the container at slot `index` of `view`.
    Container { view: ViewId, index: usize },
}

/// Instance slot.
#[derive(Clone)]
pub enum LSlot {
    Empty,
    Native(RNode),
    Container(LContainer),
    Component { native: RNode, view: ViewId },
    Value(Value),
    Instance(Instance),
    Factory(Rc<NodeInjectorFactory>),
}

impl LSlot {
    /// Native node stored in (or promoted from) this slot.
    pub fn native(&self) -> Option<RNode> {
        match self {
            LSlot::Native(native) => Some(*native),
            LSlot::Component { native, .. } => Some(*native),
            LSlot::Container(container) => Some(container.host_native.unwrap_or(container.anchor)),
            _ => None,
        }
    }

    pub fn value(&self) -> Option<&Value> {
        match self {
            LSlot::Value(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Debug for LSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LSlot::Empty => write!(f, "Empty"),
            LSlot::Native(native) => write!(f, "Native({})", native),
            LSlot::Container(container) => write!(f, "Container({:?})", container.views),
            LSlot::Component { native, view } => write!(f, "Component({}, {})", native, view),
            LSlot::Value(value) => write!(f, "Value({})", value),
            LSlot::Instance(_) => write!(f, "Instance"),
            LSlot::Factory(factory) => write!(f, "Factory({})", factory.token),
        }
    }
}

/// Dirty styling binding waiting for a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StylingDirty {
    pub node: usize,
    pub is_class: bool,
    pub binding_index: usize,
}

/// One instance of a TView.
pub struct LView {
    pub id: ViewId,
    pub tview: TViewRef,
    pub flags: LViewFlags,
    pub parent: Option<ViewParent>,
    /// Declaring view and container slot, for embedded views.
    pub declaration: Option<(ViewId, usize)>,
    pub renderer: RendererRef,
    pub context: Instance,
    pub slots: Vec<LSlot>,
    pub cleanup: Vec<Unlisten>,
    /// Natives registered for this view in the render context's location map.
    pub natives: Vec<RNode>,
    /// Last `class` / `style` text written per `(node, is_class)`.
    pub styling_written: HashMap<(usize, bool), String>,
    pub styling_dirty: Vec<StylingDirty>,
    pub i18n_text_cursor: usize,
}

impl LView {
    pub fn new(
        id: ViewId,
        tview: TViewRef,
        renderer: RendererRef,
        context: Instance,
        parent: Option<ViewParent>,
        declaration: Option<(ViewId, usize)>,
    ) -> Self {
        let len = tview.borrow().data.len();
        let mut slots = Vec::with_capacity(len);
        slots.resize(len, LSlot::Empty);
        LView {
            id,
            tview,
            flags: LViewFlags::CREATION_MODE | LViewFlags::FIRST_LVIEW_PASS,
            parent,
            declaration,
            renderer,
            context,
            slots,
            cleanup: Vec::new(),
            natives: Vec::new(),
            styling_written: HashMap::new(),
            styling_dirty: Vec::new(),
            i18n_text_cursor: 0,
        }
    }

    pub fn is_destroyed(&self) -> bool {
        self.flags.contains(LViewFlags::DESTROYED)
    }

    pub fn is_creation_mode(&self) -> bool {
        self.flags.contains(LViewFlags::CREATION_MODE)
    }

    /// Grows the slot array to cover `index`.
    pub fn ensure_slot(&mut self, index: usize) {
        if self.slots.len() <= index {
            self.slots.resize(index + 1, LSlot::Empty);
        }
    }

    pub fn slot(&self, index: usize) -> Option<&LSlot> {
        self.slots.get(index)
    }

    pub fn set_slot(&mut self, index: usize, slot: LSlot) {
        self.ensure_slot(index);
        self.slots[index] = slot;
    }

    pub fn native(&self, index: usize) -> Option<RNode> {
        self.slots.get(index).and_then(LSlot::native)
    }

    pub fn container(&self, index: usize) -> Option<&LContainer> {
        match self.slots.get(index) {
            Some(LSlot::Container(container)) => Some(container),
            _ => None,
        }
    }

    pub fn container_mut(&mut self, index: usize) -> Option<&mut LContainer> {
        match self.slots.get_mut(index) {
            Some(LSlot::Container(container)) => Some(container),
            _ => None,
        }
    }

    pub fn component_view(&self, index: usize) -> Option<ViewId> {
        match self.slots.get(index) {
            Some(LSlot::Component { view, .. }) => Some(*view),
            _ => None,
        }
    }
}

impl fmt::Debug for LView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LView")
            .field("id", &self.id)
            .field("flags", &self.flags)
            .field("parent", &self.parent)
            .field("slots", &self.slots)
            .finish()
    }
}
