//! Renderer capability
//!
//! Every native mutation performed by the runtime goes through [`Renderer`]. Native nodes are
//! opaque handles; the renderer that created a handle is the only thing able to interpret it.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use bitflags::bitflags;
use serde_json::Value;

/// Opaque handle to a native node (element, text or comment).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RNode(pub u32);

impl fmt::Display for RNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

bitflags! {
    /// Flags for `set_style` / `remove_style`
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RendererStyleFlags: u8 {
        const IMPORTANT = 0b01;
        /// The style name is already dash-cased (`font-size`, not `fontSize`).
        const DASH_CASE = 0b10;
    }
}

/// Target of an event listener.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListenTarget {
    Node(RNode),
    /// `window`, `document` or `body`
    Global(String),
}

/// Event delivered to listeners.
#[derive(Debug)]
pub struct RendererEvent {
    pub name: String,
    pub target: Option<RNode>,
    pub detail: Value,
    default_prevented: Cell<bool>,
}

impl RendererEvent {
    pub fn new(name: impl Into<String>, target: Option<RNode>, detail: Value) -> Self {
        RendererEvent {
            name: name.into(),
            target,
            detail,
            default_prevented: Cell::new(false),
        }
    }

    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
    }

    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// Listener callback. Returning `false` prevents the default action.
pub type EventHandler = Rc<dyn Fn(&RendererEvent) -> bool>;

/// Removes a previously registered listener.
pub type Unlisten = Box<dyn FnOnce()>;

/// Native node operations.
///
/// Methods take `&self`: renderers are shared between every view of a render context and keep
/// their own interior state.
pub trait Renderer {
    fn create_element(&self, name: &str, namespace: Option<&str>) -> RNode;
    fn create_comment(&self, value: &str) -> RNode;
    fn create_text(&self, value: &str) -> RNode;

    fn append_child(&self, parent: RNode, new_child: RNode);
    /// Inserts `new_child` before `reference`, or appends when `reference` is `None`.
    fn insert_before(&self, parent: RNode, new_child: RNode, reference: Option<RNode>);
    fn remove_child(&self, parent: RNode, old_child: RNode);

    fn select_root_element(&self, selector: &str) -> Option<RNode>;
    fn parent_node(&self, node: RNode) -> Option<RNode>;
    fn next_sibling(&self, node: RNode) -> Option<RNode>;

    fn set_attribute(&self, el: RNode, name: &str, value: &str, namespace: Option<&str>);
    fn remove_attribute(&self, el: RNode, name: &str, namespace: Option<&str>);
    fn add_class(&self, el: RNode, name: &str);
    fn remove_class(&self, el: RNode, name: &str);
    fn set_style(&self, el: RNode, style: &str, value: &str, flags: RendererStyleFlags);
    fn remove_style(&self, el: RNode, style: &str, flags: RendererStyleFlags);
    fn set_property(&self, el: RNode, name: &str, value: &Value);
    /// Sets the text of a text or comment node.
    fn set_value(&self, node: RNode, value: &str);

    fn listen(&self, target: ListenTarget, event_name: &str, callback: EventHandler) -> Unlisten;

    /// Reads an attribute back from a live element.
    ///
    /// `None` means the renderer cannot observe attribute values; an element without the
    /// attribute reads as an empty string.
    fn get_attribute(&self, _el: RNode, _name: &str) -> Option<String> {
        None
    }
}

pub type RendererRef = Rc<dyn Renderer>;
