//! Headless renderer
//!
//! In-memory document implementing [`Renderer`]. Used by tests and server-side rendering; its
//! serialization includes comment nodes so container anchors are visible.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use serde_json::Value;

use super::interfaces::renderer::{
    EventHandler, ListenTarget, RNode, Renderer, RendererEvent, RendererStyleFlags, Unlisten,
};
use super::styling::class_differ::split_class_list;
use super::styling::style_differ::{hyphenate, parse_style, stringify_style};

#[derive(Debug, Clone)]
enum NodeKind {
    Element {
        tag: String,
        namespace: Option<String>,
        attributes: IndexMap<String, String>,
        properties: IndexMap<String, Value>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    parent: Option<RNode>,
    children: Vec<RNode>,
}

struct ListenerEntry {
    id: u64,
    target: ListenTarget,
    event_name: String,
    handler: EventHandler,
}

struct DocumentInner {
    nodes: Vec<NodeData>,
    body: RNode,
    listeners: Vec<ListenerEntry>,
    next_listener_id: u64,
}

impl DocumentInner {
    fn push(&mut self, kind: NodeKind) -> RNode {
        let node = RNode(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            parent: None,
            children: Vec::new(),
        });
        node
    }

    fn node(&self, node: RNode) -> Option<&NodeData> {
        self.nodes.get(node.0 as usize)
    }

    fn node_mut(&mut self, node: RNode) -> Option<&mut NodeData> {
        self.nodes.get_mut(node.0 as usize)
    }

    fn attributes_mut(&mut self, node: RNode) -> Option<&mut IndexMap<String, String>> {
        match self.node_mut(node).map(|data| &mut data.kind) {
            Some(NodeKind::Element { attributes, .. }) => Some(attributes),
            _ => None,
        }
    }

    fn detach(&mut self, child: RNode) {
        let parent = self.node(child).and_then(|data| data.parent);
        if let Some(parent) = parent {
            if let Some(parent_data) = self.node_mut(parent) {
                parent_data.children.retain(|candidate| *candidate != child);
            }
        }
        if let Some(child_data) = self.node_mut(child) {
            child_data.parent = None;
        }
    }

    fn insert(&mut self, parent: RNode, child: RNode, reference: Option<RNode>) {
        if self.node(parent).is_none() || self.node(child).is_none() || parent == child {
            return;
        }
        self.detach(child);
        if let Some(parent_data) = self.node_mut(parent) {
            let position = reference
                .and_then(|reference| parent_data.children.iter().position(|c| *c == reference))
                .unwrap_or(parent_data.children.len());
            parent_data.children.insert(position, child);
        }
        if let Some(child_data) = self.node_mut(child) {
            child_data.parent = Some(parent);
        }
    }

    fn update_attribute(&mut self, el: RNode, name: &str, update: impl FnOnce(&str) -> String) {
        if let Some(attributes) = self.attributes_mut(el) {
            let current = attributes.get(name).cloned().unwrap_or_default();
            let updated = update(&current);
            if updated.is_empty() {
                attributes.shift_remove(name);
            } else {
                attributes.insert(name.to_string(), updated);
            }
        }
    }

    fn matches(&self, node: RNode, selector: &str) -> bool {
        let Some(NodeKind::Element {
            tag, attributes, ..
        }) = self.node(node).map(|data| &data.kind)
        else {
            return false;
        };
        if let Some(id) = selector.strip_prefix('#') {
            attributes.get("id").map(String::as_str) == Some(id)
        } else if let Some(class_name) = selector.strip_prefix('.') {
            attributes
                .get("class")
                .map(|classes| split_class_list(classes).any(|token| token == class_name))
                .unwrap_or(false)
        } else {
            tag.eq_ignore_ascii_case(selector)
        }
    }

    fn find(&self, root: RNode, selector: &str) -> Option<RNode> {
        if self.matches(root, selector) {
            return Some(root);
        }
        let children = self.node(root).map(|data| data.children.clone())?;
        children
            .into_iter()
            .find_map(|child| self.find(child, selector))
    }

    fn serialize(&self, node: RNode, out: &mut String) {
        let Some(data) = self.node(node) else {
            return;
        };
        match &data.kind {
            NodeKind::Text(text) => out.push_str(text),
            NodeKind::Comment(text) => {
                out.push_str("<!--");
                out.push_str(text);
                out.push_str("-->");
            }
            NodeKind::Element {
                tag, attributes, ..
            } => {
                out.push('<');
                out.push_str(tag);
                for (name, value) in attributes {
                    out.push(' ');
                    out.push_str(name);
                    out.push_str("=\"");
                    out.push_str(value);
                    out.push('"');
                }
                out.push('>');
                for child in &data.children {
                    self.serialize(*child, out);
                }
                out.push_str("</");
                out.push_str(tag);
                out.push('>');
            }
        }
    }
}

/// Shared handle to an in-memory document. Clones refer to the same document.
#[derive(Clone)]
pub struct HeadlessDocument {
    inner: Rc<RefCell<DocumentInner>>,
}

impl Default for HeadlessDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessDocument {
    pub fn new() -> Self {
        let mut inner = DocumentInner {
            nodes: Vec::new(),
            body: RNode(0),
            listeners: Vec::new(),
            next_listener_id: 0,
        };
        inner.body = inner.push(NodeKind::Element {
            tag: "body".to_string(),
            namespace: None,
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
        });
        HeadlessDocument {
            inner: Rc::new(RefCell::new(inner)),
        }
    }

    pub fn body(&self) -> RNode {
        self.inner.borrow().body
    }

    /// First element under `body` matching `tag`, `#id` or `.class`.
    pub fn query_selector(&self, selector: &str) -> Option<RNode> {
        let inner = self.inner.borrow();
        inner.find(inner.body, selector.trim())
    }

    pub fn outer_html(&self, node: RNode) -> String {
        let mut out = String::new();
        self.inner.borrow().serialize(node, &mut out);
        out
    }

    pub fn inner_html(&self, node: RNode) -> String {
        let inner = self.inner.borrow();
        let mut out = String::new();
        if let Some(data) = inner.node(node) {
            for child in &data.children {
                inner.serialize(*child, &mut out);
            }
        }
        out
    }

    pub fn children(&self, node: RNode) -> Vec<RNode> {
        self.inner
            .borrow()
            .node(node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    pub fn tag_name(&self, node: RNode) -> Option<String> {
        match self.inner.borrow().node(node).map(|data| &data.kind) {
            Some(NodeKind::Element { tag, .. }) => Some(tag.clone()),
            _ => None,
        }
    }

    pub fn namespace(&self, node: RNode) -> Option<String> {
        match self.inner.borrow().node(node).map(|data| &data.kind) {
            Some(NodeKind::Element { namespace, .. }) => namespace.clone(),
            _ => None,
        }
    }

    /// Text of a text or comment node, or the concatenated text of an element's subtree.
    pub fn text_content(&self, node: RNode) -> String {
        let inner = self.inner.borrow();
        let mut out = String::new();
        collect_text(&inner, node, &mut out);
        out
    }

    pub fn attribute(&self, node: RNode, name: &str) -> Option<String> {
        match self.inner.borrow().node(node).map(|data| &data.kind) {
            Some(NodeKind::Element { attributes, .. }) => attributes.get(name).cloned(),
            _ => None,
        }
    }

    pub fn property(&self, node: RNode, name: &str) -> Option<Value> {
        match self.inner.borrow().node(node).map(|data| &data.kind) {
            Some(NodeKind::Element { properties, .. }) => properties.get(name).cloned(),
            _ => None,
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.borrow().listeners.len()
    }

    /// Delivers an event to the listeners registered on `target`.
    ///
    /// Returns `false` when a listener prevented the default action.
    pub fn dispatch_event(&self, target: RNode, event_name: &str, detail: Value) -> bool {
        self.dispatch(&ListenTarget::Node(target), Some(target), event_name, detail)
    }

    pub fn dispatch_global_event(&self, target: &str, event_name: &str, detail: Value) -> bool {
        self.dispatch(&ListenTarget::Global(target.to_string()), None, event_name, detail)
    }

    fn dispatch(
        &self,
        target: &ListenTarget,
        node: Option<RNode>,
        event_name: &str,
        detail: Value,
    ) -> bool {
        let handlers: Vec<EventHandler> = self
            .inner
            .borrow()
            .listeners
            .iter()
            .filter(|entry| entry.target == *target && entry.event_name == event_name)
            .map(|entry| entry.handler.clone())
            .collect();
        let event = RendererEvent::new(event_name, node, detail);
        for handler in handlers {
            if !handler(&event) {
                event.prevent_default();
            }
        }
        !event.default_prevented()
    }
}

fn collect_text(inner: &DocumentInner, node: RNode, out: &mut String) {
    if let Some(data) = inner.node(node) {
        match &data.kind {
            NodeKind::Text(text) | NodeKind::Comment(text) => out.push_str(text),
            NodeKind::Element { .. } => {
                for child in &data.children {
                    if let Some(NodeKind::Text(text)) = inner.node(*child).map(|c| &c.kind) {
                        out.push_str(text);
                    } else if matches!(
                        inner.node(*child).map(|c| &c.kind),
                        Some(NodeKind::Element { .. })
                    ) {
                        collect_text(inner, *child, out);
                    }
                }
            }
        }
    }
}

fn style_name(style: &str, flags: RendererStyleFlags) -> String {
    if flags.contains(RendererStyleFlags::DASH_CASE) {
        style.to_string()
    } else {
        hyphenate(style)
    }
}

impl Renderer for HeadlessDocument {
    fn create_element(&self, name: &str, namespace: Option<&str>) -> RNode {
        self.inner.borrow_mut().push(NodeKind::Element {
            tag: name.to_string(),
            namespace: namespace.map(str::to_string),
            attributes: IndexMap::new(),
            properties: IndexMap::new(),
        })
    }

    fn create_comment(&self, value: &str) -> RNode {
        self.inner
            .borrow_mut()
            .push(NodeKind::Comment(value.to_string()))
    }

    fn create_text(&self, value: &str) -> RNode {
        self.inner.borrow_mut().push(NodeKind::Text(value.to_string()))
    }

    fn append_child(&self, parent: RNode, new_child: RNode) {
        self.inner.borrow_mut().insert(parent, new_child, None);
    }

    fn insert_before(&self, parent: RNode, new_child: RNode, reference: Option<RNode>) {
        self.inner
            .borrow_mut()
            .insert(parent, new_child, reference);
    }

    fn remove_child(&self, parent: RNode, old_child: RNode) {
        let mut inner = self.inner.borrow_mut();
        if inner.node(old_child).and_then(|data| data.parent) == Some(parent) {
            inner.detach(old_child);
        }
    }

    fn select_root_element(&self, selector: &str) -> Option<RNode> {
        self.query_selector(selector)
    }

    fn parent_node(&self, node: RNode) -> Option<RNode> {
        self.inner.borrow().node(node).and_then(|data| data.parent)
    }

    fn next_sibling(&self, node: RNode) -> Option<RNode> {
        let inner = self.inner.borrow();
        let parent = inner.node(node).and_then(|data| data.parent)?;
        let siblings = &inner.node(parent)?.children;
        let position = siblings.iter().position(|sibling| *sibling == node)?;
        siblings.get(position + 1).copied()
    }

    fn set_attribute(&self, el: RNode, name: &str, value: &str, _namespace: Option<&str>) {
        if let Some(attributes) = self.inner.borrow_mut().attributes_mut(el) {
            attributes.insert(name.to_string(), value.to_string());
        }
    }

    fn remove_attribute(&self, el: RNode, name: &str, _namespace: Option<&str>) {
        if let Some(attributes) = self.inner.borrow_mut().attributes_mut(el) {
            attributes.shift_remove(name);
        }
    }

    fn add_class(&self, el: RNode, name: &str) {
        self.inner
            .borrow_mut()
            .update_attribute(el, "class", |current| {
                let mut tokens: Vec<&str> = split_class_list(current).collect();
                if !tokens.contains(&name) {
                    tokens.push(name);
                }
                tokens.join(" ")
            });
    }

    fn remove_class(&self, el: RNode, name: &str) {
        self.inner
            .borrow_mut()
            .update_attribute(el, "class", |current| {
                split_class_list(current)
                    .filter(|token| *token != name)
                    .collect::<Vec<_>>()
                    .join(" ")
            });
    }

    fn set_style(&self, el: RNode, style: &str, value: &str, flags: RendererStyleFlags) {
        let name = style_name(style, flags);
        let value = if flags.contains(RendererStyleFlags::IMPORTANT) {
            format!("{} !important", value)
        } else {
            value.to_string()
        };
        self.inner
            .borrow_mut()
            .update_attribute(el, "style", |current| {
                let mut declarations = parse_style(current);
                match declarations.iter_mut().find(|(prop, _)| *prop == name) {
                    Some(declaration) => declaration.1 = value,
                    None => declarations.push((name, value)),
                }
                stringify_style(declarations.iter().map(|(p, v)| (p.as_str(), v.as_str())))
            });
    }

    fn remove_style(&self, el: RNode, style: &str, flags: RendererStyleFlags) {
        let name = style_name(style, flags);
        self.inner
            .borrow_mut()
            .update_attribute(el, "style", |current| {
                let declarations = parse_style(current);
                stringify_style(
                    declarations
                        .iter()
                        .filter(|(prop, _)| *prop != name)
                        .map(|(p, v)| (p.as_str(), v.as_str())),
                )
            });
    }

    fn set_property(&self, el: RNode, name: &str, value: &Value) {
        let mut inner = self.inner.borrow_mut();
        if let Some(NodeKind::Element { properties, .. }) =
            inner.node_mut(el).map(|data| &mut data.kind)
        {
            properties.insert(name.to_string(), value.clone());
        }
    }

    fn set_value(&self, node: RNode, value: &str) {
        let mut inner = self.inner.borrow_mut();
        match inner.node_mut(node).map(|data| &mut data.kind) {
            Some(NodeKind::Text(text)) | Some(NodeKind::Comment(text)) => {
                *text = value.to_string();
            }
            _ => {}
        }
    }

    fn listen(&self, target: ListenTarget, event_name: &str, callback: EventHandler) -> Unlisten {
        let id = {
            let mut inner = self.inner.borrow_mut();
            let id = inner.next_listener_id;
            inner.next_listener_id += 1;
            inner.listeners.push(ListenerEntry {
                id,
                target,
                event_name: event_name.to_string(),
                handler: callback,
            });
            id
        };
        let document: Weak<RefCell<DocumentInner>> = Rc::downgrade(&self.inner);
        Box::new(move || {
            if let Some(document) = document.upgrade() {
                document
                    .borrow_mut()
                    .listeners
                    .retain(|entry| entry.id != id);
            }
        })
    }

    fn get_attribute(&self, el: RNode, name: &str) -> Option<String> {
        match self.inner.borrow().node(el).map(|data| &data.kind) {
            Some(NodeKind::Element { attributes, .. }) => {
                Some(attributes.get(name).cloned().unwrap_or_default())
            }
            _ => None,
        }
    }
}
