//! Element, text and `<ng-container>` instructions

use serde_json::Value;
use tracing::debug;

use super::allocate_expando;
use crate::error::{Result, RuntimeError};
use crate::render3::di::register_node_injectables;
use crate::render3::hooks::{register_post_order_hooks, register_pre_order_hooks};
use crate::render3::interfaces::definition::DirectiveDefRef;
use crate::render3::interfaces::node::{TAttributes, TNodeType};
use crate::render3::interfaces::view::{
    HostBindingEntry, LSlot, RenderFlags, ViewId, ViewParent,
};
use crate::render3::state::RenderContext;
use crate::util::stringify;

/// Splits a `:svg:rect` style name into its namespace and local name.
fn split_namespace(name: &str) -> (Option<&str>, &str) {
    if let Some(rest) = name.strip_prefix(':') {
        if let Some((namespace, local)) = rest.split_once(':') {
            return (Some(namespace), local);
        }
    }
    (None, name)
}

fn static_attributes(attrs: &[(&str, &str)]) -> Option<TAttributes> {
    if attrs.is_empty() {
        None
    } else {
        Some(TAttributes::from_pairs(attrs))
    }
}

impl RenderContext {
    /// Creates an element and makes it the parent of the following nodes.
    pub fn element_start(&mut self, index: usize, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.element_start_with(index, name, attrs, &[])
    }

    /// Creates an element carrying `directives` (at most one component).
    pub fn element_start_with(
        &mut self,
        index: usize,
        name: &str,
        attrs: &[(&str, &str)],
        directives: &[DirectiveDefRef],
    ) -> Result<()> {
        let view = self.current_view()?;
        self.get_or_create_tnode(index, TNodeType::Element, Some(name), static_attributes(attrs))?;
        self.register_directives(index, directives)?;

        let tnode = self.tnode(view, index)?;
        let renderer = self.renderer();
        let (namespace, local_name) = split_namespace(name);
        let native = renderer.create_element(local_name, namespace);
        if let Some(attrs) = &tnode.attrs {
            for (attr_name, attr_value) in attrs.plain() {
                let (attr_namespace, attr_local) = split_namespace(attr_name);
                renderer.set_attribute(native, attr_local, attr_value, attr_namespace);
            }
        }
        if let Some(classes) = &tnode.classes {
            renderer.set_attribute(native, "class", classes, None);
        }
        if let Some(styles) = &tnode.styles {
            renderer.set_attribute(native, "style", styles, None);
        }

        self.view_mut(view)?.set_slot(index, LSlot::Native(native));
        self.register_native(native, view, index)?;
        self.append_child(view, tnode.parent, native)?;

        if tnode.has_directives() {
            self.instantiate_directives(view, index)?;
        }
        Ok(())
    }

    pub fn element_end(&mut self) -> Result<()> {
        let index = self.close_parent_node()?;
        let tview = self.current_tview()?;
        let mut tview = tview.borrow_mut();
        if tview.first_create_pass {
            register_post_order_hooks(&mut tview, index)?;
        }
        Ok(())
    }

    /// `element_start` immediately followed by `element_end`.
    pub fn element(&mut self, index: usize, name: &str, attrs: &[(&str, &str)]) -> Result<()> {
        self.element_start(index, name, attrs)?;
        self.element_end()
    }

    /// Creates a logical container: a comment node whose children are rendered before it.
    pub fn element_container_start(&mut self, index: usize, attrs: &[(&str, &str)]) -> Result<()> {
        let view = self.current_view()?;
        self.get_or_create_tnode(
            index,
            TNodeType::ElementContainer,
            Some("ng-container"),
            static_attributes(attrs),
        )?;
        let parent = self.tnode(view, index)?.parent;
        let comment = self
            .renderer()
            .create_comment(self.config().element_container_comment());
        self.view_mut(view)?.set_slot(index, LSlot::Native(comment));
        self.register_native(comment, view, index)?;
        self.append_child(view, parent, comment)?;
        Ok(())
    }

    pub fn element_container_end(&mut self) -> Result<()> {
        self.element_end()
    }

    pub fn text(&mut self, index: usize, value: &str) -> Result<()> {
        let view = self.current_view()?;
        self.get_or_create_tnode(index, TNodeType::Text, None, None)?;
        let parent = self.tnode(view, index)?.parent;
        let native = self.renderer().create_text(value);
        self.view_mut(view)?.set_slot(index, LSlot::Native(native));
        self.register_native(native, view, index)?;
        self.append_child(view, parent, native)?;
        self.frame_mut()?.is_parent = false;
        Ok(())
    }

    /// Binds the content of the text node at `index`.
    pub fn text_binding(&mut self, index: usize, value: Value) -> Result<()> {
        if let Some(value) = self.bind(value)? {
            let native = self.lview()?.native(index).ok_or(RuntimeError::UnexpectedSlot {
                index,
                expected: "a text node",
            })?;
            self.renderer().set_value(native, &stringify(&value));
        }
        Ok(())
    }

    /// First pass: stores the providers and directives of the node and reserves host binding
    /// slots.
    pub(crate) fn register_directives(
        &mut self,
        index: usize,
        directives: &[DirectiveDefRef],
    ) -> Result<()> {
        let tview = self.current_tview()?;
        let mut tview = tview.borrow_mut();
        if !tview.first_create_pass || directives.is_empty() {
            return Ok(());
        }
        if directives.iter().filter(|def| def.is_component()).count() > 1 {
            return Err(RuntimeError::InvalidOperation(format!(
                "multiple components match node {}",
                index
            )));
        }
        register_node_injectables(&mut tview, index, directives)?;

        let (start, end) = {
            let tnode = tview.node(index)?;
            (tnode.directive_start, tnode.directive_end)
        };
        for directive_index in start..end {
            let Some(def) = tview.directive(directive_index).cloned() else {
                continue;
            };
            if def.host_bindings.is_some() {
                let binding_start = allocate_expando(&mut tview, def.host_vars);
                tview.host_bindings.push(HostBindingEntry {
                    directive_index,
                    element_index: index,
                    binding_start,
                });
            }
        }
        Ok(())
    }

    /// Creates the directive instances of a node, component first, along with the component's
    /// view.
    pub(crate) fn instantiate_directives(&mut self, view: ViewId, index: usize) -> Result<()> {
        self.create_node_injector_factories(view, index)?;
        let tview = self.view(view)?.tview.clone();
        let (start, end) = {
            let tview = tview.borrow();
            let tnode = tview.node(index)?;
            (tnode.directive_start, tnode.directive_end)
        };

        for directive_index in start..end {
            let def = tview.borrow().directive(directive_index).cloned().ok_or(
                RuntimeError::UnexpectedSlot {
                    index: directive_index,
                    expected: "a directive definition",
                },
            )?;
            let instance = self.get_node_injectable(view, directive_index, index)?;
            {
                let mut tview = tview.borrow_mut();
                if tview.first_create_pass {
                    register_pre_order_hooks(&mut tview, directive_index, &def);
                }
            }

            if let Some(component) = &def.component {
                let native = self.view(view)?.native(index).ok_or(RuntimeError::UnexpectedSlot {
                    index,
                    expected: "a component host element",
                })?;
                let component_view = self.create_view(
                    component.tview(),
                    instance.clone(),
                    Some(ViewParent::Component { view, host: index }),
                    None,
                );
                debug!(%view, index, component = %def.type_name, %component_view, "component view");
                self.view_mut(view)?.set_slot(
                    index,
                    LSlot::Component {
                        native,
                        view: component_view,
                    },
                );
            }

            if def.host_bindings.is_some() {
                let entry = tview
                    .borrow()
                    .host_bindings
                    .iter()
                    .find(|entry| {
                        entry.directive_index == directive_index && entry.element_index == index
                    })
                    .copied();
                if let Some(entry) = entry {
                    self.invoke_host_bindings(entry, RenderFlags::CREATE)?;
                }
            }
        }
        Ok(())
    }
}
