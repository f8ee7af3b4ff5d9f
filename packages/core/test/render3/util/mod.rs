//! Shared fixtures for the render3 integration tests

#![allow(dead_code)]

use std::rc::Rc;

use angular_core::render3::{
    ComponentRef, CreateComponentOptions, DirectiveDef, DirectiveDefRef, HeadlessDocument,
    Instance, RNode, RenderContext, RenderFlags, Renderer,
};
use angular_core::{Result, RuntimeConfig};

/// Document with a `<div id="host">` under `body`.
pub fn document_with_host() -> (HeadlessDocument, RNode) {
    let doc = HeadlessDocument::new();
    let host = doc.create_element("div", None);
    doc.set_attribute(host, "id", "host", None);
    doc.append_child(doc.body(), host);
    (doc, host)
}

/// Instance for components and views that carry no state.
pub fn empty_context() -> Instance {
    Rc::new(())
}

/// A component rendered into `#host` of a headless document.
pub struct TemplateFixture {
    pub doc: HeadlessDocument,
    pub ctx: RenderContext,
    pub host: RNode,
    pub component: ComponentRef,
}

impl TemplateFixture {
    /// Renders `template` as the template of a stateless component.
    pub fn new(
        decls: usize,
        vars: usize,
        template: impl Fn(&mut RenderContext, RenderFlags, &Instance) -> Result<()> + 'static,
    ) -> Self {
        Self::try_new(decls, vars, template).expect("template should render")
    }

    pub fn try_new(
        decls: usize,
        vars: usize,
        template: impl Fn(&mut RenderContext, RenderFlags, &Instance) -> Result<()> + 'static,
    ) -> Result<Self> {
        let def = DirectiveDef::component(
            "TestComponent",
            |_| Ok(empty_context()),
            template,
            decls,
            vars,
        );
        Self::try_with_component(def.into_ref(), |_| {})
    }

    pub fn with_component(def: DirectiveDefRef) -> Self {
        Self::try_with_component(def, |_| {}).expect("component should render")
    }

    /// Renders `def` after `setup` has configured the render context.
    pub fn try_with_component(
        def: DirectiveDefRef,
        setup: impl FnOnce(&mut RenderContext),
    ) -> Result<Self> {
        let (doc, host) = document_with_host();
        let mut ctx = RenderContext::new(Rc::new(doc.clone()), RuntimeConfig::with_dev_mode(true));
        setup(&mut ctx);
        let component = ctx.render_component(def, "#host", CreateComponentOptions::default())?;
        Ok(TemplateFixture {
            doc,
            ctx,
            host,
            component,
        })
    }

    /// Serialized content of the host element.
    pub fn html(&self) -> String {
        self.doc.inner_html(self.host)
    }

    /// Runs change detection from the root view.
    pub fn update(&mut self) {
        self.try_update().expect("change detection should succeed");
    }

    pub fn try_update(&mut self) -> Result<()> {
        self.component.detect_changes(&mut self.ctx)
    }

    /// First element under the host matching `selector`.
    pub fn query(&self, selector: &str) -> RNode {
        self.doc
            .children(self.host)
            .into_iter()
            .find_map(|child| find_in(&self.doc, child, selector))
            .unwrap_or_else(|| panic!("no element matches {}", selector))
    }
}

fn find_in(doc: &HeadlessDocument, node: RNode, selector: &str) -> Option<RNode> {
    let matches = match selector.strip_prefix('#') {
        Some(id) => doc.attribute(node, "id").as_deref() == Some(id),
        None => doc.tag_name(node).as_deref() == Some(selector),
    };
    if matches {
        return Some(node);
    }
    doc.children(node)
        .into_iter()
        .find_map(|child| find_in(doc, child, selector))
}

/// Class names of an element in attribute order.
pub fn class_names(doc: &HeadlessDocument, element: RNode) -> Vec<String> {
    doc.attribute(element, "class")
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}
