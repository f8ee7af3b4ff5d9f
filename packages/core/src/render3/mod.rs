//! Ivy-style rendering runtime
//!
//! Templates are plain closures that call instructions on a [`RenderContext`]. In creation mode
//! they build the shared `TView` (first pass only) and the view's natives; in update mode they
//! diff bindings and write only what changed.

pub mod component;
pub mod di;
pub mod headless;
mod hooks;
pub mod i18n;
mod instructions;
pub mod interfaces;
mod node_manipulation;
pub mod node_selector_matcher;
pub mod project;
pub mod state;
pub mod styling;
pub mod view;

pub use component::{ComponentRef, CreateComponentOptions};
pub use di::{Injector, StaticInjector};
pub use headless::HeadlessDocument;
pub use interfaces::definition::{
    ComponentTemplate, DirectiveDef, DirectiveDefRef, LifecycleHooks, Provider,
};
pub use interfaces::renderer::{EventHandler, ListenTarget, RNode, Renderer, RendererEvent};
pub use interfaces::view::{Instance, RenderFlags, TemplateFn, ViewId};
pub use state::RenderContext;
pub use view::{EmbeddedViewFactory, ViewContainerRef};
