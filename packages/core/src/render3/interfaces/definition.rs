//! Directive and component definitions

use std::fmt;
use std::rc::Rc;

use once_cell::unsync::OnceCell;

use super::view::{Instance, RenderFlags, TView, TViewRef, TViewType, TemplateFn};
use crate::error::Result;
use crate::render3::state::RenderContext;

/// Creates an instance. The render context allows nested `directive_inject` calls.
pub type FactoryFn = Rc<dyn Fn(&mut RenderContext) -> Result<Instance>>;

pub type HostBindingsFn = Rc<dyn Fn(&mut RenderContext, RenderFlags, &Instance) -> Result<()>>;

pub type HookFn = Rc<dyn Fn(&Instance)>;

/// Optional lifecycle callbacks of a directive.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    pub on_init: Option<HookFn>,
    pub do_check: Option<HookFn>,
    pub after_content_init: Option<HookFn>,
    pub after_content_checked: Option<HookFn>,
    pub after_view_init: Option<HookFn>,
    pub after_view_checked: Option<HookFn>,
    pub on_destroy: Option<HookFn>,
}

impl LifecycleHooks {
    pub fn is_empty(&self) -> bool {
        self.on_init.is_none()
            && self.do_check.is_none()
            && self.after_content_init.is_none()
            && self.after_content_checked.is_none()
            && self.after_view_init.is_none()
            && self.after_view_checked.is_none()
            && self.on_destroy.is_none()
    }
}

/// Provider declared by a directive (`providers` / `viewProviders`).
pub struct Provider {
    pub token: String,
    pub factory: FactoryFn,
    pub multi: bool,
}

pub type ProviderRef = Rc<Provider>;

impl Provider {
    pub fn factory(
        token: impl Into<String>,
        factory: impl Fn(&mut RenderContext) -> Result<Instance> + 'static,
    ) -> ProviderRef {
        Rc::new(Provider {
            token: token.into(),
            factory: Rc::new(factory),
            multi: false,
        })
    }

    /// `useValue` provider
    pub fn value(token: impl Into<String>, value: Instance) -> ProviderRef {
        Provider::factory(token, move |_| Ok(value.clone()))
    }

    pub fn multi(
        token: impl Into<String>,
        factory: impl Fn(&mut RenderContext) -> Result<Instance> + 'static,
    ) -> ProviderRef {
        Rc::new(Provider {
            token: token.into(),
            factory: Rc::new(factory),
            multi: true,
        })
    }
}

impl fmt::Debug for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("token", &self.token)
            .field("multi", &self.multi)
            .finish()
    }
}

/// Template of a component, with its TView built on first use.
pub struct ComponentTemplate {
    pub template: TemplateFn,
    pub decls: usize,
    pub vars: usize,
    tview: OnceCell<TViewRef>,
}

impl ComponentTemplate {
    pub fn tview(&self) -> TViewRef {
        self.tview
            .get_or_init(|| {
                TView::new(
                    TViewType::Component,
                    Some(self.template.clone()),
                    self.decls,
                    self.vars,
                )
            })
            .clone()
    }
}

pub struct DirectiveDef {
    /// Also the DI token of the directive instance.
    pub type_name: String,
    pub factory: FactoryFn,
    pub host_bindings: Option<HostBindingsFn>,
    pub host_vars: usize,
    pub hooks: LifecycleHooks,
    pub providers: Vec<ProviderRef>,
    pub view_providers: Vec<ProviderRef>,
    pub component: Option<ComponentTemplate>,
}

pub type DirectiveDefRef = Rc<DirectiveDef>;

impl DirectiveDef {
    pub fn directive(
        type_name: impl Into<String>,
        factory: impl Fn(&mut RenderContext) -> Result<Instance> + 'static,
    ) -> Self {
        DirectiveDef {
            type_name: type_name.into(),
            factory: Rc::new(factory),
            host_bindings: None,
            host_vars: 0,
            hooks: LifecycleHooks::default(),
            providers: Vec::new(),
            view_providers: Vec::new(),
            component: None,
        }
    }

    pub fn component(
        type_name: impl Into<String>,
        factory: impl Fn(&mut RenderContext) -> Result<Instance> + 'static,
        template: impl Fn(&mut RenderContext, RenderFlags, &Instance) -> Result<()> + 'static,
        decls: usize,
        vars: usize,
    ) -> Self {
        let mut def = DirectiveDef::directive(type_name, factory);
        def.component = Some(ComponentTemplate {
            template: Rc::new(template),
            decls,
            vars,
            tview: OnceCell::new(),
        });
        def
    }

    pub fn with_host_bindings(
        mut self,
        host_vars: usize,
        host_bindings: impl Fn(&mut RenderContext, RenderFlags, &Instance) -> Result<()> + 'static,
    ) -> Self {
        self.host_vars = host_vars;
        self.host_bindings = Some(Rc::new(host_bindings));
        self
    }

    pub fn with_hooks(mut self, hooks: LifecycleHooks) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_providers(mut self, providers: Vec<ProviderRef>) -> Self {
        self.providers = providers;
        self
    }

    pub fn with_view_providers(mut self, view_providers: Vec<ProviderRef>) -> Self {
        self.view_providers = view_providers;
        self
    }

    pub fn is_component(&self) -> bool {
        self.component.is_some()
    }

    pub fn into_ref(self) -> DirectiveDefRef {
        Rc::new(self)
    }
}

impl fmt::Debug for DirectiveDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectiveDef")
            .field("type_name", &self.type_name)
            .field("host_vars", &self.host_vars)
            .field("is_component", &self.is_component())
            .finish()
    }
}
