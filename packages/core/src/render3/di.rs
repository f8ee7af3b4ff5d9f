//! Node injector
//!
//! Providers and directives declared on a node are stored in the expando of the node's TView,
//! providers first, in three blocks:
//!
//! ```text
//! provider_start
//! | component providers | component view providers | other directives' providers | directives |
//! ```
//!
//! The view instance holds a lazy [`NodeInjectorFactory`] for every entry, replaced by the
//! instance once resolved. Lookup walks from the requesting node to its ancestors, crossing into
//! the host of a component view or the declaration of an embedded view, and finally asks the
//! module injector.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use tracing::trace;

use super::interfaces::definition::{DirectiveDefRef, FactoryFn};
use super::interfaces::node::{TNodeFlags, TNodeProviderIndexes};
use super::interfaces::view::{
    Instance, LSlot, TData, TView, TViewType, ViewId, ViewParent,
};
use super::state::RenderContext;
use crate::error::{Result, RuntimeError};

/// Injector capability consulted outside the node tree.
pub trait Injector {
    fn get(&self, token: &str) -> Option<Instance>;
}

/// Map of pre-built instances, optionally chained to a parent injector.
#[derive(Default)]
pub struct StaticInjector {
    values: IndexMap<String, Instance>,
    parent: Option<Rc<dyn Injector>>,
}

impl StaticInjector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_parent(parent: Rc<dyn Injector>) -> Self {
        StaticInjector {
            values: IndexMap::new(),
            parent: Some(parent),
        }
    }

    pub fn provide(mut self, token: impl Into<String>, value: Instance) -> Self {
        self.values.insert(token.into(), value);
        self
    }
}

impl Injector for StaticInjector {
    fn get(&self, token: &str) -> Option<Instance> {
        self.values
            .get(token)
            .cloned()
            .or_else(|| self.parent.as_ref().and_then(|parent| parent.get(token)))
    }
}

/// Lazily resolved provider or directive instance.
pub struct NodeInjectorFactory {
    pub token: String,
    factory: FactoryFn,
    /// Set while the factory runs; a nested request for the same entry is a cycle.
    resolving: Cell<bool>,
}

impl NodeInjectorFactory {
    pub fn new(token: impl Into<String>, factory: FactoryFn) -> Self {
        NodeInjectorFactory {
            token: token.into(),
            factory,
            resolving: Cell::new(false),
        }
    }
}

impl fmt::Debug for NodeInjectorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeInjectorFactory")
            .field("token", &self.token)
            .field("resolving", &self.resolving.get())
            .finish()
    }
}

/// Stores the providers and directives of a node at the end of `tview`'s data, first pass only.
///
/// The component (if any) is placed first among the directives so it is instantiated first.
pub(crate) fn register_node_injectables(
    tview: &mut TView,
    tnode_index: usize,
    defs: &[DirectiveDefRef],
) -> Result<()> {
    let component = defs.iter().find(|def| def.is_component()).cloned();
    let others: Vec<DirectiveDefRef> = defs
        .iter()
        .filter(|def| !def.is_component())
        .cloned()
        .collect();

    let mut indexes = TNodeProviderIndexes {
        provider_start: tview.data.len(),
        ..Default::default()
    };
    if let Some(component) = &component {
        for provider in &component.providers {
            tview.data.push(TData::Provider {
                provider: provider.clone(),
                view_provider: false,
            });
        }
        indexes.cpt_providers_count = component.providers.len();
        for provider in &component.view_providers {
            tview.data.push(TData::Provider {
                provider: provider.clone(),
                view_provider: true,
            });
        }
        indexes.cpt_view_providers_count = component.view_providers.len();
    }
    for def in &others {
        for provider in &def.providers {
            tview.data.push(TData::Provider {
                provider: provider.clone(),
                view_provider: false,
            });
        }
    }

    let directive_start = tview.data.len();
    let ordered: Vec<DirectiveDefRef> = component.into_iter().chain(others).collect();
    let mut flags = TNodeFlags::empty();
    for def in &ordered {
        if def.is_component() {
            flags |= TNodeFlags::IS_COMPONENT;
        }
        if def.host_bindings.is_some() {
            flags |= TNodeFlags::HAS_HOST_BINDINGS;
        }
        tview.data.push(TData::Directive(def.clone()));
    }
    let directive_end = tview.data.len();

    let tnode = tview.node_mut(tnode_index)?;
    tnode.provider_indexes = indexes;
    tnode.directive_start = directive_start;
    tnode.directive_end = directive_end;
    tnode.flags |= flags;
    trace!(
        tnode_index,
        provider_start = indexes.provider_start,
        directive_start,
        directive_end,
        "registered node injectables"
    );
    Ok(())
}

impl RenderContext {
    /// Fills the view slots of a node's providers and directives with fresh factories.
    pub(crate) fn create_node_injector_factories(
        &mut self,
        view: ViewId,
        tnode_index: usize,
    ) -> Result<()> {
        let factories: Vec<(usize, NodeInjectorFactory)> = {
            let tview = self.view(view)?.tview.clone();
            let tview = tview.borrow();
            let tnode = tview.node(tnode_index)?;
            (tnode.provider_indexes.provider_start..tnode.directive_end)
                .filter_map(|index| match &tview.data[index] {
                    TData::Provider { provider, .. } => Some((
                        index,
                        NodeInjectorFactory::new(provider.token.clone(), provider.factory.clone()),
                    )),
                    TData::Directive(def) => Some((
                        index,
                        NodeInjectorFactory::new(def.type_name.clone(), def.factory.clone()),
                    )),
                    _ => None,
                })
                .collect()
        };
        let lview = self.view_mut(view)?;
        for (index, factory) in factories {
            lview.set_slot(index, LSlot::Factory(Rc::new(factory)));
        }
        Ok(())
    }

    /// Instance stored at `index` of `view`, running its factory on first access.
    pub(crate) fn get_node_injectable(
        &mut self,
        view: ViewId,
        index: usize,
        tnode_index: usize,
    ) -> Result<Instance> {
        let factory = match self.view(view)?.slots.get(index) {
            Some(LSlot::Instance(instance)) => return Ok(instance.clone()),
            Some(LSlot::Factory(factory)) => factory.clone(),
            _ => {
                return Err(RuntimeError::UnexpectedSlot {
                    index,
                    expected: "an injectable",
                })
            }
        };
        if factory.resolving.get() {
            return Err(RuntimeError::CircularDependency {
                token: factory.token.clone(),
            });
        }

        trace!(%view, index, token = %factory.token, "resolve injectable");
        factory.resolving.set(true);
        let saved_context = self.inject_context.replace((view, Some(tnode_index)));
        let result = (factory.factory)(self);
        self.inject_context = saved_context;
        factory.resolving.set(false);

        let instance = result?;
        self.view_mut(view)?
            .set_slot(index, LSlot::Instance(instance.clone()));
        Ok(instance)
    }

    /// Resolves `token` from the current node injector.
    ///
    /// Inside a factory the lookup starts at the node declaring that factory; otherwise at the
    /// node most recently created or selected in the current view.
    pub fn directive_inject(&mut self, token: &str) -> Result<Instance> {
        let (mut view, mut tnode) = match self.inject_context {
            Some(context) => context,
            None => {
                let frame = self.frame()?;
                (frame.view, frame.previous_or_parent)
            }
        };
        let origin_component_view = self.find_component_view(view)?;
        let origin_is_root =
            self.view(origin_component_view)?.tview.borrow().view_type == TViewType::Root;

        loop {
            if let Some(index) = tnode {
                let can_access_view_providers = origin_is_root
                    || self.find_component_view(view)? != origin_component_view;
                if let Some(instance) =
                    self.search_tokens_on_node(view, index, token, can_access_view_providers)?
                {
                    return Ok(instance);
                }
                tnode = self.tnode_parent(view, index)?;
                continue;
            }

            let lview = self.view(view)?;
            match (lview.parent, lview.declaration) {
                (Some(ViewParent::Component { view: parent, host }), _) => {
                    view = parent;
                    tnode = Some(host);
                }
                (_, Some((declaration, container))) => {
                    view = declaration;
                    tnode = Some(container);
                }
                _ => break,
            }
        }

        self.module_injector()
            .and_then(|injector| injector.get(token))
            .ok_or_else(|| RuntimeError::NoProvider {
                token: token.to_string(),
            })
    }

    fn tnode_parent(&self, view: ViewId, index: usize) -> Result<Option<usize>> {
        let tview = self.view(view)?.tview.clone();
        let parent = tview.borrow().node(index)?.parent;
        Ok(parent)
    }

    fn search_tokens_on_node(
        &mut self,
        view: ViewId,
        tnode_index: usize,
        token: &str,
        can_access_view_providers: bool,
    ) -> Result<Option<Instance>> {
        struct Entry {
            index: usize,
            multi: bool,
            view_provider: bool,
        }

        let (providers, directives) = {
            let tview = self.view(view)?.tview.clone();
            let tview = tview.borrow();
            let tnode = tview.node(tnode_index)?;
            let providers: Vec<Entry> = (tnode.provider_indexes.provider_start
                ..tnode.directive_start)
                .filter_map(|index| match &tview.data[index] {
                    TData::Provider {
                        provider,
                        view_provider,
                    } if provider.token == token => Some(Entry {
                        index,
                        multi: provider.multi,
                        view_provider: *view_provider,
                    }),
                    _ => None,
                })
                .collect();
            let directives: Vec<usize> = (tnode.directive_start..tnode.directive_end)
                .filter(|index| {
                    matches!(&tview.data[*index], TData::Directive(def) if def.type_name == token)
                })
                .collect();
            (providers, directives)
        };

        let visible = |entry: &&Entry| !entry.view_provider || can_access_view_providers;

        if providers.iter().any(|entry| entry.multi) {
            // Providers first, then view providers when visible from the requesting node.
            let ordered: Vec<usize> = providers
                .iter()
                .filter(|entry| entry.multi && !entry.view_provider)
                .chain(
                    providers
                        .iter()
                        .filter(|entry| entry.multi && entry.view_provider)
                        .filter(visible),
                )
                .map(|entry| entry.index)
                .collect();
            if !ordered.is_empty() {
                let mut values = Vec::with_capacity(ordered.len());
                for index in ordered {
                    values.push(self.get_node_injectable(view, index, tnode_index)?);
                }
                return Ok(Some(Rc::new(values) as Instance));
            }
        }

        if let Some(entry) = providers
            .iter()
            .rev()
            .filter(|entry| !entry.multi)
            .find(visible)
        {
            return self
                .get_node_injectable(view, entry.index, tnode_index)
                .map(Some);
        }

        match directives.first() {
            Some(index) => self.get_node_injectable(view, *index, tnode_index).map(Some),
            None => Ok(None),
        }
    }
}
