//! Static node descriptors
//!
//! A [`TNode`] is built once per template position during the first creation pass and is shared
//! by every view instance of that template. Nodes form a sparse tree through `parent`, `child`
//! and `next` indices into the owning TView's data array.

use std::collections::HashMap;

use bitflags::bitflags;

use super::renderer::RNode;
use super::styling::TStylingRange;
use super::view::TViewRef;
use crate::render3::styling::style_differ::parse_style;
use crate::util::array_utils::KeyValueArray;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TNodeType {
    Element,
    Text,
    /// Anchor of a view container (`<ng-template>` or an inline container block)
    Container,
    /// `<ng-container>`: logical grouping with a comment as its only native node
    ElementContainer,
    /// `<ng-content>`
    Projection,
    View,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct TNodeFlags: u8 {
        const IS_COMPONENT = 0b0001;
        /// The node has been moved into a projection slot at least once.
        const IS_PROJECTED = 0b0010;
        /// Removed from the DOM by an i18n replay; skipped when collecting natives.
        const IS_DETACHED = 0b0100;
        const HAS_HOST_BINDINGS = 0b1000;
    }
}

/// Section markers inside a flat attribute sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeMarker {
    ProjectAs,
    Classes,
    Styles,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TAttr {
    Name(String),
    Value(String),
    Marker(AttributeMarker),
}

/// Flat static attribute sequence: plain `name, value` pairs first, then marker sections.
///
/// ```text
/// [id, "a", <ProjectAs>, "span", <Classes>, foo, bar, <Styles>, color, "red"]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TAttributes(pub Vec<TAttr>);

impl TAttributes {
    /// Builds the flat form from `(name, value)` pairs as written in a template.
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut plain = Vec::new();
        let mut project_as = None;
        let mut classes: Vec<String> = Vec::new();
        let mut styles: Vec<(String, String)> = Vec::new();

        for &(name, value) in pairs {
            match name {
                "class" => classes.extend(value.split_whitespace().map(str::to_string)),
                "style" => styles.extend(parse_style(value)),
                "ngProjectAs" => project_as = Some(value.to_string()),
                _ => {
                    plain.push(TAttr::Name(name.to_string()));
                    plain.push(TAttr::Value(value.to_string()));
                }
            }
        }

        if let Some(selector) = project_as {
            plain.push(TAttr::Marker(AttributeMarker::ProjectAs));
            plain.push(TAttr::Value(selector));
        }
        if !classes.is_empty() {
            plain.push(TAttr::Marker(AttributeMarker::Classes));
            plain.extend(classes.into_iter().map(TAttr::Name));
        }
        if !styles.is_empty() {
            plain.push(TAttr::Marker(AttributeMarker::Styles));
            for (name, value) in styles {
                plain.push(TAttr::Name(name));
                plain.push(TAttr::Value(value));
            }
        }
        TAttributes(plain)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn section(&self, marker: Option<AttributeMarker>) -> &[TAttr] {
        let start = match marker {
            None => 0,
            Some(marker) => match self
                .0
                .iter()
                .position(|attr| *attr == TAttr::Marker(marker))
            {
                Some(position) => position + 1,
                None => return &[],
            },
        };
        let rest = &self.0[start..];
        let end = rest
            .iter()
            .position(|attr| matches!(attr, TAttr::Marker(_)))
            .unwrap_or(rest.len());
        &rest[..end]
    }

    /// Plain `(name, value)` attributes.
    pub fn plain(&self) -> Vec<(&str, &str)> {
        pairs(self.section(None))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.plain()
            .into_iter()
            .find(|(attr, _)| *attr == name)
            .map(|(_, value)| value)
    }

    pub fn classes(&self) -> Vec<&str> {
        self.section(Some(AttributeMarker::Classes))
            .iter()
            .filter_map(|attr| match attr {
                TAttr::Name(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn styles(&self) -> Vec<(&str, &str)> {
        pairs(self.section(Some(AttributeMarker::Styles)))
    }

    /// `ngProjectAs` selector.
    pub fn project_as(&self) -> Option<&str> {
        self.section(Some(AttributeMarker::ProjectAs))
            .iter()
            .find_map(|attr| match attr {
                TAttr::Value(value) => Some(value.as_str()),
                _ => None,
            })
    }
}

fn pairs(section: &[TAttr]) -> Vec<(&str, &str)> {
    section
        .chunks(2)
        .filter_map(|chunk| match chunk {
            [TAttr::Name(name), TAttr::Value(value)] => Some((name.as_str(), value.as_str())),
            _ => None,
        })
        .collect()
}

/// Directive and provider ranges of a node inside the TView data.
///
/// Providers occupy `provider_start..directive_start` in three blocks: component providers,
/// component view providers, then every other directive's providers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TNodeProviderIndexes {
    pub provider_start: usize,
    pub cpt_providers_count: usize,
    pub cpt_view_providers_count: usize,
}

impl TNodeProviderIndexes {
    pub fn view_providers_start(&self) -> usize {
        self.provider_start + self.cpt_providers_count
    }

    pub fn view_providers_end(&self) -> usize {
        self.view_providers_start() + self.cpt_view_providers_count
    }
}

/// Content handed to one projection bucket of a component host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionSlot {
    /// Head of a chain of content nodes linked through `projection_next`.
    Nodes(usize),
    /// Native nodes created outside any template.
    Native(Vec<RNode>),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TProjection {
    #[default]
    None,
    /// On a projection node: the bucket it renders.
    Selector(usize),
    /// On a component host: one entry per bucket.
    Slots(Vec<Option<ProjectionSlot>>),
}

#[derive(Debug, Clone)]
pub struct TNode {
    pub node_type: TNodeType,
    pub index: usize,
    pub tag_name: Option<String>,
    pub attrs: Option<TAttributes>,
    pub flags: TNodeFlags,

    pub parent: Option<usize>,
    pub child: Option<usize>,
    pub next: Option<usize>,
    /// Next node in the same projection bucket of the parent component host.
    pub projection_next: Option<usize>,

    pub directive_start: usize,
    pub directive_end: usize,
    pub provider_indexes: TNodeProviderIndexes,

    /// Static `class` attribute, normalized to space separated tokens.
    pub classes: Option<String>,
    /// Static `style` attribute, normalized to `name: value` declarations.
    pub styles: Option<String>,
    pub static_classes: KeyValueArray<bool>,
    pub static_styles: KeyValueArray<String>,
    pub class_bindings: TStylingRange,
    pub style_bindings: TStylingRange,

    pub projection: TProjection,
    /// Template of an `<ng-template>` container.
    pub tview: Option<TViewRef>,
    /// Templates of inline embedded view blocks, by block id.
    pub inline_tviews: HashMap<usize, TViewRef>,
}

impl TNode {
    pub fn new(
        node_type: TNodeType,
        index: usize,
        tag_name: Option<&str>,
        attrs: Option<TAttributes>,
        parent: Option<usize>,
    ) -> Self {
        let mut static_classes = KeyValueArray::new();
        let mut static_styles = KeyValueArray::new();
        let mut classes = None;
        let mut styles = None;

        if let Some(attrs) = &attrs {
            let class_tokens = attrs.classes();
            if !class_tokens.is_empty() {
                for class_name in &class_tokens {
                    static_classes.set(*class_name, true);
                }
                classes = Some(class_tokens.join(" "));
            }
            let style_pairs = attrs.styles();
            if !style_pairs.is_empty() {
                for (name, value) in &style_pairs {
                    static_styles.set(*name, value.to_string());
                }
                styles = Some(
                    style_pairs
                        .iter()
                        .map(|(name, value)| format!("{}: {}", name, value))
                        .collect::<Vec<_>>()
                        .join("; "),
                );
            }
        }

        TNode {
            node_type,
            index,
            tag_name: tag_name.map(str::to_string),
            attrs,
            flags: TNodeFlags::empty(),
            parent,
            child: None,
            next: None,
            projection_next: None,
            directive_start: 0,
            directive_end: 0,
            provider_indexes: TNodeProviderIndexes::default(),
            classes,
            styles,
            static_classes,
            static_styles,
            class_bindings: TStylingRange::default(),
            style_bindings: TStylingRange::default(),
            projection: TProjection::None,
            tview: None,
            inline_tviews: HashMap::new(),
        }
    }

    pub fn is_component_host(&self) -> bool {
        self.flags.contains(TNodeFlags::IS_COMPONENT)
    }

    pub fn is_detached(&self) -> bool {
        self.flags.contains(TNodeFlags::IS_DETACHED)
    }

    pub fn has_directives(&self) -> bool {
        self.directive_end > self.directive_start
    }

    pub fn bindings(&self, is_class: bool) -> TStylingRange {
        if is_class {
            self.class_bindings
        } else {
            self.style_bindings
        }
    }

    pub fn bindings_mut(&mut self, is_class: bool) -> &mut TStylingRange {
        if is_class {
            &mut self.class_bindings
        } else {
            &mut self.style_bindings
        }
    }

    /// Static `class` or `style` text seeding concatenation.
    pub fn static_styling(&self, is_class: bool) -> &str {
        let value = if is_class { &self.classes } else { &self.styles };
        value.as_deref().unwrap_or("")
    }

    /// Whether the static `class`/`style` attribute defines `key` (any key for maps).
    pub fn has_static_styling(&self, is_class: bool, key: Option<&str>) -> bool {
        match (is_class, key) {
            (true, Some(key)) => self.static_classes.contains_key(key),
            (false, Some(key)) => self.static_styles.contains_key(key),
            (true, None) => !self.static_classes.is_empty(),
            (false, None) => !self.static_styles.is_empty(),
        }
    }
}
