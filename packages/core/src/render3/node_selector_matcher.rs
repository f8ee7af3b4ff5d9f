//! Node selector matching
//!
//! Parses the CSS selectors of `<ng-content select="...">` and matches them against the static
//! shape of content nodes (tag name and static attributes).

use once_cell::sync::Lazy;
use regex::Regex;

use super::interfaces::node::{TNode, TNodeType};
use crate::error::{Result, RuntimeError};

/// Regex for parsing CSS selectors
static SELECTOR_REGEXP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(\:not\()|(([\.\#]?)[-\w]+)|(?:\[([-.\w*\\$]+)(?:=(?:"([^"]*)"|'([^']*)'|([^\]]*)))?\])|(\))|(\s*,\s*)"#).unwrap()
});

/// Match groups in the selector regex
#[derive(Debug, Clone, Copy)]
enum SelectorRegexp {
    Not = 1,
    Tag = 2,
    Prefix = 3,
    Attribute = 4,
    AttributeValueDouble = 5,
    AttributeValueSingle = 6,
    AttributeValueUnquoted = 7,
    NotEnd = 8,
    Separator = 9,
}

const WILDCARD: &str = "*";

/// One compound selector: `tag.class[attr=value]:not(...)`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CssSelector {
    pub element: Option<String>,
    pub class_names: Vec<String>,
    pub attrs: Vec<(String, String)>,
    pub not_selectors: Vec<CssSelector>,
}

impl CssSelector {
    /// Parses a comma separated selector list.
    pub fn parse(selector: &str) -> Result<Vec<CssSelector>> {
        let mut results = Vec::new();
        let mut css_selector = CssSelector::default();
        let mut in_not = false;

        for cap in SELECTOR_REGEXP.captures_iter(selector) {
            if cap.get(SelectorRegexp::Not as usize).is_some() {
                if in_not {
                    return Err(RuntimeError::InvalidOperation(
                        "Nesting :not in a selector is not allowed".to_string(),
                    ));
                }
                in_not = true;
                css_selector.not_selectors.push(CssSelector::default());
            }

            let current = match css_selector.not_selectors.last_mut() {
                Some(not_selector) if in_not => not_selector,
                _ => &mut css_selector,
            };

            if let Some(tag_match) = cap.get(SelectorRegexp::Tag as usize) {
                let tag = tag_match.as_str();
                match cap.get(SelectorRegexp::Prefix as usize).map(|m| m.as_str()) {
                    Some("#") => current.attrs.push(("id".to_string(), tag[1..].to_string())),
                    Some(".") => current.class_names.push(tag[1..].to_lowercase()),
                    _ => current.element = Some(tag.to_string()),
                }
            }

            if let Some(attr_match) = cap.get(SelectorRegexp::Attribute as usize) {
                let value = [
                    SelectorRegexp::AttributeValueDouble,
                    SelectorRegexp::AttributeValueSingle,
                    SelectorRegexp::AttributeValueUnquoted,
                ]
                .iter()
                .find_map(|group| cap.get(*group as usize))
                .map(|m| m.as_str())
                .unwrap_or("");
                current
                    .attrs
                    .push((attr_match.as_str().replace('\\', ""), value.to_string()));
            }

            if cap.get(SelectorRegexp::NotEnd as usize).is_some() {
                in_not = false;
            }

            if cap.get(SelectorRegexp::Separator as usize).is_some() {
                if in_not {
                    return Err(RuntimeError::InvalidOperation(
                        "Multiple selectors in :not are not supported".to_string(),
                    ));
                }
                Self::add_result(&mut results, std::mem::take(&mut css_selector));
            }
        }

        Self::add_result(&mut results, css_selector);
        Ok(results)
    }

    fn add_result(results: &mut Vec<CssSelector>, mut css_sel: CssSelector) {
        if !css_sel.not_selectors.is_empty()
            && css_sel.element.is_none()
            && css_sel.class_names.is_empty()
            && css_sel.attrs.is_empty()
        {
            css_sel.element = Some(WILDCARD.to_string());
        }
        results.push(css_sel);
    }
}

fn is_matchable(tnode: &TNode) -> bool {
    matches!(
        tnode.node_type,
        TNodeType::Element | TNodeType::ElementContainer | TNodeType::Container
    )
}

/// Whether the static shape of `tnode` satisfies `selector`.
pub fn is_node_matching_selector(tnode: &TNode, selector: &CssSelector) -> bool {
    if !is_matchable(tnode) {
        return false;
    }

    if let Some(element) = &selector.element {
        let tag_matches = element == WILDCARD
            || tnode
                .tag_name
                .as_deref()
                .map(|tag| tag.eq_ignore_ascii_case(element))
                .unwrap_or(false);
        if !tag_matches {
            return false;
        }
    }

    let has_class = |class_name: &str| {
        tnode
            .static_classes
            .keys()
            .any(|candidate| candidate.eq_ignore_ascii_case(class_name))
    };
    if !selector.class_names.iter().all(|class_name| has_class(class_name)) {
        return false;
    }

    let plain_attrs = tnode
        .attrs
        .as_ref()
        .map(|attrs| attrs.plain())
        .unwrap_or_default();
    for (name, value) in &selector.attrs {
        let found = plain_attrs
            .iter()
            .find(|(attr, _)| attr.eq_ignore_ascii_case(name));
        match found {
            None => return false,
            Some((_, actual)) if !value.is_empty() && !actual.eq_ignore_ascii_case(value) => {
                return false
            }
            Some(_) => {}
        }
    }

    !selector
        .not_selectors
        .iter()
        .any(|not_selector| is_node_matching_selector(tnode, not_selector))
}

pub fn is_node_matching_selector_list(tnode: &TNode, selectors: &[CssSelector]) -> bool {
    selectors
        .iter()
        .any(|selector| is_node_matching_selector(tnode, selector))
}

/// Parsed `select` attribute of one `<ng-content>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProjectionSelector {
    Wildcard,
    List {
        text: String,
        selectors: Vec<CssSelector>,
    },
}

impl ProjectionSelector {
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        if text == WILDCARD {
            return Ok(ProjectionSelector::Wildcard);
        }
        Ok(ProjectionSelector::List {
            text: text.to_string(),
            selectors: CssSelector::parse(text)?,
        })
    }
}

/// Projection bucket of a content node.
///
/// Bucket `i + 1` belongs to the `i`-th selector. A node matching nothing goes to the wildcard
/// selector's bucket, or to bucket 0 when there is no wildcard. `ngProjectAs` is compared with
/// the selector text instead of the node's own shape.
pub fn matching_projection_selector_index(tnode: &TNode, selectors: &[ProjectionSelector]) -> usize {
    let project_as = tnode.attrs.as_ref().and_then(|attrs| attrs.project_as());
    let mut wildcard_index = None;
    for (i, selector) in selectors.iter().enumerate() {
        match selector {
            ProjectionSelector::Wildcard => {
                if wildcard_index.is_none() {
                    wildcard_index = Some(i + 1);
                }
            }
            ProjectionSelector::List { text, selectors } => {
                if let Some(project_as) = project_as {
                    if project_as.trim() == text {
                        return i + 1;
                    }
                } else if is_node_matching_selector_list(tnode, selectors) {
                    return i + 1;
                }
            }
        }
    }
    wildcard_index.unwrap_or(0)
}
