//! Translation of template fragments
//!
//! [`i18n_mapping`] turns a translated message such as
//! `"{$START_B}Hello {$END_B}{$INTERP}"` into opcodes that [`RenderContext::i18n_apply`] replays
//! on the nodes already created by the template: elements and expression text nodes are moved
//! into translation order, static text nodes are created, and placeholders the translation
//! omits are removed from the DOM.
//!
//! An opcode packs its kind in the top 3 bits of a `u32` and a node index in the remaining
//! bits. Indexes are limited to 28 bits.

use std::fmt;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use tracing::trace;

use super::instructions::allocate_expando;
use super::interfaces::node::{TNode, TNodeFlags, TNodeType};
use super::interfaces::view::{LSlot, TData, TView, ViewId};
use super::state::RenderContext;
use crate::error::{Result, RuntimeError};
use crate::util::stringify;

static I18N_TAG_REGEXP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\$([^}]+)\}").unwrap());

const OPCODE_SHIFT: u32 = 29;
const INDEX_MASK: u32 = (1 << OPCODE_SHIFT) - 1;
const MAX_INDEX: usize = 1 << 28;

/// Kind of a numeric i18n instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum I18nOpCode {
    /// Followed by an [`I18nInstruction::Text`] carrying the value.
    Text = 1 << 29,
    Element = 2 << 29,
    Expression = 3 << 29,
    /// Root of a sub-template; unlike an element it has no closing tag.
    TemplateRoot = 4 << 29,
    /// Trailing child of an `<ng-container>` parent, re-appended to keep DOM order.
    Any = 5 << 29,
    CloseNode = 6 << 29,
    RemoveNode = 7 << 29,
}

impl I18nOpCode {
    fn from_bits(bits: u32) -> Option<Self> {
        Some(match bits >> OPCODE_SHIFT {
            1 => I18nOpCode::Text,
            2 => I18nOpCode::Element,
            3 => I18nOpCode::Expression,
            4 => I18nOpCode::TemplateRoot,
            5 => I18nOpCode::Any,
            6 => I18nOpCode::CloseNode,
            7 => I18nOpCode::RemoveNode,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nInstruction {
    Op(u32),
    Text(String),
}

impl I18nInstruction {
    /// Packs `opcode` with a node index.
    pub fn encode(opcode: I18nOpCode, index: usize) -> Result<Self> {
        if index >= MAX_INDEX {
            return Err(RuntimeError::IndexOverflow { index });
        }
        Ok(I18nInstruction::Op(opcode as u32 | index as u32))
    }

    pub fn decode(&self) -> Option<(I18nOpCode, usize)> {
        match self {
            I18nInstruction::Op(bits) => {
                I18nOpCode::from_bits(*bits).map(|opcode| (opcode, (*bits & INDEX_MASK) as usize))
            }
            I18nInstruction::Text(_) => None,
        }
    }
}

impl fmt::Display for I18nInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self, self.decode()) {
            (I18nInstruction::Text(text), _) => write!(f, "{:?}", text),
            (_, Some((opcode, index))) => write!(f, "{:?}({})", opcode, index),
            (I18nInstruction::Op(bits), None) => write!(f, "Op({:#x})", bits),
        }
    }
}

/// Placeholder names mapped to node indexes, in declaration order.
pub type PlaceholderMap = IndexMap<String, usize>;

/// Splits `translation` into text runs (even positions) and placeholder names (odd positions).
fn split_placeholders(translation: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut last = 0;
    for captures in I18N_TAG_REGEXP.captures_iter(translation) {
        let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        parts.push(translation[last..whole.start()].to_string());
        parts.push(name.as_str().to_string());
        last = whole.end();
    }
    parts.push(translation[last..].to_string());
    parts
}

struct MappingInput<'a> {
    parts: Vec<String>,
    elements: &'a [Option<PlaceholderMap>],
    expressions: &'a [Option<PlaceholderMap>],
    template_roots: &'a [&'a str],
    last_child_index: Option<usize>,
}

impl MappingInput<'_> {
    fn template_root_index(&self, name: &str) -> Option<usize> {
        self.template_roots.iter().position(|root| *root == name)
    }
}

/// Builds the instructions of every template of a translated block.
///
/// `elements[t]` and `expressions[t]` hold the placeholders of template `t`: 0 is the block's own
/// template, `t > 0` the sub-template rooted at `template_roots[t - 1]`. `last_child_index` is set
/// when the block's parent is an `<ng-container>` whose later children must be re-appended.
pub fn i18n_mapping(
    translation: &str,
    elements: &[Option<PlaceholderMap>],
    expressions: &[Option<PlaceholderMap>],
    template_roots: &[&str],
    last_child_index: Option<usize>,
) -> Result<Vec<Vec<I18nInstruction>>> {
    let input = MappingInput {
        parts: split_placeholders(translation),
        elements,
        expressions,
        template_roots,
        last_child_index,
    };
    let mut instructions = vec![Vec::new(); template_roots.len() + 1];
    generate_mapping_instructions(0, 0, &input, &mut instructions)?;
    Ok(instructions)
}

/// Fills `instructions[template_index]` from `parts[part_index..]` and returns the part index
/// where the template ended.
fn generate_mapping_instructions(
    template_index: usize,
    mut part_index: usize,
    input: &MappingInput<'_>,
    instructions: &mut Vec<Vec<I18nInstruction>>,
) -> Result<usize> {
    let mut current = Vec::new();
    let mut visited: Vec<&str> = Vec::new();
    let mut opened_tags = 0usize;
    let mut max_index = 0usize;
    let elements = input.elements.get(template_index).and_then(Option::as_ref);
    let expressions = input.expressions.get(template_index).and_then(Option::as_ref);

    while part_index < input.parts.len() {
        let value = input.parts[part_index].as_str();
        if part_index % 2 == 1 {
            let mut placeholder_index = None;
            if let Some(index) = elements.and_then(|map| map.get(value)).copied() {
                match input.template_root_index(value) {
                    Some(root) if root + 1 != template_index => {
                        current.push(I18nInstruction::encode(I18nOpCode::TemplateRoot, index)?);
                    }
                    _ => {
                        current.push(I18nInstruction::encode(I18nOpCode::Element, index)?);
                        opened_tags += 1;
                    }
                }
                visited.push(value);
                placeholder_index = Some(index);
            } else if let Some(index) = expressions.and_then(|map| map.get(value)).copied() {
                current.push(I18nInstruction::encode(I18nOpCode::Expression, index)?);
                visited.push(value);
                placeholder_index = Some(index);
            } else {
                current.push(I18nInstruction::encode(I18nOpCode::CloseNode, 0)?);
                if template_index > 0 {
                    opened_tags = opened_tags.saturating_sub(1);
                    if opened_tags == 0 {
                        break;
                    }
                }
            }

            if let Some(index) = placeholder_index {
                max_index = max_index.max(index);
            }

            if let Some(root) = input.template_root_index(value) {
                if root + 1 != template_index {
                    part_index =
                        generate_mapping_instructions(root + 1, part_index, input, instructions)?;
                }
            }
        } else if !value.is_empty() {
            current.push(I18nInstruction::encode(I18nOpCode::Text, 0)?);
            current.push(I18nInstruction::Text(value.to_string()));
        }
        part_index += 1;
    }

    for map in [elements, expressions].into_iter().flatten() {
        for (name, index) in map {
            if !visited.contains(&name.as_str()) {
                current.push(I18nInstruction::encode(I18nOpCode::RemoveNode, *index)?);
                max_index = max_index.max(*index);
            }
        }
    }

    if template_index == 0 {
        if let Some(last_child_index) = input.last_child_index {
            for index in max_index + 1..=last_child_index {
                current.push(I18nInstruction::encode(I18nOpCode::Any, index)?);
            }
        }
    }

    instructions[template_index] = current;
    Ok(part_index)
}

/// Instruction of a translated attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum I18nExpInstruction {
    Text(String),
    /// Position of the value in the list passed to [`RenderContext::i18n_interpolation`].
    Expression(usize),
}

/// Splits an attribute translation into static text and expression references.
///
/// A placeholder missing from `placeholders` is kept as literal text.
pub fn i18n_exp_mapping(translation: &str, placeholders: &PlaceholderMap) -> Vec<I18nExpInstruction> {
    split_placeholders(translation)
        .into_iter()
        .enumerate()
        .map(|(position, part)| {
            if position % 2 == 0 {
                return I18nExpInstruction::Text(part);
            }
            match placeholders.get(&part) {
                Some(index) => I18nExpInstruction::Expression(*index),
                None => I18nExpInstruction::Text(format!("{{${}}}", part)),
            }
        })
        .filter(|instruction| !matches!(instruction, I18nExpInstruction::Text(text) if text.is_empty()))
        .collect()
}

/// Unlinks `index` from its current sibling chain and links it under `parent`, after `previous`
/// (first when `None`).
fn relink_tnode(
    tview: &mut TView,
    index: usize,
    parent: Option<usize>,
    previous: Option<usize>,
) -> Result<()> {
    let (old_parent, old_next) = {
        let tnode = tview.node(index)?;
        (tnode.parent, tnode.next)
    };
    let old_head = match old_parent {
        Some(old_parent) => tview.node(old_parent)?.child,
        None => tview.first_child,
    };
    if old_head == Some(index) {
        match old_parent {
            Some(old_parent) => tview.node_mut(old_parent)?.child = old_next,
            None => tview.first_child = old_next,
        }
    } else {
        let mut cursor = old_head;
        while let Some(sibling) = cursor {
            let tnode = tview.node_mut(sibling)?;
            if tnode.next == Some(index) {
                tnode.next = old_next;
                break;
            }
            cursor = tnode.next;
        }
    }

    let next = match previous {
        Some(previous) => {
            let previous_tnode = tview.node_mut(previous)?;
            let next = previous_tnode.next;
            previous_tnode.next = Some(index);
            next
        }
        None => match parent {
            Some(parent) => {
                let parent_tnode = tview.node_mut(parent)?;
                let next = parent_tnode.child;
                parent_tnode.child = Some(index);
                next
            }
            None => {
                let next = tview.first_child;
                tview.first_child = Some(index);
                next
            }
        },
    };
    let tnode = tview.node_mut(index)?;
    tnode.next = next.filter(|next| *next != index);
    tnode.parent = parent;
    Ok(())
}

impl RenderContext {
    /// Replays `instructions` against the nodes of the current view, starting at the parent of
    /// the node at `start_index`. Must run before any binding of the view.
    pub fn i18n_apply(&mut self, start_index: usize, instructions: &[I18nInstruction]) -> Result<()> {
        let view = self.current_view()?;
        let tview = self.current_tview()?;
        let binding_start = tview.borrow().binding_start_index;
        if self.frame()?.binding_index != binding_start {
            return Err(RuntimeError::PhaseViolation(
                "i18n_apply should be called before any binding".to_string(),
            ));
        }

        let root_parent = self.tnode(view, start_index)?.parent;
        let mut parent = root_parent;
        let mut previous: Option<usize> = None;
        let mut iter = instructions.iter();

        while let Some(instruction) = iter.next() {
            let Some((opcode, index)) = instruction.decode() else {
                return Err(RuntimeError::InvalidOperation(format!(
                    "unexpected i18n instruction {}",
                    instruction
                )));
            };
            trace!(%view, %instruction, "i18n");
            match opcode {
                I18nOpCode::Element => {
                    self.append_i18n_node(view, index, parent, previous)?;
                    parent = Some(index);
                    previous = None;
                }
                I18nOpCode::Expression | I18nOpCode::TemplateRoot | I18nOpCode::Any => {
                    self.append_i18n_node(view, index, parent, previous)?;
                    previous = Some(index);
                }
                I18nOpCode::Text => {
                    let Some(I18nInstruction::Text(value)) = iter.next() else {
                        return Err(RuntimeError::InvalidOperation(
                            "i18n text opcode without a value".to_string(),
                        ));
                    };
                    let text_index = self.create_i18n_text(view, value, parent)?;
                    self.append_i18n_node(view, text_index, parent, previous)?;
                    previous = Some(text_index);
                }
                I18nOpCode::CloseNode => {
                    if parent != root_parent {
                        if let Some(closed) = parent {
                            previous = Some(closed);
                            parent = self.tnode(view, closed)?.parent;
                        }
                    }
                }
                I18nOpCode::RemoveNode => self.remove_i18n_node(view, index)?,
            }
        }
        Ok(())
    }

    /// Text node for a static run of the translation, allocated in the expando on the first
    /// pass and reused by later instances of the template.
    fn create_i18n_text(&mut self, view: ViewId, value: &str, parent: Option<usize>) -> Result<usize> {
        let tview = self.view(view)?.tview.clone();
        let cursor = self.view(view)?.i18n_text_cursor;
        let index = {
            let mut tview = tview.borrow_mut();
            if tview.first_create_pass {
                let index = allocate_expando(&mut tview, 1);
                tview.data[index] =
                    TData::Node(TNode::new(TNodeType::Text, index, None, None, parent));
                tview.i18n_text_nodes.push(index);
                index
            } else {
                *tview.i18n_text_nodes.get(cursor).ok_or_else(|| {
                    RuntimeError::AssertionFailed(format!("no i18n text node #{}", cursor))
                })?
            }
        };

        let native = self.renderer().create_text(value);
        let lview = self.view_mut(view)?;
        lview.i18n_text_cursor += 1;
        lview.set_slot(index, LSlot::Native(native));
        self.register_native(native, view, index)?;
        Ok(index)
    }

    fn append_i18n_node(
        &mut self,
        view: ViewId,
        index: usize,
        parent: Option<usize>,
        previous: Option<usize>,
    ) -> Result<()> {
        let tview = self.view(view)?.tview.clone();
        {
            let mut tview = tview.borrow_mut();
            if tview.first_create_pass {
                relink_tnode(&mut tview, index, parent, previous)?;
            }
        }
        let mut natives = Vec::new();
        self.collect_tnode_natives(view, index, &mut natives)?;
        for native in natives {
            self.append_child(view, parent, native)?;
        }
        Ok(())
    }

    fn remove_i18n_node(&mut self, view: ViewId, index: usize) -> Result<()> {
        let mut natives = Vec::new();
        self.collect_tnode_natives(view, index, &mut natives)?;
        for native in natives {
            self.remove_native(native);
        }

        let tview = self.view(view)?.tview.clone();
        tview.borrow_mut().node_mut(index)?.flags |= TNodeFlags::IS_DETACHED;
        if let Some(container) = self.view_mut(view)?.container_mut(index) {
            container.detached = true;
        }
        Ok(())
    }

    /// Binds `values` and returns the translated attribute text when any of them changed.
    pub fn i18n_interpolation(
        &mut self,
        instructions: &[I18nExpInstruction],
        values: &[Value],
    ) -> Result<Option<String>> {
        let mut different = false;
        for value in values {
            different |= self.bind(value.clone())?.is_some();
        }
        if !different {
            return Ok(None);
        }

        let mut result = String::new();
        for instruction in instructions {
            match instruction {
                I18nExpInstruction::Text(text) => result.push_str(text),
                I18nExpInstruction::Expression(index) => {
                    if let Some(value) = values.get(*index) {
                        result.push_str(&stringify(value));
                    }
                }
            }
        }
        Ok(Some(result))
    }
}
