//! Value bindings

use serde_json::Value;
use tracing::trace;

use crate::error::{Result, RuntimeError};
use crate::render3::interfaces::renderer::RNode;
use crate::render3::interfaces::view::LSlot;
use crate::render3::state::RenderContext;
use crate::util::stringify;

impl RenderContext {
    /// Stores `value` in the next binding slot; returns it when it differs from the previous one.
    pub fn bind(&mut self, value: Value) -> Result<Option<Value>> {
        let index = {
            let frame = self.frame_mut()?;
            let index = frame.binding_index;
            frame.binding_index += 1;
            index
        };
        if self.binding_updated(index, value.clone())? {
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    /// Updates the binding slot at `index`, returning whether the value changed.
    pub fn binding_updated(&mut self, index: usize, value: Value) -> Result<bool> {
        if self.dev_mode() {
            let len = self.current_tview()?.borrow().data.len();
            if index >= len {
                return Err(RuntimeError::AssertionFailed(format!(
                    "binding index {} out of range (data length {})",
                    index, len
                )));
            }
        }
        let lview = self.lview_mut()?;
        if let Some(LSlot::Value(previous)) = lview.slot(index) {
            if *previous == value {
                return Ok(false);
            }
        }
        trace!(index, %value, "binding updated");
        lview.set_slot(index, LSlot::Value(value));
        Ok(true)
    }

    /// Selects the element targeted by the following update instructions.
    pub fn select(&mut self, index: usize) -> Result<()> {
        self.frame_mut()?.selected_index = Some(index);
        Ok(())
    }

    pub fn property(&mut self, name: &str, value: Value) -> Result<()> {
        let index = self.selected_index()?;
        if let Some(value) = self.bind(value)? {
            let native = self.selected_native(index)?;
            self.renderer().set_property(native, name, &value);
        }
        Ok(())
    }

    /// Binds an attribute; `null` removes it.
    pub fn attribute(&mut self, name: &str, value: Value) -> Result<()> {
        let index = self.selected_index()?;
        if let Some(value) = self.bind(value)? {
            let native = self.selected_native(index)?;
            let renderer = self.renderer();
            match value {
                Value::Null => renderer.remove_attribute(native, name, None),
                value => renderer.set_attribute(native, name, &stringify(&value), None),
            }
        }
        Ok(())
    }

    fn selected_native(&self, index: usize) -> Result<RNode> {
        self.lview()?.native(index).ok_or(RuntimeError::UnexpectedSlot {
            index,
            expected: "an element",
        })
    }
}
