//! Event listeners

use tracing::trace;

use crate::error::{Result, RuntimeError};
use crate::render3::interfaces::renderer::{EventHandler, ListenTarget};
use crate::render3::state::RenderContext;

impl RenderContext {
    /// Listens to `event_name` on the current element. The listener is removed when the view is
    /// destroyed.
    pub fn listener(&mut self, event_name: &str, handler: EventHandler) -> Result<()> {
        let index = self.frame()?.previous_or_parent.ok_or_else(|| {
            RuntimeError::PhaseViolation("listener outside of an element".to_string())
        })?;
        let native = self.lview()?.native(index).ok_or(RuntimeError::UnexpectedSlot {
            index,
            expected: "an element",
        })?;
        trace!(index, event_name, "listen");
        let unlisten = self
            .renderer()
            .listen(ListenTarget::Node(native), event_name, handler);
        self.lview_mut()?.cleanup.push(unlisten);
        Ok(())
    }

    /// Listens on a global target such as `window` or `document`.
    pub fn listener_global(
        &mut self,
        target: &str,
        event_name: &str,
        handler: EventHandler,
    ) -> Result<()> {
        let unlisten = self.renderer().listen(
            ListenTarget::Global(target.to_string()),
            event_name,
            handler,
        );
        self.lview_mut()?.cleanup.push(unlisten);
        Ok(())
    }
}
