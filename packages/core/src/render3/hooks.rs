//! Lifecycle hook queues
//!
//! Hooks are collected into per-TView queues during the first creation pass:
//!
//! - pre-order (onInit, doCheck): queued when a directive is instantiated, so parents precede
//!   their children;
//! - content, view and destroy hooks: queued when the host element ends, so directives on
//!   nested elements precede the ones on their ancestors.
//!
//! Init-type hooks (onInit, afterContentInit, afterViewInit) run on the first refresh of every
//! view instance only.

use tracing::trace;

use super::interfaces::definition::{DirectiveDef, HookFn};
use super::interfaces::view::{HookEntry, LSlot, LViewFlags, TView, ViewId};
use super::state::RenderContext;
use crate::error::Result;

fn push_hook(queue: &mut Vec<HookEntry>, directive_index: usize, hook: &Option<HookFn>, once: bool) {
    if let Some(hook) = hook {
        queue.push(HookEntry {
            directive_index,
            hook: hook.clone(),
            once,
        });
    }
}

/// Queues onInit and doCheck of the directive stored at `directive_index`.
pub(crate) fn register_pre_order_hooks(
    tview: &mut TView,
    directive_index: usize,
    def: &DirectiveDef,
) {
    push_hook(&mut tview.pre_order_hooks, directive_index, &def.hooks.on_init, true);
    push_hook(&mut tview.pre_order_hooks, directive_index, &def.hooks.do_check, false);
}

/// Queues content, view and destroy hooks of every directive on the node at `tnode_index`.
pub(crate) fn register_post_order_hooks(tview: &mut TView, tnode_index: usize) -> Result<()> {
    let (start, end) = {
        let tnode = tview.node(tnode_index)?;
        (tnode.directive_start, tnode.directive_end)
    };
    for directive_index in start..end {
        let Some(def) = tview.directive(directive_index).cloned() else {
            continue;
        };
        let hooks = &def.hooks;
        push_hook(&mut tview.content_hooks, directive_index, &hooks.after_content_init, true);
        push_hook(&mut tview.content_hooks, directive_index, &hooks.after_content_checked, false);
        push_hook(&mut tview.view_hooks, directive_index, &hooks.after_view_init, true);
        push_hook(&mut tview.view_hooks, directive_index, &hooks.after_view_checked, false);
        push_hook(&mut tview.destroy_hooks, directive_index, &hooks.on_destroy, false);
    }
    Ok(())
}

impl RenderContext {
    /// Runs `hooks` against the directive instances of `view`.
    pub(crate) fn execute_hooks(&self, view: ViewId, hooks: &[HookEntry]) -> Result<()> {
        let lview = self.view(view)?;
        let first_pass = lview.flags.contains(LViewFlags::FIRST_LVIEW_PASS);
        for entry in hooks {
            if entry.once && !first_pass {
                continue;
            }
            if let Some(LSlot::Instance(instance)) = lview.slot(entry.directive_index) {
                trace!(%view, directive_index = entry.directive_index, "run hook");
                (entry.hook)(instance);
            }
        }
        Ok(())
    }

    /// Destroy hooks of `view` run regardless of the first-pass flag.
    pub(crate) fn execute_destroy_hooks(&self, view: ViewId) -> Result<()> {
        let hooks = self.view(view)?.tview.borrow().destroy_hooks.clone();
        let lview = self.view(view)?;
        for entry in &hooks {
            if let Some(LSlot::Instance(instance)) = lview.slot(entry.directive_index) {
                (entry.hook)(instance);
            }
        }
        Ok(())
    }
}
