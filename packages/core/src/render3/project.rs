//! Content projection
//!
//! `projection_def` distributes the content children of a component host into buckets, chaining
//! the nodes of each bucket through `projection_next`. Each `<ng-content>` of the component
//! template then appends the natives of its bucket. A bucket member that is itself an
//! `<ng-content>` of the parent component (re-projection) is expanded in place from the
//! parent's host, using an explicit stack to resume the outer chain.

use smallvec::SmallVec;
use tracing::trace;

use super::interfaces::node::{ProjectionSlot, TAttributes, TNodeFlags, TNodeType, TProjection};
use super::interfaces::renderer::RNode;
use super::interfaces::view::{ViewId, ViewParent};
use super::node_selector_matcher::{matching_projection_selector_index, ProjectionSelector};
use super::state::RenderContext;
use crate::error::{Result, RuntimeError};

impl RenderContext {
    /// Distributes the content children of the current component's host.
    ///
    /// `None` puts every child in bucket 0; otherwise bucket `i + 1` collects the children
    /// matching `selectors[i]` and bucket 0 the rest (unless a `*` selector claims them).
    pub fn projection_def(&mut self, selectors: Option<&[&str]>) -> Result<()> {
        let view = self.current_view()?;
        let component_view = self.find_component_view(view)?;
        let Some(ViewParent::Component {
            view: host_view,
            host,
        }) = self.view(component_view)?.parent
        else {
            return Err(RuntimeError::InvalidOperation(
                "projection_def outside of a component template".to_string(),
            ));
        };

        let host_tview = self.view(host_view)?.tview.clone();
        let mut host_tview = host_tview.borrow_mut();
        if !matches!(host_tview.node(host)?.projection, TProjection::None) {
            return Ok(());
        }

        let selectors = match selectors {
            Some(selectors) => selectors
                .iter()
                .map(|selector| ProjectionSelector::parse(selector))
                .collect::<Result<Vec<_>>>()?,
            None => Vec::new(),
        };
        let bucket_count = selectors.len() + 1;
        let mut heads: Vec<Option<usize>> = vec![None; bucket_count];
        let mut tails: Vec<Option<usize>> = vec![None; bucket_count];

        for child in host_tview.child_nodes(host) {
            let bucket = if selectors.is_empty() {
                0
            } else {
                matching_projection_selector_index(host_tview.node(child)?, &selectors)
            };
            match tails[bucket] {
                Some(tail) => host_tview.node_mut(tail)?.projection_next = Some(child),
                None => heads[bucket] = Some(child),
            }
            tails[bucket] = Some(child);
        }

        trace!(%host_view, host, ?heads, "projection buckets");
        host_tview.node_mut(host)?.projection = TProjection::Slots(
            heads
                .into_iter()
                .map(|head| head.map(ProjectionSlot::Nodes))
                .collect(),
        );
        Ok(())
    }

    /// `<ng-content>`: appends the natives of bucket `selector_index` under the current parent.
    pub fn projection(
        &mut self,
        index: usize,
        selector_index: usize,
        attrs: &[(&str, &str)],
    ) -> Result<()> {
        let view = self.current_view()?;
        let attrs = if attrs.is_empty() {
            None
        } else {
            Some(TAttributes::from_pairs(attrs))
        };
        self.get_or_create_tnode(index, TNodeType::Projection, Some("ng-content"), attrs)?;
        let parent = {
            let tview = self.current_tview()?;
            let mut tview = tview.borrow_mut();
            let tnode = tview.node_mut(index)?;
            if matches!(tnode.projection, TProjection::None) {
                tnode.projection = TProjection::Selector(selector_index);
            }
            tnode.parent
        };
        self.frame_mut()?.is_parent = false;

        let mut natives = Vec::new();
        self.collect_projected_natives(view, index, &mut natives, true)?;
        for native in natives {
            self.append_child(view, parent, native)?;
        }
        Ok(())
    }

    /// Host view and node of the component whose template contains `view`.
    fn projection_host(&self, view: ViewId) -> Result<Option<(ViewId, usize)>> {
        let component_view = self.find_component_view(view)?;
        Ok(match self.view(component_view)?.parent {
            Some(ViewParent::Component { view, host }) => Some((view, host)),
            _ => None,
        })
    }

    /// Bucket projected by the `<ng-content>` node at `index` of `view`, with the view its
    /// nodes belong to.
    fn projection_slot(
        &self,
        view: ViewId,
        index: usize,
    ) -> Result<Option<(ViewId, ProjectionSlot)>> {
        let TProjection::Selector(selector_index) = self.tnode(view, index)?.projection else {
            return Ok(None);
        };
        let Some((host_view, host)) = self.projection_host(view)? else {
            return Ok(None);
        };
        let slot = match self.tnode(host_view, host)?.projection {
            TProjection::Slots(slots) => slots.get(selector_index).cloned().flatten(),
            _ => None,
        };
        Ok(slot.map(|slot| (host_view, slot)))
    }

    /// Natives rendered by the `<ng-content>` at `index` of `view`, in order.
    ///
    /// With `mark`, every projected node is flagged as projected.
    pub(crate) fn collect_projected_natives(
        &self,
        view: ViewId,
        index: usize,
        natives: &mut Vec<RNode>,
        mark: bool,
    ) -> Result<()> {
        let mut stack: SmallVec<[Option<(usize, ViewId)>; 4]> = SmallVec::new();
        let mut cursor = match self.projection_slot(view, index)? {
            None => None,
            Some((_, ProjectionSlot::Native(nodes))) => {
                natives.extend(nodes);
                None
            }
            Some((host_view, ProjectionSlot::Nodes(first))) => Some((first, host_view)),
        };

        loop {
            let Some((node_index, node_view)) = cursor else {
                match stack.pop() {
                    Some(resume) => {
                        cursor = resume;
                        continue;
                    }
                    None => break,
                }
            };
            let tnode = self.tnode(node_view, node_index)?;
            let next = tnode.projection_next.map(|next| (next, node_view));

            if tnode.node_type == TNodeType::Projection {
                trace!(%node_view, node_index, "re-project");
                match self.projection_slot(node_view, node_index)? {
                    Some((_, ProjectionSlot::Native(nodes))) => {
                        natives.extend(nodes);
                        cursor = next;
                    }
                    Some((host_view, ProjectionSlot::Nodes(first))) => {
                        stack.push(next);
                        cursor = Some((first, host_view));
                    }
                    None => cursor = next,
                }
                continue;
            }

            if mark && !tnode.flags.contains(TNodeFlags::IS_PROJECTED) {
                let tview = self.view(node_view)?.tview.clone();
                tview.borrow_mut().node_mut(node_index)?.flags |= TNodeFlags::IS_PROJECTED;
            }
            self.collect_tnode_natives(node_view, node_index, natives)?;
            cursor = next;
        }
        Ok(())
    }
}
