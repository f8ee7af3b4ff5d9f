//! View container state

use super::renderer::RNode;
use super::view::ViewId;

/// Ordered embedded views attached at an anchor node.
///
/// `views` is always in DOM order: the first view's root nodes follow the anchor, each later
/// view's nodes follow the previous one's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LContainer {
    pub tnode_index: usize,
    /// Element the container was promoted from, if any.
    pub host_native: Option<RNode>,
    /// Comment the views are inserted after.
    pub anchor: RNode,
    pub views: Vec<ViewId>,
    /// Render parent cleared: views are tracked but never inserted into the DOM.
    pub detached: bool,
    /// Inline refresh cursor
    pub active_index: usize,
    /// Views are managed by inline embedded view blocks of the declaring template.
    pub inline: bool,
}

impl LContainer {
    pub fn new(tnode_index: usize, anchor: RNode, host_native: Option<RNode>) -> Self {
        LContainer {
            tnode_index,
            host_native,
            anchor,
            views: Vec::new(),
            detached: false,
            active_index: 0,
            inline: false,
        }
    }

    pub fn index_of(&self, view: ViewId) -> Option<usize> {
        self.views.iter().position(|candidate| *candidate == view)
    }
}
