//! Collapse/expand state transitions.
//!
//! ```text
//!            collapse(id)
//! Expanded ───────────────▶ Collapsed
//!    ▲                          │
//!    └──────────────────────────┘
//!             expand(id)
//! ```
//!
//! Every node starts expanded. Leaves and the root never change state;
//! asking them to is a no-op. Collapsing keeps the children in the arena,
//! so expanding restores the same subtree with the same ids.
//!
//! These functions only change the tree. Re-running layout and reordering
//! is the caller's job (see [`DendroHeatmap`](crate::DendroHeatmap)).

use tracing::debug;

use crate::error::Result;
use crate::hierarchy::{ClusterTree, NodeId};
use crate::reorder::average_all;

/// State of one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Children are shown.
    Expanded,
    /// The subtree is shown as one aggregate row/column.
    Collapsed,
}

/// What a transition did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The node was collapsed.
    Collapsed(NodeId),
    /// The node was expanded.
    Expanded(NodeId),
    /// Nothing changed (root, leaf, or already in the target state).
    Unchanged,
}

impl Transition {
    /// Whether the tree changed.
    pub fn is_change(self) -> bool {
        !matches!(self, Transition::Unchanged)
    }
}

/// Current state of `id`.
pub fn state(tree: &ClusterTree, id: NodeId) -> Option<NodeState> {
    tree.get(id).map(|n| {
        if n.is_collapsed() {
            NodeState::Collapsed
        } else {
            NodeState::Expanded
        }
    })
}

/// Fold the subtree at `id` into one node.
///
/// The node's presented vector becomes the average of its children's
/// vectors and its display label becomes the placeholder.
pub fn collapse(tree: &mut ClusterTree, id: NodeId) -> Result<Transition> {
    let node = tree.get_mut(id)?;
    if node.is_root() || node.is_leaf() || node.collapsed {
        return Ok(Transition::Unchanged);
    }

    let children = node.children.clone();
    let aggregate = average_all(children.iter().map(|&c| tree.node(c).vector()));

    let node = tree.get_mut(id)?;
    node.aggregate = Some(aggregate);
    node.collapsed = true;
    debug!(node = id, children = children.len(), "collapsed node");
    Ok(Transition::Collapsed(id))
}

/// Restore the subtree at `id`.
pub fn expand(tree: &mut ClusterTree, id: NodeId) -> Result<Transition> {
    let node = tree.get_mut(id)?;
    if !node.collapsed {
        return Ok(Transition::Unchanged);
    }
    node.collapsed = false;
    node.aggregate = None;
    debug!(node = id, "expanded node");
    Ok(Transition::Expanded(id))
}

/// Collapse an expanded node, expand a collapsed one.
pub fn toggle(tree: &mut ClusterTree, id: NodeId) -> Result<Transition> {
    if tree.get_mut(id)?.collapsed {
        expand(tree, id)
    } else {
        collapse(tree, id)
    }
}
