//! Cluster tree node.

use core::fmt;

use crate::matrix::Cell;

/// Stable node identifier: the node's index in its tree's arena.
pub type NodeId = usize;

/// Display label of a collapsed node.
pub const COLLAPSED_LABEL: &str = "[collapsed]";

/// A node in a [`ClusterTree`](super::ClusterTree).
///
/// Leaves stand for one matrix row (`source`). Internal nodes stand for the
/// group of leaves below them, represented by an aggregate vector.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Unique identifier for this node.
    pub id: NodeId,
    /// Parent node, `None` for the root.
    pub parent: Option<NodeId>,
    /// Child ids, left to right. Kept while the node is collapsed.
    pub children: Vec<NodeId>,
    /// Original matrix row index (leaves only).
    pub source: Option<usize>,
    /// Edge count from the root.
    pub depth: usize,
    /// Merge distance for internal nodes, 0 for leaves.
    pub height: f64,
    /// The matrix row for a leaf, the average of its children otherwise.
    pub canonical: Vec<Cell>,
    pub(crate) label: Option<String>,
    pub(crate) collapsed: bool,
    pub(crate) aggregate: Option<Vec<Cell>>,
}

impl TreeNode {
    pub(crate) fn new(id: NodeId, parent: Option<NodeId>, depth: usize) -> Self {
        Self {
            id,
            parent,
            children: Vec::new(),
            source: None,
            depth,
            height: 0.0,
            canonical: Vec::new(),
            label: None,
            collapsed: false,
            aggregate: None,
        }
    }

    /// Check if this is a leaf node.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Check if this is the root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// Whether the subtree is folded into this node.
    pub fn is_collapsed(&self) -> bool {
        self.collapsed
    }

    /// Children that currently take part in layout; empty while collapsed.
    pub fn active_children(&self) -> &[NodeId] {
        if self.collapsed {
            &[]
        } else {
            &self.children
        }
    }

    /// The vector this node presents: the collapse aggregate if set, else `canonical`.
    pub fn vector(&self) -> &[Cell] {
        self.aggregate.as_deref().unwrap_or(&self.canonical)
    }

    /// Original label (the axis label for leaves).
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Label to show: the collapse placeholder while collapsed, else the original label.
    pub fn display_label(&self) -> &str {
        if self.collapsed {
            COLLAPSED_LABEL
        } else {
            self.label.as_deref().unwrap_or("")
        }
    }
}

impl fmt::Display for TreeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.source {
            Some(src) => write!(f, "Leaf[{}] #{}: {}", self.id, src, self.display_label()),
            None => write!(
                f,
                "Node[{}] D{} h={:.3}{}",
                self.id,
                self.depth,
                self.height,
                if self.collapsed { " (collapsed)" } else { "" }
            ),
        }
    }
}
