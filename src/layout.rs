//! Dendrogram layout.
//!
//! Assigns every visible node a position on two axes:
//!
//! - **offset** (along the matrix): leaves at `i * leaf_spacing` in
//!   left-to-right order, internal nodes at the mean of their children
//! - **depth** (across the tree panel): `view_depth` at every leaf, the
//!   root at `0`, and an internal node at `(1 - h / h_root) * view_depth`
//!   where `h` is its edge count to its deepest visible leaf
//!
//! A collapsed node is laid out as a leaf; its hidden descendants get no
//! position. Layout is a pure function of the tree's current collapse
//! state, so re-running it after a collapse/expand is the same call.

use crate::hierarchy::{ClusterTree, NodeId};

/// Sizes used to place nodes.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LayoutConfig {
    /// Size of one matrix cell.
    pub cell_size: f64,
    /// Gap between adjacent cells.
    pub cell_gap: f64,
    /// Extent of the tree panel, root to leaves.
    pub view_depth: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            cell_size: 10.0,
            cell_gap: 0.0,
            view_depth: 150.0,
        }
    }
}

impl LayoutConfig {
    /// Set the cell size.
    pub fn with_cell_size(mut self, cell_size: f64) -> Self {
        self.cell_size = cell_size;
        self
    }

    /// Set the gap between cells.
    pub fn with_cell_gap(mut self, cell_gap: f64) -> Self {
        self.cell_gap = cell_gap;
        self
    }

    /// Set the tree panel depth.
    pub fn with_view_depth(mut self, view_depth: f64) -> Self {
        self.view_depth = view_depth;
        self
    }

    /// Distance between adjacent leaves.
    pub fn leaf_spacing(&self) -> f64 {
        self.cell_size + self.cell_gap
    }
}

/// Position of one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    /// Coordinate along the matrix axis.
    pub offset: f64,
    /// Coordinate across the tree panel.
    pub depth: f64,
}

/// Positions keyed by node id, plus the visible leaf sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    positions: Vec<Option<Position>>,
    slots: Vec<NodeId>,
}

impl Layout {
    /// Position of `id`, `None` if hidden under a collapsed ancestor.
    pub fn position(&self, id: NodeId) -> Option<Position> {
        self.positions.get(id).copied().flatten()
    }

    /// Visible leaves (leaves and collapsed nodes), left to right.
    pub fn slots(&self) -> &[NodeId] {
        &self.slots
    }

    /// Number of visible leaves.
    pub fn n_slots(&self) -> usize {
        self.slots.len()
    }

    /// Parent/child edges between visible nodes, as positions.
    pub fn edges<'a>(&'a self, tree: &'a ClusterTree) -> impl Iterator<Item = (Position, Position)> + 'a {
        tree.iter().filter_map(move |node| {
            let child = self.position(node.id)?;
            let parent = self.position(node.parent?)?;
            Some((parent, child))
        })
    }
}

/// Lay out the visible part of `tree`.
pub fn layout(tree: &ClusterTree, config: &LayoutConfig) -> Layout {
    let mut positions: Vec<Option<Position>> = vec![None; tree.len()];
    let visible = tree.visible_nodes();
    let slots = tree.visible_leaves();

    // Height above the deepest visible leaf; collapsed nodes count as leaves.
    let mut heights = vec![0usize; tree.len()];
    for &id in visible.iter().rev() {
        let h = tree
            .node(id)
            .active_children()
            .iter()
            .map(|&c| heights[c] + 1)
            .max()
            .unwrap_or(0);
        heights[id] = h;
    }
    let root_height = heights.get(tree.root()).copied().unwrap_or(0);
    let depth_of = |id: NodeId| {
        if root_height == 0 {
            0.0
        } else {
            (1.0 - heights[id] as f64 / root_height as f64) * config.view_depth
        }
    };

    let spacing = config.leaf_spacing();
    for (i, &id) in slots.iter().enumerate() {
        positions[id] = Some(Position {
            offset: i as f64 * spacing,
            depth: depth_of(id),
        });
    }

    // Pre-order reversed: children are placed before their parent.
    for &id in visible.iter().rev() {
        let children = tree.node(id).active_children();
        if children.is_empty() {
            continue;
        }
        let sum: f64 = children
            .iter()
            .filter_map(|&c| positions[c])
            .map(|p| p.offset)
            .sum();
        positions[id] = Some(Position {
            offset: sum / children.len() as f64,
            depth: depth_of(id),
        });
    }

    Layout { positions, slots }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::Dendrogram;
    use crate::matrix::Cell;
    use ndarray::Array2;

    /// ((0, 1), 2)
    fn tree() -> ClusterTree {
        let p: Array2<Cell> = Array2::from_shape_fn((3, 1), |(i, _)| Some(i as f64));
        let mut dendro = Dendrogram::new(3);
        dendro.add_merge(0, 1, 1.0, 2);
        dendro.add_merge(3, 2, 2.0, 3);
        ClusterTree::from_dendrogram(&dendro, p.view()).unwrap()
    }

    #[test]
    fn test_leaf_offsets_and_midpoints() {
        let t = tree();
        let l = layout(&t, &LayoutConfig::default());
        assert_eq!(l.slots(), &[2, 3, 4]);
        assert_eq!(l.position(2).unwrap().offset, 0.0);
        assert_eq!(l.position(3).unwrap().offset, 10.0);
        assert_eq!(l.position(4).unwrap().offset, 20.0);
        assert_eq!(l.position(1).unwrap().offset, 5.0);
        assert_eq!(l.position(0).unwrap().offset, 12.5);
    }

    #[test]
    fn test_depth_scaled_to_view() {
        let t = tree();
        let l = layout(&t, &LayoutConfig::default().with_view_depth(100.0));
        assert_eq!(l.position(0).unwrap().depth, 0.0);
        assert_eq!(l.position(1).unwrap().depth, 50.0);
        assert_eq!(l.position(2).unwrap().depth, 100.0);
        assert_eq!(l.position(4).unwrap().depth, 100.0);
    }

    #[test]
    fn test_every_slot_reaches_matrix_edge() {
        let t = tree();
        let cfg = LayoutConfig::default();
        let l = layout(&t, &cfg);
        for &slot in l.slots() {
            assert_eq!(l.position(slot).unwrap().depth, cfg.view_depth, "slot {slot}");
        }
    }

    #[test]
    fn test_collapsed_node_is_laid_out_as_leaf() {
        let mut t = tree();
        crate::collapse::collapse(&mut t, 1).unwrap();
        let l = layout(&t, &LayoutConfig::default());
        assert_eq!(l.slots(), &[1, 4]);
        assert_eq!(l.position(1), Some(Position { offset: 0.0, depth: 150.0 }));
        assert_eq!(l.position(4), Some(Position { offset: 10.0, depth: 150.0 }));
        assert_eq!(l.position(0), Some(Position { offset: 5.0, depth: 0.0 }));
        assert_eq!(l.position(2), None);
        assert_eq!(l.position(3), None);
    }

    #[test]
    fn test_spacing_includes_gap() {
        let t = tree();
        let cfg = LayoutConfig::default().with_cell_size(8.0).with_cell_gap(2.0);
        let l = layout(&t, &cfg);
        assert_eq!(l.position(4).unwrap().offset, 20.0);
    }

    #[test]
    fn test_single_leaf() {
        let p: Array2<Cell> = Array2::from_elem((1, 1), Some(1.0));
        let t = ClusterTree::from_dendrogram(&Dendrogram::new(1), p.view()).unwrap();
        let l = layout(&t, &LayoutConfig::default());
        assert_eq!(l.position(0), Some(Position { offset: 0.0, depth: 0.0 }));
    }

    #[test]
    fn test_edges() {
        let t = tree();
        let l = layout(&t, &LayoutConfig::default());
        assert_eq!(l.edges(&t).count(), 4);
    }
}
