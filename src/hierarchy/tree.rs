//! Arena-backed cluster tree.

use ndarray::ArrayView2;

use super::node::{NodeId, TreeNode};
use crate::error::{Error, Result};
use crate::hierarchy::Dendrogram;
use crate::matrix::Cell;
use crate::reorder::average_all;

/// A rooted tree over the rows of a matrix.
///
/// Nodes live in one arena and refer to each other by [`NodeId`]. Ids are
/// assigned in a single depth-first pre-order pass, so the root is `0`,
/// every parent has a smaller id than its children, and leaves appear in
/// increasing id order from left to right.
#[derive(Debug, Clone)]
pub struct ClusterTree {
    nodes: Vec<TreeNode>,
    n_leaves: usize,
}

#[derive(Clone, Copy)]
enum GroupKey {
    Root,
    Group(usize),
    Leaf(usize),
}

impl ClusterTree {
    /// Build the binary tree described by a complete dendrogram.
    ///
    /// `points` are the clustered rows; each internal node's canonical
    /// vector is the [`average`](crate::reorder::average) of its children.
    pub fn from_dendrogram(dendro: &Dendrogram, points: ArrayView2<'_, Cell>) -> Result<Self> {
        if dendro.n_items() != points.nrows() {
            return Err(Error::DimensionMismatch {
                expected: points.nrows(),
                found: dendro.n_items(),
            });
        }
        let root = dendro.root().ok_or(Error::EmptyInput)?;
        let n = dendro.n_items();
        let heights = dendro.distances();

        Ok(Self::build(
            root,
            |k| match dendro.children(k) {
                Some((a, b)) => vec![a, b],
                None => Vec::new(),
            },
            |k| (k < n).then_some(k),
            |k| k.checked_sub(n).map_or(0.0, |m| heights[m]),
            points,
        ))
    }

    /// Build a tree of depth two from a partition: root, one node per group, member leaves.
    ///
    /// Single-member groups hang their leaf directly off the root. When there
    /// is only one group, its members become the root's children. Every index
    /// in `0..points.nrows()` must appear in exactly one group.
    pub fn from_groups(groups: &[Vec<usize>], points: ArrayView2<'_, Cell>) -> Result<Self> {
        let n = points.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        let mut seen = vec![false; n];
        for &i in groups.iter().flatten() {
            if i >= n || std::mem::replace(&mut seen[i], true) {
                return Err(Error::InvalidParameter {
                    name: "groups",
                    message: format!("index {i} is out of range or repeated"),
                });
            }
        }
        if seen.iter().any(|s| !s) {
            return Err(Error::InvalidParameter {
                name: "groups",
                message: "not every item belongs to a group".into(),
            });
        }

        let groups: Vec<&Vec<usize>> = groups.iter().filter(|g| !g.is_empty()).collect();
        let root = if n == 1 {
            GroupKey::Leaf(0)
        } else if groups.len() == 1 {
            GroupKey::Group(0)
        } else {
            GroupKey::Root
        };

        Ok(Self::build(
            root,
            |k| match k {
                GroupKey::Root => (0..groups.len())
                    .map(|g| match groups[g].as_slice() {
                        [single] => GroupKey::Leaf(*single),
                        _ => GroupKey::Group(g),
                    })
                    .collect(),
                GroupKey::Group(g) => groups[g].iter().map(|&i| GroupKey::Leaf(i)).collect(),
                GroupKey::Leaf(_) => Vec::new(),
            },
            |k| match k {
                GroupKey::Leaf(i) => Some(i),
                _ => None,
            },
            |_| 0.0,
            points,
        ))
    }

    fn build<K: Copy>(
        root: K,
        children_of: impl Fn(K) -> Vec<K>,
        leaf_of: impl Fn(K) -> Option<usize>,
        height_of: impl Fn(K) -> f64,
        points: ArrayView2<'_, Cell>,
    ) -> Self {
        let mut nodes: Vec<TreeNode> = Vec::new();
        let mut stack: Vec<(K, Option<NodeId>, usize)> = vec![(root, None, 0)];

        while let Some((key, parent, depth)) = stack.pop() {
            let id = nodes.len();
            let mut node = TreeNode::new(id, parent, depth);
            node.source = leaf_of(key);
            node.height = height_of(key);
            nodes.push(node);
            if let Some(p) = parent {
                nodes[p].children.push(id);
            }
            // Reversed so the leftmost child is visited first.
            for child in children_of(key).into_iter().rev() {
                stack.push((child, Some(id), depth + 1));
            }
        }

        for id in (0..nodes.len()).rev() {
            let vector = match nodes[id].source {
                Some(src) => points.row(src).to_vec(),
                None => average_all(
                    nodes[id]
                        .children
                        .iter()
                        .map(|&c| nodes[c].canonical.as_slice()),
                ),
            };
            nodes[id].canonical = vector;
        }

        let n_leaves = nodes.iter().filter(|n| n.source.is_some()).count();
        Self { nodes, n_leaves }
    }

    /// Attach axis labels to the leaves, by source index.
    pub fn set_leaf_labels(&mut self, labels: &[String]) {
        for node in &mut self.nodes {
            if let Some(label) = node.source.and_then(|s| labels.get(s)) {
                node.label = Some(label.clone());
            }
        }
    }

    /// Root id.
    pub fn root(&self) -> NodeId {
        0
    }

    /// Node by id.
    ///
    /// # Panics
    ///
    /// If `id` is not in the tree; see [`ClusterTree::get`].
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    /// Node by id, if it exists.
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Result<&mut TreeNode> {
        self.nodes.get_mut(id).ok_or(Error::UnknownNode(id))
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes. Never true for a built tree.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    /// Number of internal nodes.
    pub fn n_internal(&self) -> usize {
        self.nodes.len() - self.n_leaves
    }

    /// All nodes in id order.
    pub fn iter(&self) -> impl Iterator<Item = &TreeNode> {
        self.nodes.iter()
    }

    /// Leaf ids, left to right, ignoring collapse state.
    pub fn leaves(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| n.source.is_some())
            .map(|n| n.id)
            .collect()
    }

    /// Source indices of the leaves, left to right.
    pub fn leaf_order(&self) -> Vec<usize> {
        self.nodes.iter().filter_map(|n| n.source).collect()
    }

    /// Nodes drawn as rows/columns: leaves and collapsed nodes not hidden
    /// under a collapsed ancestor, left to right.
    pub fn visible_leaves(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk_active(|node| {
            if node.active_children().is_empty() {
                out.push(node.id);
            }
        });
        out
    }

    /// Every node reachable through active children, in pre-order.
    pub fn visible_nodes(&self) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.walk_active(|node| out.push(node.id));
        out
    }

    fn walk_active(&self, mut visit: impl FnMut(&TreeNode)) {
        if self.nodes.is_empty() {
            return;
        }
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            visit(node);
            stack.extend(node.active_children().iter().rev());
        }
    }

    /// Leaf source indices under `id`, left to right.
    ///
    /// # Panics
    ///
    /// If `id` is not in the tree.
    pub fn subtree_sources(&self, id: NodeId) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            out.extend(node.source);
            stack.extend(node.children.iter().rev());
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    fn points(values: &[f64]) -> Array2<Cell> {
        Array2::from_shape_fn((values.len(), 1), |(i, _)| Some(values[i]))
    }

    #[test]
    fn test_from_dendrogram_preorder_ids() {
        let p = points(&[0.0, 1.0, 10.0]);
        let mut dendro = Dendrogram::new(3);
        dendro.add_merge(0, 1, 1.0, 2);
        dendro.add_merge(3, 2, 9.5, 3);
        let tree = ClusterTree::from_dendrogram(&dendro, p.view()).unwrap();

        assert_eq!(tree.len(), 5);
        assert_eq!(tree.n_leaves(), 3);
        assert_eq!(tree.n_internal(), 2);
        assert_eq!(tree.node(0).children, vec![1, 4]);
        assert_eq!(tree.node(1).children, vec![2, 3]);
        assert_eq!(tree.leaf_order(), vec![0, 1, 2]);
        assert_eq!(tree.node(0).height, 9.5);
        assert_eq!(tree.node(1).canonical, vec![Some(0.5)]);
        assert_eq!(tree.node(0).canonical, vec![Some(5.25)]);
        assert_eq!(tree.node(4).depth, 1);
        assert_eq!(tree.node(2).parent, Some(1));
    }

    #[test]
    fn test_single_leaf_tree() {
        let p = points(&[3.0]);
        let tree = ClusterTree::from_dendrogram(&Dendrogram::new(1), p.view()).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree.node(0).is_leaf());
        assert_eq!(tree.leaf_order(), vec![0]);
    }

    #[test]
    fn test_incomplete_dendrogram_rejected() {
        let p = points(&[0.0, 1.0, 2.0]);
        let mut dendro = Dendrogram::new(3);
        dendro.add_merge(0, 1, 1.0, 2);
        assert!(ClusterTree::from_dendrogram(&dendro, p.view()).is_err());
    }

    #[test]
    #[should_panic]
    fn test_subtree_sources_unknown_node_panics() {
        let tree = ClusterTree::from_dendrogram(&Dendrogram::new(1), points(&[1.0]).view()).unwrap();
        tree.subtree_sources(7);
    }

    #[test]
    fn test_from_groups() {
        let p = points(&[0.0, 10.0, 1.0, 20.0]);
        let tree = ClusterTree::from_groups(&[vec![0, 2], vec![1], vec![3]], p.view()).unwrap();
        assert_eq!(tree.node(0).children.len(), 3);
        assert_eq!(tree.leaf_order(), vec![0, 2, 1, 3]);
        assert_eq!(tree.node(1).canonical, vec![Some(0.5)]);
        assert_eq!(tree.n_leaves(), 4);
    }

    #[test]
    fn test_from_groups_rejects_bad_partition() {
        let p = points(&[0.0, 1.0]);
        assert!(ClusterTree::from_groups(&[vec![0]], p.view()).is_err());
        assert!(ClusterTree::from_groups(&[vec![0, 0, 1]], p.view()).is_err());
    }

    #[test]
    fn test_labels_and_subtree_sources() {
        let p = points(&[0.0, 1.0, 10.0]);
        let mut dendro = Dendrogram::new(3);
        dendro.add_merge(0, 1, 1.0, 2);
        dendro.add_merge(3, 2, 9.5, 3);
        let mut tree = ClusterTree::from_dendrogram(&dendro, p.view()).unwrap();
        tree.set_leaf_labels(&["a".into(), "b".into(), "c".into()]);
        assert_eq!(tree.node(4).label(), Some("c"));
        assert_eq!(tree.node(1).label(), None);
        assert_eq!(tree.subtree_sources(1), vec![0, 1]);
        assert_eq!(tree.visible_leaves(), vec![2, 3, 4]);
    }
}
