//! Clustering the rows of a matrix into a tree.
//!
//! Each axis of the heatmap is clustered on its own: rows by their row
//! vectors, columns by their column vectors. The result is a
//! [`ClusterTree`] whose left-to-right leaf order is used to permute the
//! matrix so that similar entities sit next to each other.
//!
//! ## Strategies
//!
//! | Strategy | Tree | Notes |
//! |----------|------|-------|
//! | [`HierarchicalClustering`] | binary, N-1 internal nodes | default, deterministic |
//! | [`Kmeans`] | root → k groups → leaves | seeded, needs k |
//!
//! Both treat missing cells the same way: a dimension counts only when
//! both vectors have it (see [`distance`]).
//!
//! ## Usage
//!
//! ```rust
//! use dendroheat::cluster::{ClusterResult, ClusteringMethod};
//! use ndarray::array;
//!
//! let points = array![
//!     [Some(0.0), Some(0.0)],
//!     [Some(10.0), Some(10.0)],
//!     [Some(1.0), Some(1.0)],
//! ];
//!
//! let result = ClusterResult::compute(&ClusteringMethod::default(), points.view()).unwrap();
//! assert_eq!(result.leaf_order, vec![0, 2, 1]);
//! ```

pub mod distance;
mod hierarchical;
mod kmeans;
mod traits;

use ndarray::ArrayView2;

pub use hierarchical::HierarchicalClustering;
pub use kmeans::Kmeans;
pub use traits::ClusterStrategy;

use crate::error::Result;
use crate::hierarchy::ClusterTree;
use crate::matrix::Cell;

/// Which [`ClusterStrategy`] to run on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ClusteringMethod {
    /// Agglomerative merge tree.
    #[default]
    Hierarchical,
    /// K-means groups under a common root.
    Partition {
        /// Number of clusters; clamped to the number of entities.
        k: usize,
        /// Seed for k-means++ initialisation.
        seed: u64,
    },
}

impl ClusteringMethod {
    /// The strategy object for this method.
    pub fn strategy(&self) -> Box<dyn ClusterStrategy> {
        match *self {
            ClusteringMethod::Hierarchical => Box::new(HierarchicalClustering::new()),
            ClusteringMethod::Partition { k, seed } => Box::new(Kmeans::new(k).with_seed(seed)),
        }
    }
}

/// A cluster tree and the permutation it induces.
#[derive(Debug, Clone)]
pub struct ClusterResult {
    /// The tree over the axis' entities.
    pub tree: ClusterTree,
    /// `leaf_order[i]` is the original index of the i-th leaf, left to right.
    pub leaf_order: Vec<usize>,
}

impl ClusterResult {
    /// Wrap a tree, reading its leaf order.
    pub fn from_tree(tree: ClusterTree) -> Self {
        let leaf_order = tree.leaf_order();
        Self { tree, leaf_order }
    }

    /// Cluster `points` with the given method.
    pub fn compute(method: &ClusteringMethod, points: ArrayView2<'_, Cell>) -> Result<Self> {
        Self::with_strategy(method.strategy().as_ref(), points)
    }

    /// Cluster `points` with any strategy.
    pub fn with_strategy(
        strategy: &dyn ClusterStrategy,
        points: ArrayView2<'_, Cell>,
    ) -> Result<Self> {
        strategy.cluster(points).map(Self::from_tree)
    }
}
