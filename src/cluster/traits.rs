//! Clustering traits.

use ndarray::ArrayView2;

use crate::error::Result;
use crate::hierarchy::ClusterTree;
use crate::matrix::Cell;

/// A way of arranging the rows of a matrix into a cluster tree.
pub trait ClusterStrategy {
    /// Build a tree whose leaves are the rows of `points`, one per row.
    ///
    /// Fails with [`Error::EmptyInput`](crate::Error::EmptyInput) when
    /// `points` has no rows.
    fn cluster(&self, points: ArrayView2<'_, Cell>) -> Result<ClusterTree>;

    /// Short name, for logs.
    fn name(&self) -> &'static str;
}
