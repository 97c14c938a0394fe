//! Hierarchical (agglomerative) clustering.
//!
//! Bottom-up clustering that builds a **dendrogram** by repeatedly merging
//! the two closest clusters until one remains.
//!
//! # Representatives
//!
//! Each cluster is represented by one vector. A leaf's is its matrix row; a
//! merged cluster's is the elementwise [`average`] of its two children's
//! representatives, regardless of their sizes (WPGMC, "median" linkage):
//!
//! ```text
//! rep(A ∪ B) = (rep(A) + rep(B)) / 2        missing if either is missing
//! d(A, B)    = ||rep(A) - rep(B)||          over shared dimensions
//! ```
//!
//! # Determinism
//!
//! A cluster lives in the slot of its lowest original index. Among pairs at
//! the minimum distance, the lexicographically smallest `(slot_a, slot_b)`
//! merges first, and the lower slot becomes the left child. Same input,
//! same tree.
//!
//! # Cost
//!
//! O(n²) memory for the condensed distance matrix. Each slot caches its
//! nearest higher-slot neighbour, so a merge only rescans the slots whose
//! cached neighbour was one of the merged pair.

use ndarray::ArrayView2;
use tracing::debug;

use super::distance::euclidean_distance;
use super::traits::ClusterStrategy;
use crate::error::{Error, Result};
use crate::hierarchy::{ClusterTree, Dendrogram};
use crate::matrix::Cell;
use crate::reorder::average;

/// Agglomerative clustering with averaged representatives.
#[derive(Debug, Clone, Copy, Default)]
pub struct HierarchicalClustering;

impl HierarchicalClustering {
    /// Create a new hierarchical clusterer.
    pub fn new() -> Self {
        Self
    }

    /// Fit and return the full dendrogram.
    pub fn fit_dendrogram(&self, points: ArrayView2<'_, Cell>) -> Result<Dendrogram> {
        let n = points.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }

        let mut reps: Vec<Vec<Cell>> = points.rows().into_iter().map(|r| r.to_vec()).collect();
        let mut dist = Condensed::new(n);
        for i in 0..n {
            for j in (i + 1)..n {
                dist.set(i, j, euclidean_distance(&reps[i], &reps[j]));
            }
        }

        let mut active = vec![true; n];
        let mut cluster_id: Vec<usize> = (0..n).collect();
        let mut size = vec![1usize; n];
        let mut nearest: Vec<Option<(f64, usize)>> =
            (0..n).map(|i| nearest_above(i, &active, &dist)).collect();

        let mut dendro = Dendrogram::new(n);
        for _ in 1..n {
            let Some((a, b, d)) = closest_pair(&active, &nearest) else {
                break;
            };

            reps[a] = average(&reps[a], &reps[b]);
            active[b] = false;
            nearest[b] = None;
            size[a] += size[b];
            cluster_id[a] = dendro.add_merge(cluster_id[a], cluster_id[b], d, size[a]);

            for k in (0..n).filter(|&k| active[k] && k != a) {
                dist.set(a, k, euclidean_distance(&reps[a], &reps[k]));
            }

            for i in (0..n).filter(|&i| active[i] && i != a) {
                let Some((best, j)) = nearest[i] else {
                    continue;
                };
                if j == b || (i < a && j == a) {
                    nearest[i] = nearest_above(i, &active, &dist);
                } else if i < a {
                    let d = dist.get(i, a);
                    if d < best || (d == best && a < j) {
                        nearest[i] = Some((d, a));
                    }
                }
            }
            nearest[a] = nearest_above(a, &active, &dist);
        }

        Ok(dendro)
    }
}

impl ClusterStrategy for HierarchicalClustering {
    fn cluster(&self, points: ArrayView2<'_, Cell>) -> Result<ClusterTree> {
        let dendro = self.fit_dendrogram(points)?;
        debug!(
            items = dendro.n_items(),
            merges = dendro.n_merges(),
            "data clustered (hierarchical)"
        );
        ClusterTree::from_dendrogram(&dendro, points)
    }

    fn name(&self) -> &'static str {
        "hierarchical"
    }
}

/// Global minimum over the cached neighbours; lowest slot wins ties.
fn closest_pair(active: &[bool], nearest: &[Option<(f64, usize)>]) -> Option<(usize, usize, f64)> {
    let mut best: Option<(usize, usize, f64)> = None;
    for (i, entry) in nearest.iter().enumerate() {
        let (Some((d, j)), true) = (entry, active[i]) else {
            continue;
        };
        if best.map_or(true, |(_, _, bd)| *d < bd) {
            best = Some((i, *j, *d));
        }
    }
    best
}

/// Nearest active slot above `i`; lowest slot wins ties.
fn nearest_above(i: usize, active: &[bool], dist: &Condensed) -> Option<(f64, usize)> {
    let mut best: Option<(f64, usize)> = None;
    for j in (i + 1)..active.len() {
        if !active[j] {
            continue;
        }
        let d = dist.get(i, j);
        if best.map_or(true, |(bd, _)| d < bd) {
            best = Some((d, j));
        }
    }
    best
}

/// Upper triangle of a symmetric matrix, row-major. Length is N-choose-2.
struct Condensed {
    n: usize,
    values: Vec<f64>,
}

impl Condensed {
    fn new(n: usize) -> Self {
        Self {
            n,
            values: vec![0.0; n * n.saturating_sub(1) / 2],
        }
    }

    #[inline]
    fn index(&self, i: usize, j: usize) -> usize {
        let (i, j) = if i < j { (i, j) } else { (j, i) };
        self.n * i - i * (i + 1) / 2 + j - i - 1
    }

    fn get(&self, i: usize, j: usize) -> f64 {
        self.values[self.index(i, j)]
    }

    fn set(&mut self, i: usize, j: usize, d: f64) {
        let idx = self.index(i, j);
        self.values[idx] = d;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use proptest::prelude::*;

    fn matrix(rows: &[&[f64]]) -> Array2<Cell> {
        Array2::from_shape_fn((rows.len(), rows[0].len()), |(i, j)| Some(rows[i][j]))
    }

    #[test]
    fn test_hierarchical_basic() {
        let data = matrix(&[&[0.0, 0.0], &[10.0, 10.0], &[1.0, 1.0], &[11.0, 11.0]]);
        let dendro = HierarchicalClustering::new().fit_dendrogram(data.view()).unwrap();

        let merges: Vec<_> = dendro.merges().copied().collect();
        assert_eq!(merges.len(), 3);
        assert_eq!((merges[0].cluster_a, merges[0].cluster_b), (0, 2));
        assert_eq!((merges[1].cluster_a, merges[1].cluster_b), (1, 3));
        assert_eq!((merges[2].cluster_a, merges[2].cluster_b), (4, 5));
        assert_eq!(merges[2].size, 4);
    }

    #[test]
    fn test_leaf_order_groups_similar_rows() {
        let data = matrix(&[&[0.0, 0.0], &[10.0, 10.0], &[1.0, 1.0], &[11.0, 11.0]]);
        let tree = HierarchicalClustering::new().cluster(data.view()).unwrap();
        assert_eq!(tree.leaf_order(), vec![0, 2, 1, 3]);
    }

    #[test]
    fn test_ties_break_on_lowest_index() {
        // All pairwise distances equal.
        let data = matrix(&[&[0.0], &[0.0], &[0.0]]);
        let dendro = HierarchicalClustering::new().fit_dendrogram(data.view()).unwrap();
        let first = dendro.merges().next().unwrap();
        assert_eq!((first.cluster_a, first.cluster_b), (0, 1));
    }

    #[test]
    fn test_merged_representative_is_average() {
        let data = matrix(&[&[0.0], &[2.0], &[100.0]]);
        let tree = HierarchicalClustering::new().cluster(data.view()).unwrap();
        assert_eq!(tree.node(1).canonical, vec![Some(1.0)]);
        assert_eq!(tree.node(0).canonical, vec![Some(50.5)]);
    }

    #[test]
    fn test_missing_values_cluster() {
        let mut data = matrix(&[&[1.0, 5.0], &[1.0, 9.0], &[50.0, 50.0]]);
        data[[0, 1]] = None;
        let tree = HierarchicalClustering::new().cluster(data.view()).unwrap();
        assert_eq!(tree.n_leaves(), 3);
        assert_eq!(tree.node(1).canonical, vec![Some(1.0), None]);
    }

    #[test]
    fn test_empty_input_error() {
        let data: Array2<Cell> = Array2::from_elem((0, 3), None);
        let result = HierarchicalClustering::new().fit_dendrogram(data.view());
        assert_eq!(result.unwrap_err(), Error::EmptyInput);
    }

    #[test]
    fn test_single_row() {
        let data = matrix(&[&[1.0, 2.0]]);
        let tree = HierarchicalClustering::new().cluster(data.view()).unwrap();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree.n_internal(), 0);
    }

    proptest! {
        #[test]
        fn tree_shape_and_leaf_order(
            rows in 1usize..25,
            cols in 1usize..6,
            values in proptest::collection::vec(proptest::option::weighted(0.8, -100.0f64..100.0), 150),
        ) {
            let data = Array2::from_shape_fn((rows, cols), |(i, j)| values[(i * cols + j) % values.len()]);
            let tree = HierarchicalClustering::new().cluster(data.view()).unwrap();

            prop_assert_eq!(tree.n_leaves(), rows);
            prop_assert_eq!(tree.n_internal(), rows - 1);
            prop_assert!(tree.iter().all(|n| n.is_leaf() || n.children.len() == 2));

            let mut order = tree.leaf_order();
            order.sort_unstable();
            prop_assert_eq!(order, (0..rows).collect::<Vec<_>>());
        }

        #[test]
        fn clustering_is_deterministic(
            values in proptest::collection::vec(-10.0f64..10.0, 2..30),
        ) {
            let data = Array2::from_shape_fn((values.len(), 1), |(i, _)| Some(values[i]));
            let a = HierarchicalClustering::new().cluster(data.view()).unwrap();
            let b = HierarchicalClustering::new().cluster(data.view()).unwrap();
            prop_assert_eq!(a.leaf_order(), b.leaf_order());
        }
    }
}
