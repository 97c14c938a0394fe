//! Reordering and missing-aware aggregation.
//!
//! Clustering yields a leaf order per axis. Everything the renderer gets is
//! laid out in that order: the matrix, the label arrays, and each node's
//! vector over the other axis.

use ndarray::Array2;

use crate::hierarchy::{ClusterTree, NodeId};
use crate::matrix::Cell;

/// New matrix with `result[[i, j]] = matrix[[row_order[i], col_order[j]]]`.
///
/// The orders may select a subset; `reorder(m, &[0], &order)` reorders a
/// single row.
///
/// # Panics
///
/// If an index in either order is out of bounds.
pub fn reorder<T: Clone>(matrix: &Array2<T>, row_order: &[usize], col_order: &[usize]) -> Array2<T> {
    Array2::from_shape_fn((row_order.len(), col_order.len()), |(i, j)| {
        matrix[[row_order[i], col_order[j]]].clone()
    })
}

/// New array with `result[i] = arr[order[i]]`.
///
/// # Panics
///
/// If an index in `order` is out of bounds.
pub fn reorder_array<T: Clone>(arr: &[T], order: &[usize]) -> Vec<T> {
    order.iter().map(|&i| arr[i].clone()).collect()
}

/// Whether `order` is a permutation of `0..order.len()`.
pub fn is_permutation(order: &[usize]) -> bool {
    let mut seen = vec![false; order.len()];
    order.iter().all(|&i| {
        i < seen.len() && !std::mem::replace(&mut seen[i], true)
    })
}

/// The permutation that undoes `order`: `reorder_array(reorder_array(a, p), inverse(p)) == a`.
///
/// `order` must be a permutation.
pub fn inverse_permutation(order: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; order.len()];
    for (pos, &i) in order.iter().enumerate() {
        inverse[i] = pos;
    }
    inverse
}

/// Mean of two values without overflowing near `f64::MAX`.
fn midpoint(x: f64, y: f64) -> f64 {
    x / 2.0 + y / 2.0
}

/// Elementwise mean, missing wherever either side is missing.
///
/// Vectors of different lengths are averaged over the shorter length.
pub fn average(a: &[Cell], b: &[Cell]) -> Vec<Cell> {
    a.iter()
        .zip(b)
        .map(|(x, y)| match (x, y) {
            (Some(x), Some(y)) => Some(midpoint(*x, *y)),
            _ => None,
        })
        .collect()
}

/// Fold vectors left to right with [`average`].
pub fn average_all<'a>(mut vectors: impl Iterator<Item = &'a [Cell]>) -> Vec<Cell> {
    let Some(first) = vectors.next() else {
        return Vec::new();
    };
    vectors.fold(first.to_vec(), |acc, v| average(&acc, v))
}

/// Aggregate one scalar per leaf over the subtree at `node`.
///
/// Leaves contribute `leaf_value(source)`. Internal nodes fold their
/// children's aggregates with the same rule as [`average`], so the result
/// for a cell equals the corresponding entry of the node's aggregate vector.
///
/// # Panics
///
/// If `node` is not in `tree`.
pub fn aggregate(
    tree: &ClusterTree,
    node: NodeId,
    leaf_value: &impl Fn(usize) -> Cell,
) -> Cell {
    let n = tree.node(node);
    if let Some(src) = n.source {
        return leaf_value(src);
    }
    let mut values = n.children.iter().map(|&c| aggregate(tree, c, leaf_value));
    let first = values.next().flatten();
    values.fold(first, |acc, v| match (acc, v) {
        (Some(a), Some(b)) => Some(midpoint(a, b)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use proptest::prelude::*;

    #[test]
    fn test_reorder_matrix() {
        let m = array![[1, 2, 3], [4, 5, 6]];
        let r = reorder(&m, &[1, 0], &[2, 0, 1]);
        assert_eq!(r, array![[6, 4, 5], [3, 1, 2]]);
    }

    #[test]
    fn test_reorder_single_row() {
        let m = array![[1, 2, 3]];
        assert_eq!(reorder(&m, &[0], &[2, 1, 0]), array![[3, 2, 1]]);
    }

    #[test]
    fn test_average_missing_aware() {
        let a = [Some(1.0), None, Some(4.0)];
        let b = [Some(3.0), Some(2.0), None];
        assert_eq!(average(&a, &b), vec![Some(2.0), None, None]);
    }

    #[test]
    fn test_average_all() {
        let a = [Some(0.0)];
        let b = [Some(4.0)];
        let c = [Some(8.0)];
        let v = average_all([&a[..], &b[..], &c[..]].into_iter());
        assert_eq!(v, vec![Some(5.0)]);
        assert!(average_all(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_average_near_max_stays_finite() {
        let big = [Some(1e308), Some(f64::MAX)];
        assert_eq!(average(&big, &big), vec![Some(1e308), Some(f64::MAX)]);

        let p: ndarray::Array2<Cell> = array![[Some(1e308)], [Some(1e308)], [Some(-1e308)]];
        let mut dendro = crate::hierarchy::Dendrogram::new(3);
        dendro.add_merge(0, 1, 0.0, 2);
        dendro.add_merge(3, 2, 1.0, 3);
        let tree = ClusterTree::from_dendrogram(&dendro, p.view()).unwrap();
        assert_eq!(tree.node(1).vector(), &[Some(1e308)]);
        assert_eq!(aggregate(&tree, 1, &|src| p[[src, 0]]), Some(1e308));
        assert_eq!(aggregate(&tree, 0, &|src| p[[src, 0]]), Some(0.0));
    }

    #[test]
    #[should_panic]
    fn test_aggregate_unknown_node_panics() {
        let p: ndarray::Array2<Cell> = array![[Some(1.0)]];
        let tree = ClusterTree::from_dendrogram(&crate::hierarchy::Dendrogram::new(1), p.view()).unwrap();
        aggregate(&tree, 3, &|_| None);
    }

    #[test]
    fn test_is_permutation() {
        assert!(is_permutation(&[2, 0, 1]));
        assert!(is_permutation(&[]));
        assert!(!is_permutation(&[0, 0]));
        assert!(!is_permutation(&[0, 2]));
    }

    proptest! {
        #[test]
        fn reorder_then_inverse_is_identity(
            labels in proptest::collection::vec("[a-z]{1,5}", 1..40),
            seed in any::<u64>(),
        ) {
            // Deterministic shuffle from the seed.
            let mut order: Vec<usize> = (0..labels.len()).collect();
            let mut s = seed;
            for i in (1..order.len()).rev() {
                s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
                order.swap(i, (s >> 33) as usize % (i + 1));
            }
            prop_assert!(is_permutation(&order));

            let shuffled = reorder_array(&labels, &order);
            let restored = reorder_array(&shuffled, &inverse_permutation(&order));
            prop_assert_eq!(restored, labels);
        }

        #[test]
        fn average_is_missing_iff_either_missing(
            a in proptest::collection::vec(proptest::option::of(-1e6f64..1e6), 0..20),
            b in proptest::collection::vec(proptest::option::of(-1e6f64..1e6), 0..20),
        ) {
            let avg = average(&a, &b);
            prop_assert_eq!(avg.len(), a.len().min(b.len()));
            for (k, v) in avg.iter().enumerate() {
                match (a[k], b[k]) {
                    (Some(x), Some(y)) => prop_assert_eq!(*v, Some(midpoint(x, y))),
                    _ => prop_assert_eq!(*v, None),
                }
            }
        }
    }
}
