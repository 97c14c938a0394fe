//! K-means clustering.
//!
//! Partitions rows into k clusters by minimizing **within-cluster sum of
//! squares**. An alternative to the agglomerative tree when a flat grouping
//! is wanted: as a [`ClusterStrategy`] it yields a two-level tree, one node
//! per cluster.
//!
//! # Lloyd's Algorithm
//!
//! 1. Initialize k centroids via k-means++
//! 2. **Assign**: Each row → nearest centroid
//! 3. **Update**: Each centroid → mean of assigned rows
//! 4. Repeat until centroids stop moving
//!
//! # Missing Cells
//!
//! Distances use only the dimensions present in both the row and the
//! centroid (see [`squared_distance`]). A centroid dimension is the mean of
//! the present values of its members, or missing when none has one.

use ndarray::{Array2, ArrayView2};
use rand::prelude::*;
use tracing::debug;

use super::distance::squared_distance;
use super::traits::ClusterStrategy;
use crate::error::{Error, Result};
use crate::hierarchy::ClusterTree;
use crate::matrix::Cell;

/// K-means clustering algorithm.
#[derive(Debug, Clone)]
pub struct Kmeans {
    /// Number of clusters.
    k: usize,
    /// Maximum iterations.
    max_iter: usize,
    /// Convergence tolerance.
    tol: f64,
    /// Random seed.
    seed: Option<u64>,
}

impl Kmeans {
    /// Create a new K-means clusterer.
    pub fn new(k: usize) -> Self {
        Self {
            k,
            max_iter: 100,
            tol: 1e-4,
            seed: None,
        }
    }

    /// Set maximum iterations.
    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    /// Set convergence tolerance.
    pub fn with_tol(mut self, tol: f64) -> Self {
        self.tol = tol;
        self
    }

    /// Set random seed for reproducibility.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Get the number of clusters.
    pub fn n_clusters(&self) -> usize {
        self.k
    }

    /// Initialize centroids using k-means++ algorithm.
    fn init_centroids(&self, data: &Array2<Cell>, rng: &mut impl Rng) -> Array2<Cell> {
        let n = data.nrows();
        let d = data.ncols();
        let mut centroids = Array2::from_elem((self.k, d), None);

        // First centroid: random point
        let first = rng.random_range(0..n);
        centroids.row_mut(0).assign(&data.row(first));

        // Remaining centroids: k-means++ selection
        for i in 1..self.k {
            let distances: Vec<f64> = data
                .rows()
                .into_iter()
                .map(|point| {
                    let point = point.to_vec();
                    let min_dist = (0..i)
                        .map(|c| squared_distance(&point, &centroids.row(c).to_vec()))
                        .fold(f64::INFINITY, f64::min);
                    // Rows sharing nothing with any centroid are never picked.
                    if min_dist.is_finite() {
                        min_dist
                    } else {
                        0.0
                    }
                })
                .collect();

            // Sample proportional to squared distance
            let total: f64 = distances.iter().sum();
            if total == 0.0 {
                let idx = rng.random_range(0..n);
                centroids.row_mut(i).assign(&data.row(idx));
                continue;
            }

            let threshold = rng.random::<f64>() * total;
            let mut cumsum = 0.0;
            let mut selected = 0;

            for (j, &d) in distances.iter().enumerate() {
                cumsum += d;
                if cumsum >= threshold {
                    selected = j;
                    break;
                }
            }

            centroids.row_mut(i).assign(&data.row(selected));
        }

        centroids
    }

    /// Fit the model and return one cluster label in `0..k` per row.
    pub fn fit_predict(&self, data: ArrayView2<'_, Cell>) -> Result<Vec<usize>> {
        let n = data.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        if self.k == 0 || self.k > n {
            return Err(Error::InvalidClusterCount {
                requested: self.k,
                n_items: n,
            });
        }

        let data = data.to_owned();
        let d = data.ncols();
        let rows: Vec<Vec<Cell>> = data.rows().into_iter().map(|r| r.to_vec()).collect();

        let mut rng: StdRng = match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_rng(&mut rand::rng()),
        };

        let mut centroids = self.init_centroids(&data, &mut rng);
        let mut labels = vec![0usize; n];

        for _iter in 0..self.max_iter {
            let centroid_rows: Vec<Vec<Cell>> =
                centroids.rows().into_iter().map(|r| r.to_vec()).collect();

            for (point, label) in rows.iter().zip(labels.iter_mut()) {
                let mut best_cluster = 0;
                let mut best_dist = f64::INFINITY;

                for (k, centroid) in centroid_rows.iter().enumerate() {
                    let dist = squared_distance(point, centroid);
                    if dist < best_dist {
                        best_dist = dist;
                        best_cluster = k;
                    }
                }
                *label = best_cluster;
            }

            // Update step: per-dimension mean over present values.
            let mut sums = Array2::<f64>::zeros((self.k, d));
            let mut counts = Array2::<usize>::zeros((self.k, d));
            let mut members = vec![0usize; self.k];

            for (point, &k) in rows.iter().zip(&labels) {
                members[k] += 1;
                for (j, v) in point.iter().enumerate() {
                    if let Some(v) = v {
                        sums[[k, j]] += v;
                        counts[[k, j]] += 1;
                    }
                }
            }

            let mut new_centroids = Array2::from_elem((self.k, d), None);
            for k in 0..self.k {
                if members[k] == 0 {
                    // Empty cluster: reinitialize randomly
                    let idx = rng.random_range(0..n);
                    new_centroids.row_mut(k).assign(&data.row(idx));
                    continue;
                }
                for j in 0..d {
                    if counts[[k, j]] > 0 {
                        new_centroids[[k, j]] = Some(sums[[k, j]] / counts[[k, j]] as f64);
                    }
                }
            }

            // Check convergence
            let shift: f64 = centroids
                .iter()
                .zip(new_centroids.iter())
                .map(|(a, b)| match (a, b) {
                    (Some(a), Some(b)) => (a - b).powi(2),
                    (None, None) => 0.0,
                    _ => f64::INFINITY,
                })
                .sum();

            centroids = new_centroids;

            if shift < self.tol {
                break;
            }
        }

        Ok(labels)
    }
}

impl ClusterStrategy for Kmeans {
    fn cluster(&self, points: ArrayView2<'_, Cell>) -> Result<ClusterTree> {
        let n = points.nrows();
        if n == 0 {
            return Err(Error::EmptyInput);
        }
        // More clusters than rows degrades to one cluster per row.
        let k = self.k.clamp(1, n);
        let labels = Kmeans { k, ..self.clone() }.fit_predict(points)?;

        let mut groups = vec![Vec::new(); k];
        for (i, &label) in labels.iter().enumerate() {
            groups[label].push(i);
        }
        debug!(
            items = n,
            clusters = groups.iter().filter(|g| !g.is_empty()).count(),
            "data clustered (k-means)"
        );
        ClusterTree::from_groups(&groups, points)
    }

    fn name(&self) -> &'static str {
        "k-means"
    }
}
