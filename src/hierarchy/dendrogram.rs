//! Merge history of agglomerative clustering.
//!
//! Cluster ids follow the SciPy/MATLAB convention: leaves are `0..n`, and
//! the `i`-th merge creates cluster `n + i`.

/// A dendrogram representing hierarchical cluster merges.
///
/// Each merge combines two clusters into one, recording:
/// - Which clusters were merged
/// - The distance at which they merged
/// - The size of the resulting cluster
#[derive(Debug, Clone)]
pub struct Dendrogram {
    merges: Vec<Merge>,
    n_items: usize,
}

/// A single merge operation in the dendrogram.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    /// Cluster placed on the left of the new node.
    pub cluster_a: usize,
    /// Cluster placed on the right of the new node.
    pub cluster_b: usize,
    /// Distance at which the merge occurred.
    pub distance: f64,
    /// Size of resulting cluster.
    pub size: usize,
}

impl Dendrogram {
    /// Create a new dendrogram for n items.
    pub fn new(n_items: usize) -> Self {
        Self {
            merges: Vec::with_capacity(n_items.saturating_sub(1)),
            n_items,
        }
    }

    /// Record a merge operation. Returns the id of the new cluster.
    pub fn add_merge(
        &mut self,
        cluster_a: usize,
        cluster_b: usize,
        distance: f64,
        size: usize,
    ) -> usize {
        self.merges.push(Merge {
            cluster_a,
            cluster_b,
            distance,
            size,
        });
        self.n_items + self.merges.len() - 1
    }

    /// Number of original items.
    pub fn n_items(&self) -> usize {
        self.n_items
    }

    /// Number of merges recorded.
    pub fn n_merges(&self) -> usize {
        self.merges.len()
    }

    /// Whether every item has been merged into a single cluster.
    pub fn is_complete(&self) -> bool {
        self.n_items > 0 && self.merges.len() + 1 == self.n_items
    }

    /// Id of the final cluster, if the dendrogram is complete.
    pub fn root(&self) -> Option<usize> {
        self.is_complete()
            .then(|| self.n_items + self.merges.len() - 1)
    }

    /// The two clusters merged into `cluster`, or `None` for a leaf.
    pub fn children(&self, cluster: usize) -> Option<(usize, usize)> {
        let m = self.merges.get(cluster.checked_sub(self.n_items)?)?;
        Some((m.cluster_a, m.cluster_b))
    }

    /// Iterate over merges.
    pub fn merges(&self) -> impl Iterator<Item = &Merge> {
        self.merges.iter()
    }

    /// Get the merge distances (for visualization).
    pub fn distances(&self) -> Vec<f64> {
        self.merges.iter().map(|m| m.distance).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dendrogram_creation() {
        let dendro = Dendrogram::new(5);
        assert_eq!(dendro.n_items(), 5);
        assert_eq!(dendro.n_merges(), 0);
        assert!(!dendro.is_complete());
        assert_eq!(dendro.root(), None);
    }

    #[test]
    fn test_dendrogram_merge() {
        let mut dendro = Dendrogram::new(4);
        assert_eq!(dendro.add_merge(0, 1, 0.5, 2), 4);
        assert_eq!(dendro.add_merge(2, 3, 0.7, 2), 5);
        assert_eq!(dendro.add_merge(4, 5, 1.0, 4), 6);

        assert_eq!(dendro.n_merges(), 3);
        assert_eq!(dendro.root(), Some(6));
        assert_eq!(dendro.children(6), Some((4, 5)));
        assert_eq!(dendro.children(2), None);
        assert_eq!(dendro.distances(), vec![0.5, 0.7, 1.0]);
    }

    #[test]
    fn test_single_item_is_its_own_root() {
        let dendro = Dendrogram::new(1);
        assert!(dendro.is_complete());
        assert_eq!(dendro.root(), Some(0));
    }
}
