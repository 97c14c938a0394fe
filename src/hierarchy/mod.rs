//! Tree structures produced by clustering.
//!
//! - [`Dendrogram`]: the raw merge history of agglomerative clustering
//! - [`ClusterTree`]: an arena of [`TreeNode`]s addressed by [`NodeId`],
//!   built from a dendrogram or a flat partition
//!
//! ```text
//!         0 (root)
//!        / \
//!       1   4
//!      / \
//!     2   3       ids in depth-first pre-order
//! ```
//!
//! Each node carries the vector it stands for: its matrix row for a leaf,
//! the missing-aware average of its children otherwise.

mod dendrogram;
mod node;
mod tree;

pub use dendrogram::{Dendrogram, Merge};
pub use node::{NodeId, TreeNode, COLLAPSED_LABEL};
pub use tree::ClusterTree;
