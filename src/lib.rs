//! # dendroheat
//!
//! Clustered heatmaps from sparse pairwise observations.
//!
//! Input is delimited text where each line pairs a row entity with a column
//! entity and carries numeric fields. `dendroheat` turns it into a dense
//! matrix, clusters the rows and the columns into trees so that similar
//! entities end up adjacent, and hands an ordered matrix, both trees with
//! coordinates, and a color scale to a [`Renderer`]. Subtrees can be
//! collapsed into one aggregate row/column and expanded again.
//!
//! Drawing is not part of this crate.
//!
//! ```rust
//! use dendroheat::{DendroHeatmap, HeatmapFrame, Renderer, Selection};
//!
//! struct Noop;
//! impl Renderer for Noop {
//!     fn clear(&mut self) {}
//!     fn render(&mut self, _frame: &HeatmapFrame) {}
//! }
//!
//! let text = "#id;group;score\nA;X;10\nB;X;20\nA;Y;5\nB;Y;15\n";
//! let mut engine = DendroHeatmap::new(text, Noop);
//! let frame = engine
//!     .display(&Selection::new("id", "group", "score"))
//!     .unwrap()
//!     .unwrap();
//!
//! assert_eq!(frame.ordered_matrix().dim(), (2, 2));
//! assert_eq!(frame.rows().result.tree.n_leaves(), 2);
//! ```

pub mod cluster;
pub mod collapse;
pub mod color;
/// Error types used across `dendroheat`.
pub mod error;
pub mod heatmap;
pub mod hierarchy;
pub mod layout;
pub mod matrix;
pub mod parse;
pub mod reorder;

pub use cluster::{ClusterResult, ClusterStrategy, ClusteringMethod, HierarchicalClustering, Kmeans};
pub use collapse::{NodeState, Transition};
pub use color::{CellColor, ColorScale, ColorScheme, Rgb};
pub use error::{Error, Result};
pub use heatmap::{Axis, AxisView, DendroHeatmap, EngineConfig, HeatmapFrame, Renderer, Selection};
pub use hierarchy::{ClusterTree, Dendrogram, NodeId, TreeNode};
pub use layout::{layout, Layout, LayoutConfig, Position};
pub use matrix::{build_matrix, Cell, DenseMatrix, DuplicateMode, Extent, Filter, FilterOp, Filters};
pub use parse::{parse_headers, parse_records, Header, ParsedTable, Record};
pub use reorder::{average, reorder, reorder_array};
