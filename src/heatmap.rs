//! The clustered heatmap engine.
//!
//! [`DendroHeatmap`] owns everything computed for one input text and one
//! render target:
//!
//! ```text
//! text ──parse──▶ table ──build──▶ rows / cols matrices
//!                                      │ cluster each axis
//!                                      ▼
//!                 frame ◀──reorder── trees + layouts
//! ```
//!
//! Every [`display`](DendroHeatmap::display) rebuilds the frame from the
//! text. [`collapse`](DendroHeatmap::collapse) and
//! [`expand`](DendroHeatmap::expand) change one tree, then redo layout for
//! that axis and the ordered matrix. The renderer is called only after the
//! new frame is complete.

use ndarray::{Array2, ArrayView1, ArrayView2};
use tracing::debug;

use crate::cluster::{ClusterResult, ClusteringMethod};
use crate::collapse::{self, Transition};
use crate::color::{CellColor, ColorScale, ColorScheme};
use crate::error::{Error, Result};
use crate::hierarchy::{ClusterTree, NodeId};
use crate::layout::{layout, Layout, LayoutConfig};
use crate::matrix::{build_matrix, Cell, DenseMatrix, DuplicateMode, Filter, Filters};
use crate::parse::{field_index, parse_headers, parse_records, Header};
use crate::reorder::aggregate;

/// The collaborator that draws frames.
pub trait Renderer {
    /// Remove everything previously drawn.
    fn clear(&mut self);

    /// Draw a complete frame.
    fn render(&mut self, frame: &HeatmapFrame);
}

/// One of the two matrix axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Axis {
    /// Row entities.
    Rows,
    /// Column entities.
    Cols,
}

/// Field choices and policies for one display.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Selection {
    /// Header whose values label the rows.
    pub row_field: String,
    /// Header whose values label the columns.
    pub col_field: String,
    /// Numeric header whose values fill the cells.
    pub value_field: String,
    /// Which value wins for repeated cells.
    pub duplicate_mode: DuplicateMode,
    /// Per-field numeric filters.
    pub filters: Filters,
    /// Color scheme for the cells.
    pub scheme: ColorScheme,
}

impl Selection {
    /// Select row, column and value fields with default policies.
    pub fn new(
        row_field: impl Into<String>,
        col_field: impl Into<String>,
        value_field: impl Into<String>,
    ) -> Self {
        Self {
            row_field: row_field.into(),
            col_field: col_field.into(),
            value_field: value_field.into(),
            duplicate_mode: DuplicateMode::default(),
            filters: Filters::new(),
            scheme: ColorScheme::default(),
        }
    }

    /// Set the duplicate mode.
    pub fn with_duplicate_mode(mut self, mode: DuplicateMode) -> Self {
        self.duplicate_mode = mode;
        self
    }

    /// Add a filter on `field`.
    pub fn with_filter(mut self, field: impl Into<String>, filter: Filter) -> Self {
        self.filters.insert(field.into(), filter);
        self
    }

    /// Set the color scheme.
    pub fn with_scheme(mut self, scheme: ColorScheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Check the selection against the headers before any work is done.
    pub fn validate(&self, headers: &[Header]) -> Result<()> {
        if self.row_field == self.col_field
            || self.col_field == self.value_field
            || self.row_field == self.value_field
        {
            return Err(Error::FieldsNotDistinct);
        }
        for field in [&self.row_field, &self.col_field] {
            if field_index(headers, field).is_none() {
                return Err(Error::UnknownField(field.clone()));
            }
        }
        let value = field_index(headers, &self.value_field)
            .map(|i| &headers[i])
            .ok_or_else(|| Error::UnknownField(self.value_field.clone()))?;
        if !value.is_numeric {
            return Err(Error::NonNumericValueField(self.value_field.clone()));
        }
        Ok(())
    }
}

/// Engine settings that do not change between displays.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EngineConfig {
    /// Node placement.
    pub layout: LayoutConfig,
    /// Clustering applied to both axes.
    pub method: ClusteringMethod,
}

impl EngineConfig {
    /// Set the layout.
    pub fn with_layout(mut self, layout: LayoutConfig) -> Self {
        self.layout = layout;
        self
    }

    /// Set the clustering method.
    pub fn with_method(mut self, method: ClusteringMethod) -> Self {
        self.method = method;
        self
    }
}

/// Clustering and layout for one axis.
#[derive(Debug, Clone)]
pub struct AxisView {
    /// Tree and full leaf order.
    pub result: ClusterResult,
    /// Original labels, by original index.
    pub labels: Vec<String>,
    layout: Layout,
}

impl AxisView {
    /// The axis tree.
    pub fn tree(&self) -> &ClusterTree {
        &self.result.tree
    }

    /// Node positions.
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Visible leaf nodes, in display order.
    pub fn slots(&self) -> &[NodeId] {
        self.layout.slots()
    }

    /// Labels of the visible slots, in display order.
    pub fn ordered_labels(&self) -> Vec<String> {
        self.slots()
            .iter()
            .map(|&id| self.tree().node(id).display_label().to_string())
            .collect()
    }
}

/// Everything the renderer needs for one draw.
#[derive(Debug, Clone)]
pub struct HeatmapFrame {
    /// The unordered matrices.
    pub matrix: DenseMatrix,
    rows: AxisView,
    cols: AxisView,
    ordered: Array2<Cell>,
    scale: ColorScale,
}

impl HeatmapFrame {
    /// One axis.
    pub fn axis(&self, axis: Axis) -> &AxisView {
        match axis {
            Axis::Rows => &self.rows,
            Axis::Cols => &self.cols,
        }
    }

    fn axis_mut(&mut self, axis: Axis) -> &mut AxisView {
        match axis {
            Axis::Rows => &mut self.rows,
            Axis::Cols => &mut self.cols,
        }
    }

    /// Row axis.
    pub fn rows(&self) -> &AxisView {
        &self.rows
    }

    /// Column axis.
    pub fn cols(&self) -> &AxisView {
        &self.cols
    }

    /// Matrix in display order: one row per visible row slot, one column per visible column slot.
    pub fn ordered_matrix(&self) -> &Array2<Cell> {
        &self.ordered
    }

    /// A visible node's vector laid out along the other axis' display order.
    pub fn ordered_vector(&self, axis: Axis, id: NodeId) -> Option<ArrayView1<'_, Cell>> {
        let pos = self.axis(axis).slots().iter().position(|&s| s == id)?;
        Some(match axis {
            Axis::Rows => self.ordered.row(pos),
            Axis::Cols => self.ordered.column(pos),
        })
    }

    /// The color scale.
    pub fn scale(&self) -> &ColorScale {
        &self.scale
    }

    /// Color of the ordered cell at display position `(row, col)`.
    pub fn cell_color(&self, row: usize, col: usize) -> Option<CellColor> {
        self.ordered
            .get((row, col))
            .map(|&cell| self.scale.color(cell))
    }

    fn relayout(&mut self, axis: Axis, config: &LayoutConfig) {
        let view = self.axis_mut(axis);
        view.layout = layout(&view.result.tree, config);
        self.ordered = ordered_matrix(&self.matrix, &self.rows, &self.cols);
    }
}

/// Matrix in display order, aggregating collapsed slots on either axis.
///
/// A row slot presents its node's vector over all original columns; a
/// collapsed column slot then folds that vector over the column subtree.
/// Because both folds use the same pairwise averaging, the cell is the same
/// whichever axis is folded first.
fn ordered_matrix(matrix: &DenseMatrix, rows: &AxisView, cols: &AxisView) -> Array2<Cell> {
    let row_slots = rows.slots();
    let col_slots = cols.slots();
    let mut out = Array2::from_elem((row_slots.len(), col_slots.len()), None);

    for (i, &r) in row_slots.iter().enumerate() {
        let row_node = rows.tree().node(r);
        let vector: Vec<Cell> = match row_node.source {
            Some(src) => matrix.rows.row(src).to_vec(),
            None => row_node.vector().to_vec(),
        };
        for (j, &c) in col_slots.iter().enumerate() {
            let col_node = cols.tree().node(c);
            out[[i, j]] = match col_node.source {
                Some(src) => vector.get(src).copied().flatten(),
                None => aggregate(cols.tree(), c, &|src| vector.get(src).copied().flatten()),
            };
        }
    }
    out
}

/// Clustered heatmap over one input text, drawing into one renderer.
pub struct DendroHeatmap<R: Renderer> {
    text: String,
    headers: Vec<Header>,
    config: EngineConfig,
    renderer: R,
    frame: Option<HeatmapFrame>,
}

impl<R: Renderer> DendroHeatmap<R> {
    /// Bind `text` to `renderer`, clearing whatever the renderer showed.
    ///
    /// Empty text is accepted: there are then no headers and
    /// [`display`](Self::display) does nothing.
    pub fn new(text: impl Into<String>, renderer: R) -> Self {
        Self::with_config(text, renderer, EngineConfig::default())
    }

    /// Like [`new`](Self::new) with explicit settings.
    pub fn with_config(text: impl Into<String>, mut renderer: R, config: EngineConfig) -> Self {
        renderer.clear();
        let text = text.into();
        let headers = parse_headers(&text);
        debug!(headers = headers.len(), "bound input text");
        Self {
            text,
            headers,
            config,
            renderer,
            frame: None,
        }
    }

    /// Headers of the input.
    pub fn headers(&self) -> &[Header] {
        &self.headers
    }

    /// Headers that may be used as the value field.
    pub fn value_fields(&self) -> impl Iterator<Item = &Header> {
        self.headers.iter().filter(|h| h.is_numeric)
    }

    /// The last frame, if anything was displayed.
    pub fn frame(&self) -> Option<&HeatmapFrame> {
        self.frame.as_ref()
    }

    /// The renderer.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Give the renderer back.
    pub fn into_renderer(self) -> R {
        self.renderer
    }

    /// Run the whole pipeline for `selection` and render the result.
    ///
    /// Returns `Ok(None)` without touching the renderer when the text is empty.
    /// Validation errors are returned before any work starts, and leave the
    /// previous frame in place.
    pub fn display(&mut self, selection: &Selection) -> Result<Option<&HeatmapFrame>> {
        if self.text.trim().is_empty() {
            return Ok(None);
        }
        selection.validate(&self.headers)?;

        let table = parse_records(
            &self.text,
            &self.headers,
            &selection.row_field,
            &selection.col_field,
        )?;
        debug!(
            rows = table.row_labels.len(),
            cols = table.col_labels.len(),
            value_sets = table.value_sets(),
            "parsed matrix"
        );

        let matrix = build_matrix(
            &table,
            &selection.value_field,
            selection.duplicate_mode,
            &selection.filters,
        )?;

        let rows = self.cluster_axis(matrix.rows.view(), &matrix.row_labels)?;
        let cols = self.cluster_axis(matrix.cols.view(), &matrix.col_labels)?;
        let ordered = ordered_matrix(&matrix, &rows, &cols);
        let scale = ColorScale::new(matrix.extent, selection.scheme);

        let frame = self.frame.insert(HeatmapFrame {
            matrix,
            rows,
            cols,
            ordered,
            scale,
        });
        self.renderer.clear();
        self.renderer.render(frame);
        Ok(Some(&*frame))
    }

    fn cluster_axis(&self, points: ArrayView2<'_, Cell>, labels: &[String]) -> Result<AxisView> {
        let mut result = ClusterResult::compute(&self.config.method, points)?;
        result.tree.set_leaf_labels(labels);
        let layout = layout(&result.tree, &self.config.layout);
        Ok(AxisView {
            result,
            labels: labels.to_vec(),
            layout,
        })
    }

    /// Collapse node `id` on `axis`.
    pub fn collapse(&mut self, axis: Axis, id: NodeId) -> Result<&HeatmapFrame> {
        self.transition(axis, id, collapse::collapse)
    }

    /// Expand node `id` on `axis`.
    pub fn expand(&mut self, axis: Axis, id: NodeId) -> Result<&HeatmapFrame> {
        self.transition(axis, id, collapse::expand)
    }

    /// Collapse or expand node `id` on `axis`, whichever applies.
    pub fn toggle(&mut self, axis: Axis, id: NodeId) -> Result<&HeatmapFrame> {
        self.transition(axis, id, collapse::toggle)
    }

    fn transition(
        &mut self,
        axis: Axis,
        id: NodeId,
        apply: fn(&mut ClusterTree, NodeId) -> Result<Transition>,
    ) -> Result<&HeatmapFrame> {
        let layout_config = self.config.layout;
        let frame = self.frame.as_mut().ok_or(Error::NotDisplayed)?;
        let transition = apply(&mut frame.axis_mut(axis).result.tree, id)?;
        if transition.is_change() {
            frame.relayout(axis, &layout_config);
            debug!(?axis, ?transition, "re-laid out after transition");
            self.renderer.render(frame);
        }
        Ok(&*frame)
    }
}
