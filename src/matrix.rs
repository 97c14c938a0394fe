//! Sparse-to-dense matrix construction.
//!
//! Each record names one cell: its row label, its column label and a value.
//! The builder places those values into two dense matrices that are mutual
//! transposes:
//!
//! - `rows[[r, c]]`: one vector per row entity, clustered to order rows
//! - `cols[[c, r]]`: one vector per column entity, clustered to order columns
//!
//! Cells no record fills are [`None`]. There is no numeric sentinel for
//! "no data", so every arithmetic step downstream has to branch on it.
//!
//! # Policy
//!
//! | Situation | Outcome |
//! |-----------|---------|
//! | record fails a numeric filter | dropped before assignment |
//! | filter field not numeric in the record | record kept |
//! | unknown filter field, `none` operator | record kept |
//! | value field not numeric in the record | dropped, cell stays missing |
//! | two records hit one cell | resolved by [`DuplicateMode`] |

use std::collections::{BTreeMap, HashMap};

use ndarray::Array2;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::parse::{parse_number, ParsedTable};

/// A matrix cell: a value, or missing.
pub type Cell = Option<f64>;

/// Which value wins when several records target the same cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DuplicateMode {
    /// Keep the earliest record's value.
    First,
    /// Keep the latest record's value.
    #[default]
    Last,
    /// Keep the smallest value.
    Min,
    /// Keep the largest value.
    Max,
}

impl DuplicateMode {
    /// Combine the value already in a cell with an incoming one.
    pub fn resolve(self, existing: f64, incoming: f64) -> f64 {
        match self {
            DuplicateMode::First => existing,
            DuplicateMode::Last => incoming,
            DuplicateMode::Min => existing.min(incoming),
            DuplicateMode::Max => existing.max(incoming),
        }
    }

    /// Parse a mode name (`first`, `last`, `min`, `max`).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "first" => Some(DuplicateMode::First),
            "last" => Some(DuplicateMode::Last),
            "min" => Some(DuplicateMode::Min),
            "max" => Some(DuplicateMode::Max),
            _ => None,
        }
    }
}

/// Comparison applied by a [`Filter`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterOp {
    /// `value > threshold`
    Gt,
    /// `value >= threshold`
    Ge,
    /// `value < threshold`
    Lt,
    /// `value <= threshold`
    Le,
    /// Always passes.
    #[default]
    None,
}

impl FilterOp {
    /// Parse an operator symbol. Anything unrecognised means no filtering.
    pub fn parse(symbol: &str) -> Self {
        match symbol.trim() {
            ">" => FilterOp::Gt,
            ">=" => FilterOp::Ge,
            "<" => FilterOp::Lt,
            "<=" => FilterOp::Le,
            _ => FilterOp::None,
        }
    }

    fn accepts(self, value: f64, threshold: f64) -> bool {
        match self {
            FilterOp::Gt => value > threshold,
            FilterOp::Ge => value >= threshold,
            FilterOp::Lt => value < threshold,
            FilterOp::Le => value <= threshold,
            FilterOp::None => true,
        }
    }
}

/// A numeric threshold on one field.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Filter {
    /// Comparison operator.
    pub op: FilterOp,
    /// Right-hand side of the comparison.
    pub threshold: f64,
}

impl Filter {
    /// Create a filter.
    pub fn new(op: FilterOp, threshold: f64) -> Self {
        Self { op, threshold }
    }
}

/// Filters keyed by header label. A record must pass all of them.
pub type Filters = BTreeMap<String, Filter>;

/// Smallest and largest assigned value.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Extent {
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
}

impl Extent {
    fn include(extent: Option<Self>, v: f64) -> Self {
        match extent {
            Some(e) => Self {
                min: e.min.min(v),
                max: e.max.max(v),
            },
            None => Self { min: v, max: v },
        }
    }
}

/// One accepted record, as matrix indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    /// Row index.
    pub source: usize,
    /// Column index.
    pub target: usize,
    /// Record value.
    pub value: f64,
}

/// Counts of records that did not simply fill an empty cell.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Records rejected by a filter.
    pub filtered: usize,
    /// Records whose value field did not parse as a number.
    pub non_numeric: usize,
    /// Records that hit an already filled cell.
    pub duplicates: usize,
}

/// Row-major and column-major dense matrices built from one record stream.
#[derive(Debug, Clone)]
pub struct DenseMatrix {
    /// Row labels, indexing the first axis of `rows`.
    pub row_labels: Vec<String>,
    /// Column labels, indexing the first axis of `cols`.
    pub col_labels: Vec<String>,
    /// `rows[[r, c]]`
    pub rows: Array2<Cell>,
    /// `cols[[c, r]]`, the transpose of `rows`.
    pub cols: Array2<Cell>,
    /// Range of assigned values; `None` when every cell is missing.
    pub extent: Option<Extent>,
    /// Accepted records in input order.
    pub links: Vec<Link>,
    /// What happened to the records that were not plain assignments.
    pub stats: BuildStats,
}

impl DenseMatrix {
    /// Number of row entities.
    pub fn n_rows(&self) -> usize {
        self.rows.nrows()
    }

    /// Number of column entities.
    pub fn n_cols(&self) -> usize {
        self.rows.ncols()
    }

    /// Cell at row `r`, column `c`.
    pub fn get(&self, r: usize, c: usize) -> Cell {
        self.rows.get((r, c)).copied().flatten()
    }
}

/// Build the dense matrices for `value_field` from a parsed table.
///
/// The row and column axes are the table's row and column fields.
pub fn build_matrix(
    table: &ParsedTable,
    value_field: &str,
    mode: DuplicateMode,
    filters: &Filters,
) -> Result<DenseMatrix> {
    let value_idx = table
        .field_index(value_field)
        .ok_or_else(|| Error::UnknownField(value_field.into()))?;

    // Filters on unknown fields never exclude anything.
    let active_filters: Vec<(usize, Filter)> = filters
        .iter()
        .filter(|(_, f)| f.op != FilterOp::None)
        .filter_map(|(name, f)| table.field_index(name).map(|i| (i, *f)))
        .collect();

    let row_index = index_of(&table.row_labels);
    let col_index = index_of(&table.col_labels);

    let n_rows = table.row_labels.len();
    let n_cols = table.col_labels.len();
    let mut rows: Array2<Cell> = Array2::from_elem((n_rows, n_cols), None);
    let mut cols: Array2<Cell> = Array2::from_elem((n_cols, n_rows), None);
    let mut links = Vec::new();
    let mut stats = BuildStats::default();
    let mut extent: Option<Extent> = None;
    // Set when a duplicate replaced a value sitting on an extent bound.
    let mut extent_stale = false;

    for record in &table.records {
        let passes = active_filters.iter().all(|(idx, filter)| {
            match record.field(*idx).and_then(parse_number) {
                Some(v) => filter.op.accepts(v, filter.threshold),
                None => true,
            }
        });
        if !passes {
            stats.filtered += 1;
            continue;
        }

        let raw = record.field(value_idx).unwrap_or_default();
        let Some(value) = parse_number(raw) else {
            warn!(line = record.line, value = raw, "value field is not numeric, record skipped");
            stats.non_numeric += 1;
            continue;
        };

        let (Some(&r), Some(&c)) = (
            record.field(table.row_field).and_then(|l| row_index.get(l)),
            record.field(table.col_field).and_then(|l| col_index.get(l)),
        ) else {
            continue;
        };

        let cell = match rows[[r, c]] {
            Some(existing) => {
                stats.duplicates += 1;
                let resolved = mode.resolve(existing, value);
                if resolved != existing
                    && extent.is_some_and(|e| existing == e.min || existing == e.max)
                {
                    extent_stale = true;
                }
                resolved
            }
            None => value,
        };
        extent = Some(Extent::include(extent, cell));
        rows[[r, c]] = Some(cell);
        cols[[c, r]] = Some(cell);
        links.push(Link {
            source: r,
            target: c,
            value,
        });
    }

    // Values a duplicate policy discarded are not part of the extent.
    if extent_stale {
        extent = matrix_extent(&rows);
    }

    debug!(
        rows = n_rows,
        cols = n_cols,
        value_field,
        filtered = stats.filtered,
        duplicates = stats.duplicates,
        "built dense matrix"
    );

    Ok(DenseMatrix {
        row_labels: table.row_labels.clone(),
        col_labels: table.col_labels.clone(),
        rows,
        cols,
        extent,
        links,
        stats,
    })
}

fn matrix_extent(rows: &Array2<Cell>) -> Option<Extent> {
    rows.iter()
        .flatten()
        .fold(None, |acc, &v| Some(Extent::include(acc, v)))
}

fn index_of(labels: &[String]) -> HashMap<&str, usize> {
    labels
        .iter()
        .enumerate()
        .map(|(i, l)| (l.as_str(), i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_headers, parse_records};

    fn table(text: &str) -> ParsedTable {
        let headers = parse_headers(text);
        parse_records(text, &headers, "id", "group").unwrap()
    }

    fn build(text: &str, mode: DuplicateMode, filters: &Filters) -> DenseMatrix {
        build_matrix(&table(text), "score", mode, filters).unwrap()
    }

    #[test]
    fn test_basic_matrix() {
        let m = build(
            "#id;group;score\nA;X;10\nB;X;20\nA;Y;5\nB;Y;15\n",
            DuplicateMode::Last,
            &Filters::new(),
        );
        assert_eq!(m.n_rows(), 2);
        assert_eq!(m.n_cols(), 2);
        assert_eq!(m.get(0, 0), Some(10.0));
        assert_eq!(m.get(0, 1), Some(5.0));
        assert_eq!(m.get(1, 0), Some(20.0));
        assert_eq!(m.get(1, 1), Some(15.0));
        assert_eq!(m.cols[[1, 0]], Some(5.0));
        assert_eq!(m.extent, Some(Extent { min: 5.0, max: 20.0 }));
        assert_eq!(m.links.len(), 4);
    }

    #[test]
    fn test_missing_cells() {
        let m = build(
            "#id;group;score\nA;X;1\nB;Y;2\n",
            DuplicateMode::Last,
            &Filters::new(),
        );
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.get(1, 0), None);
        assert_eq!(m.cols[[0, 1]], None);
    }

    #[test]
    fn test_duplicate_modes() {
        let text = "#id;group;score\nA;X;10\nA;X;30\n";
        let cell = |mode| build(text, mode, &Filters::new()).get(0, 0);
        assert_eq!(cell(DuplicateMode::First), Some(10.0));
        assert_eq!(cell(DuplicateMode::Last), Some(30.0));
        assert_eq!(cell(DuplicateMode::Min), Some(10.0));
        assert_eq!(cell(DuplicateMode::Max), Some(30.0));
    }

    #[test]
    fn test_duplicate_first_keeps_earliest_even_when_larger() {
        let m = build(
            "#id;group;score\nA;X;30\nA;X;10\n",
            DuplicateMode::First,
            &Filters::new(),
        );
        assert_eq!(m.get(0, 0), Some(30.0));
        assert_eq!(m.stats.duplicates, 1);
        assert_eq!(m.extent, Some(Extent { min: 30.0, max: 30.0 }));
    }

    #[test]
    fn test_extent_drops_replaced_values() {
        let text = "#id;group;score\nA;X;10\nA;X;30\nB;X;20\n";
        let extent = |mode| build(text, mode, &Filters::new()).extent;
        assert_eq!(extent(DuplicateMode::Last), Some(Extent { min: 20.0, max: 30.0 }));
        assert_eq!(extent(DuplicateMode::First), Some(Extent { min: 10.0, max: 20.0 }));
        assert_eq!(extent(DuplicateMode::Min), Some(Extent { min: 10.0, max: 20.0 }));
        assert_eq!(extent(DuplicateMode::Max), Some(Extent { min: 20.0, max: 30.0 }));
    }

    #[test]
    fn test_filter_excludes_records() {
        let text = "#id;group;score;weight\nA;X;10;60\nB;X;20;40\nA;Y;5;50\nB;Y;15;90\n";
        let mut filters = Filters::new();
        filters.insert("weight".into(), Filter::new(FilterOp::Gt, 50.0));
        let m = build(text, DuplicateMode::Last, &filters);
        assert_eq!(m.get(0, 0), Some(10.0));
        assert_eq!(m.get(1, 0), None);
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.get(1, 1), Some(15.0));
        assert_eq!(m.stats.filtered, 2);
    }

    #[test]
    fn test_filter_is_permissive() {
        let text = "#id;group;score;tag\nA;X;10;n/a\nB;X;20;3\n";
        let mut filters = Filters::new();
        filters.insert("tag".into(), Filter::new(FilterOp::Lt, 1.0));
        filters.insert("missing".into(), Filter::new(FilterOp::Gt, 100.0));
        filters.insert("score".into(), Filter::new(FilterOp::parse("~"), 100.0));
        let m = build(text, DuplicateMode::Last, &filters);
        // "n/a" is not numeric, so the tag filter lets A through.
        assert_eq!(m.get(0, 0), Some(10.0));
        assert_eq!(m.get(1, 0), None);
    }

    #[test]
    fn test_non_numeric_value_is_skipped() {
        let m = build(
            "#id;group;score\nA;X;abc\nB;X;2\n",
            DuplicateMode::Last,
            &Filters::new(),
        );
        assert_eq!(m.get(0, 0), None);
        assert_eq!(m.stats.non_numeric, 1);
        assert_eq!(m.n_rows(), 2);
    }

    #[test]
    fn test_all_missing_has_no_extent() {
        let m = build("#id;group;score\nA;X;x\n", DuplicateMode::Last, &Filters::new());
        assert_eq!(m.extent, None);
    }

    #[test]
    fn test_unknown_value_field() {
        let t = table("#id;group;score\nA;X;1\n");
        let err = build_matrix(&t, "nope", DuplicateMode::Last, &Filters::new()).unwrap_err();
        assert_eq!(err, Error::UnknownField("nope".into()));
    }

    #[test]
    fn test_mode_and_operator_parsing() {
        assert_eq!(DuplicateMode::parse("MAX"), Some(DuplicateMode::Max));
        assert_eq!(DuplicateMode::parse("median"), None);
        assert_eq!(FilterOp::parse(">="), FilterOp::Ge);
        assert_eq!(FilterOp::parse("!="), FilterOp::None);
    }
}
