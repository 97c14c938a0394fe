//! Delimited-record parsing.
//!
//! Input is a block of text, one record per line. Fields are separated by
//! one or more tabs or semicolons:
//!
//! ```text
//! #id;group;score
//! A;X;10
//! B;X;20
//! ```
//!
//! A first line starting with [`HEADER_MARKER`] names the columns. Any other
//! line starting with the marker is a comment. Without a header line the
//! columns are called `Column 1`, `Column 2`, ...
//!
//! Whether a header is numeric is decided once, from the first data line.
//! Rows are never re-validated against that guess.

use std::collections::HashSet;

use crate::error::{Error, Result};

/// Marks the header line, and comment lines anywhere else.
pub const HEADER_MARKER: char = '#';

const DELIMITERS: [char; 2] = ['\t', ';'];

/// A named column of the input.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Header {
    /// Column name.
    pub label: String,
    /// Whether the sampled value in this column parsed as a number.
    pub is_numeric: bool,
}

/// One data line, split into fields aligned with the headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 1-based line number in the input text.
    pub line: usize,
    fields: Vec<String>,
}

impl Record {
    /// Field at header position `idx`.
    pub fn field(&self, idx: usize) -> Option<&str> {
        self.fields.get(idx).map(String::as_str)
    }

    /// All fields in header order.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }
}

/// Parsed records together with the distinct labels of the row and column fields.
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// Headers, in input order.
    pub headers: Vec<Header>,
    /// Data records, in input order.
    pub records: Vec<Record>,
    /// Index of the row field in `headers`.
    pub row_field: usize,
    /// Index of the column field in `headers`.
    pub col_field: usize,
    /// Distinct row-field values, in order of first appearance.
    pub row_labels: Vec<String>,
    /// Distinct column-field values, in order of first appearance.
    pub col_labels: Vec<String>,
}

impl ParsedTable {
    /// Position of the header called `label`.
    pub fn field_index(&self, label: &str) -> Option<usize> {
        field_index(&self.headers, label)
    }

    /// Number of value sets: headers that are neither the row nor the column field.
    pub fn value_sets(&self) -> usize {
        self.headers.len().saturating_sub(2)
    }
}

/// Position of the header called `label`.
pub fn field_index(headers: &[Header], label: &str) -> Option<usize> {
    headers.iter().position(|h| h.label == label)
}

/// Parse a trimmed field as a finite number.
///
/// The empty string is not a number.
pub fn parse_number(field: &str) -> Option<f64> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Split a line on runs of delimiters.
///
/// A leading or trailing delimiter still yields one empty field, so
/// `";a"` is `["", "a"]` and `"a;;b"` is `["a", "b"]`.
pub fn split_fields(line: &str) -> Vec<&str> {
    let pieces: Vec<&str> = line.split(DELIMITERS).collect();
    let last = pieces.len().saturating_sub(1);
    pieces
        .into_iter()
        .enumerate()
        .filter(|(i, p)| !p.is_empty() || *i == 0 || *i == last)
        .map(|(_, p)| p.trim())
        .collect()
}

fn is_comment(line: &str) -> bool {
    line.starts_with(HEADER_MARKER)
}

/// Data lines with their 1-based line numbers: no comments, no blank lines.
fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l))
        .filter(|(_, l)| !is_comment(l) && !l.trim().is_empty())
}

/// Infer headers from the text.
///
/// Returns an empty list for empty text.
pub fn parse_headers(text: &str) -> Vec<Header> {
    let Some(first) = text.lines().next() else {
        return Vec::new();
    };

    let sample: Vec<&str> = data_lines(text)
        .next()
        .map(|(_, l)| split_fields(l))
        .unwrap_or_default();
    let sampled = |i: usize| sample.get(i).is_some_and(|f| parse_number(f).is_some());

    if let Some(rest) = first.strip_prefix(HEADER_MARKER) {
        split_fields(rest)
            .into_iter()
            .enumerate()
            .map(|(i, label)| Header {
                label: label.to_string(),
                is_numeric: sampled(i),
            })
            .collect()
    } else {
        (0..split_fields(first).len())
            .map(|i| Header {
                label: format!("Column {}", i + 1),
                is_numeric: sampled(i),
            })
            .collect()
    }
}

/// Split every data line into a [`Record`] and collect the distinct row and column labels.
///
/// Fails on the first line whose field count differs from the header count,
/// and when `row_field` or `col_field` is not a header.
pub fn parse_records(
    text: &str,
    headers: &[Header],
    row_field: &str,
    col_field: &str,
) -> Result<ParsedTable> {
    let row_idx =
        field_index(headers, row_field).ok_or_else(|| Error::UnknownField(row_field.into()))?;
    let col_idx =
        field_index(headers, col_field).ok_or_else(|| Error::UnknownField(col_field.into()))?;

    let mut records = Vec::new();
    let mut row_labels = LabelSet::default();
    let mut col_labels = LabelSet::default();

    for (line, raw) in data_lines(text) {
        let fields = split_fields(raw);
        if fields.len() != headers.len() {
            return Err(Error::MalformedRecord {
                line,
                expected: headers.len(),
                found: fields.len(),
            });
        }
        row_labels.insert(fields[row_idx]);
        col_labels.insert(fields[col_idx]);
        records.push(Record {
            line,
            fields: fields.into_iter().map(str::to_string).collect(),
        });
    }

    Ok(ParsedTable {
        headers: headers.to_vec(),
        records,
        row_field: row_idx,
        col_field: col_idx,
        row_labels: row_labels.labels,
        col_labels: col_labels.labels,
    })
}

/// Distinct strings in order of first insertion.
#[derive(Default)]
struct LabelSet {
    seen: HashSet<String>,
    labels: Vec<String>,
}

impl LabelSet {
    fn insert(&mut self, label: &str) {
        if !self.seen.contains(label) {
            self.seen.insert(label.to_string());
            self.labels.push(label.to_string());
        }
    }
}
