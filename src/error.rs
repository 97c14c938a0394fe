use core::fmt;

/// Result alias for `dendroheat`.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by parsing, matrix construction, clustering and the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Input was empty (an axis with no entities cannot be clustered).
    EmptyInput,

    /// A data line did not split into exactly one field per header.
    MalformedRecord {
        /// 1-based line number in the input text.
        line: usize,
        /// Number of headers.
        expected: usize,
        /// Number of fields found on the line.
        found: usize,
    },

    /// A field name that is not one of the headers.
    UnknownField(String),

    /// Row, column and value fields must be pairwise distinct.
    FieldsNotDistinct,

    /// The value field was not inferred as numeric.
    NonNumericValueField(String),

    /// Matrix dimension mismatch.
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Found dimension.
        found: usize,
    },

    /// Invalid number of clusters requested.
    InvalidClusterCount {
        /// Requested count.
        requested: usize,
        /// Number of items.
        n_items: usize,
    },

    /// Invalid parameter value.
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Error message.
        message: String,
    },

    /// No node with this id exists in the tree.
    UnknownNode(usize),

    /// A collapse/expand was requested before anything was displayed.
    NotDisplayed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::EmptyInput => write!(f, "empty input provided"),
            Error::MalformedRecord {
                line,
                expected,
                found,
            } => write!(
                f,
                "malformed record at line {line}: expected {expected} fields, found {found}"
            ),
            Error::UnknownField(name) => write!(f, "unknown field '{name}'"),
            Error::FieldsNotDistinct => write!(f, "selected fields should be different"),
            Error::NonNumericValueField(name) => {
                write!(f, "value field '{name}' is not numeric")
            }
            Error::DimensionMismatch { expected, found } => {
                write!(f, "dimension mismatch: expected {expected}, found {found}")
            }
            Error::InvalidClusterCount { requested, n_items } => {
                write!(f, "cannot create {requested} clusters from {n_items} items")
            }
            Error::InvalidParameter { name, message } => {
                write!(f, "invalid parameter '{name}': {message}")
            }
            Error::UnknownNode(id) => write!(f, "no tree node with id {id}"),
            Error::NotDisplayed => write!(f, "nothing is displayed yet"),
        }
    }
}

impl std::error::Error for Error {}
