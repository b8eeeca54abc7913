use arrow::datatypes::DataType;
use arrow::error::ArrowError;

/// Errors raised while building keys and reshaping quantities.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The string has no `:` separating the name from the dimensions.
    #[error("cannot parse key from {0:?}: expected 'name:dim1-dim2-...'")]
    KeyParse(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// A quantity carries zero or several distinct units.
    #[error("quantity '{quantity}' must have exactly one unit, found {units:?}")]
    AmbiguousUnit { quantity: String, units: Vec<String> },

    #[error("quantity '{quantity}' has no column '{column}'")]
    MissingColumn { quantity: String, column: String },

    #[error("column '{column}' has unsupported type {data_type}")]
    UnsupportedColumnType { column: String, data_type: DataType },

    #[error("quantity '{quantity}' has more than one row for index {index}")]
    DuplicateIndex { quantity: String, index: String },

    #[error("'{name}' has no dimension '{dimension}' (dimensions: {dims:?})")]
    UnknownDimension {
        name: String,
        dimension: String,
        dims: Vec<String>,
    },

    #[error("expected dimensions {expected:?} for '{key}', got {actual:?}")]
    DimensionMismatch {
        key: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },

    #[error("malformed array '{name}': {reason}")]
    InvalidArray { name: String, reason: String },

    #[error(transparent)]
    Arrow(#[from] ArrowError),

    /// The scenario backend failed to produce the quantity.
    #[error(transparent)]
    Source(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
