//! Dataset error types.

/// Errors raised while building or loading a [`Dataset`](super::Dataset).
#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    /// No columns were provided.
    #[error("dataset has no columns")]
    EmptyColumns,

    /// Two columns share a name.
    #[error("duplicate column name '{0}'")]
    DuplicateColumn(String),

    /// A column name was looked up but does not exist.
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    /// Columns (or the name list) disagree on shape.
    #[error("shape mismatch for {field}: expected {expected}, got {got}")]
    ShapeMismatch {
        expected: usize,
        got: usize,
        field: &'static str,
    },

    /// A CSV record has a different number of cells than the header.
    #[error("row {row} has {got} cells, header has {expected}")]
    RaggedRow { row: usize, expected: usize, got: usize },

    /// A CSV cell could not be parsed as a number.
    #[error("row {row}, column '{column}': cannot parse '{value}' as a number")]
    NonNumeric {
        row: usize,
        column: String,
        value: String,
    },

    /// Underlying CSV reader failure.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O failure opening the input.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
