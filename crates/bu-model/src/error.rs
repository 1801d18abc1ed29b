//! Error types for the data model.

use thiserror::Error;

use crate::OutputColumn;

/// Errors raised when model invariants would be violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Two columns in one dataset share a name.
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    /// A row carries more cells than the dataset has columns.
    #[error("row {row} has {width} cells but the dataset has {columns} columns")]
    RowTooWide {
        row: usize,
        width: usize,
        columns: usize,
    },

    /// The column is derived and cannot be mapped to a source column.
    #[error("{0} is derived and cannot be mapped to a source column")]
    NotMappable(OutputColumn),

    /// Text that does not name one of the output columns.
    #[error("unknown output column: {0}")]
    UnknownOutputColumn(String),

    /// A process identifier that is empty or malformed.
    #[error("invalid process id: '{0}'")]
    InvalidProcessId(String),
}

/// Result type for model operations.
pub type Result<T> = std::result::Result<T, ModelError>;
