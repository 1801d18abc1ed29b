//! Error types for record matching.

use thiserror::Error;

/// Errors raised when configuring or running a match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatchError {
    /// A batch column assignment names a column the file does not have.
    #[error("column '{column}' not found in batch '{batch}'")]
    UnknownColumn { batch: String, column: String },

    /// More entity columns than a lookup can combine.
    #[error("at most {max} entity columns can be combined, got {count}")]
    TooManyEntityColumns { count: usize, max: usize },

    /// Batch headers did not identify the name and amount columns.
    #[error("could not identify {missing} column in batch '{batch}'")]
    UnassignedColumn { batch: String, missing: &'static str },

    /// Invoice table without "Description" and "Net Price" headers.
    #[error("invoice header row with Description and Net Price not found")]
    InvoiceHeaderNotFound,

    /// Manual employee line without a name or amount.
    #[error("line {line}: expected 'First Last, amount', got '{text}'")]
    InvalidEmployeeLine { line: usize, text: String },
}

/// Result type for matching operations.
pub type Result<T> = std::result::Result<T, MatchError>;
