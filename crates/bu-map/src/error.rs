//! Error types for the mapping engine.

use bu_model::ModelError;
use thiserror::Error;

/// Errors raised before any row is mapped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    /// The process refers to a source column the dataset does not have.
    #[error("{role} is mapped to '{column}', which is not a column in this file")]
    UnknownSourceColumn { role: String, column: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// Result type for mapping operations.
pub type Result<T> = std::result::Result<T, MapError>;
