//! Error types for file decoding and row configuration.

use std::path::PathBuf;

use bu_model::ModelError;
use thiserror::Error;

/// Errors that can occur while turning a file into a configured dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file does not exist.
    #[error("file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File exceeds the size limit.
    #[error("file too large: {path} ({size} bytes, max {max_size} bytes)")]
    FileTooLarge {
        path: PathBuf,
        size: u64,
        max_size: u64,
    },

    // === Decoding Errors ===
    /// Extension is not one of the supported formats.
    #[error("unsupported file type '{extension}': {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Delimited text could not be parsed.
    #[error("failed to parse {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// Spreadsheet could not be opened or read.
    #[error("failed to read spreadsheet {path}: {message}")]
    Spreadsheet { path: PathBuf, message: String },

    /// PDF text extraction failed.
    #[error("failed to extract text from PDF {path}: {message}")]
    Pdf { path: PathBuf, message: String },

    /// Decoding produced no rows.
    #[error("file contains no rows: {path}")]
    EmptyFile { path: PathBuf },

    // === Configuration Errors ===
    /// Requested row range does not fit the file.
    #[error("invalid row range: {reason}")]
    InvalidRowRange { reason: String },

    /// Date filter names a column the dataset does not have.
    #[error("date column '{column}' not found")]
    ColumnNotFound { column: String },

    /// Dataset invariant violated while configuring rows.
    #[error(transparent)]
    Model(#[from] ModelError),
}

impl IngestError {
    pub(crate) fn invalid_range(reason: impl Into<String>) -> Self {
        Self::InvalidRowRange {
            reason: reason.into(),
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IngestError::FileTooLarge {
            path: PathBuf::from("/data/big.xlsx"),
            size: 60,
            max_size: 50,
        };
        assert_eq!(
            err.to_string(),
            "file too large: /data/big.xlsx (60 bytes, max 50 bytes)"
        );
    }

    #[test]
    fn test_error_from_model() {
        let err: IngestError = ModelError::DuplicateColumn("Name".to_string()).into();
        assert_eq!(err.to_string(), "duplicate column name: Name");
    }
}
