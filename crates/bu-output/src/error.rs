use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while rendering or writing output files.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to flush CSV buffer: {message}")]
    Flush { message: String },

    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to complete write of {target_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid output file name '{0}'")]
    InvalidFileName(String),
}

pub type Result<T> = std::result::Result<T, OutputError>;
