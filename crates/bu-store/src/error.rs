//! Process store error types.
//!
//! Every store operation returns a structured error with a message suitable
//! for operators and an optional hint for fixing it.

use std::path::PathBuf;

use bu_model::{ModelError, ProcessId};
use thiserror::Error;

/// Process store operation error.
#[derive(Debug, Error)]
pub enum StoreError {
    // === File System Errors ===
    /// File I/O error.
    #[error("failed to {operation} {path}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Temp file could not be renamed over the target.
    #[error("failed to complete write of {target_path}")]
    AtomicWriteFailed {
        temp_path: PathBuf,
        target_path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === Data Errors ===
    /// Process could not be serialized.
    #[error("failed to serialize process data")]
    Serialization {
        #[source]
        source: serde_json::Error,
    },

    /// Stored or imported JSON could not be read.
    #[error("failed to read process data")]
    Deserialization {
        path: Option<PathBuf>,
        #[source]
        source: serde_json::Error,
    },

    /// Import document has an unsupported shape or version.
    #[error("invalid import: {reason}")]
    InvalidImport { reason: String },

    // === Lookup Errors ===
    /// No process with this id.
    #[error("process {0} not found")]
    NotFound(ProcessId),

    /// Update requested for a process that was never saved.
    #[error("process for '{company}' has no id")]
    MissingId { company: String },

    /// A backend is unavailable and no fallback exists.
    #[error("{backend} store unavailable: {reason}")]
    Unavailable { backend: String, reason: String },

    #[error(transparent)]
    Model(#[from] ModelError),
}

impl StoreError {
    pub(crate) fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Message for operators.
    pub fn user_message(&self) -> String {
        match self {
            Self::Io {
                operation, path, ..
            } => format!("Could not {operation} {}", path.display()),
            Self::AtomicWriteFailed { target_path, .. } => format!(
                "Could not save the process to {}. Please check disk space and permissions.",
                target_path.display()
            ),
            Self::Serialization { .. } => {
                "An error occurred while saving the process.".to_string()
            }
            Self::Deserialization { path: Some(path), .. } => format!(
                "The process file {} could not be read. It may be corrupted.",
                path.display()
            ),
            Self::Deserialization { path: None, .. } => {
                "The process data is not valid JSON.".to_string()
            }
            Self::InvalidImport { reason } => format!("The import file was rejected: {reason}"),
            Self::NotFound(id) => format!("No saved process has id {id}."),
            Self::MissingId { company } => {
                format!("The process for {company} has not been saved yet.")
            }
            Self::Unavailable { backend, .. } => {
                format!("The {backend} process store is unavailable.")
            }
            Self::Model(err) => err.to_string(),
        }
    }

    /// Hint for resolving the error.
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::Io { operation, .. } => {
                if operation.starts_with("read") {
                    Some("Check that the file exists and you have permission to read it.".into())
                } else {
                    Some("Check that you have permission to write to this location.".into())
                }
            }
            Self::AtomicWriteFailed { .. } => {
                Some("Free up disk space or choose a different store directory.".into())
            }
            Self::Deserialization { path: Some(_), .. } => {
                Some("Restore the file from an export or delete it and save the process again.".into())
            }
            Self::Deserialization { path: None, .. } | Self::InvalidImport { .. } => Some(
                "Import a file produced by 'process export' or a JSON array of processes.".into(),
            ),
            Self::NotFound(_) => Some("Run 'process list' to see saved processes.".into()),
            Self::MissingId { .. } => Some("Save it as a new process instead.".into()),
            Self::Unavailable { .. } => Some("Check the [store] section of settings.toml.".into()),
            Self::Serialization { .. } | Self::Model(_) => None,
        }
    }
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_and_suggestions() {
        let err = StoreError::io(
            "read",
            "/tmp/p.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.user_message(), "Could not read /tmp/p.json");
        assert!(err.suggestion().unwrap().contains("permission to read"));

        let id = ProcessId::new("abc").unwrap();
        let err = StoreError::NotFound(id);
        assert_eq!(err.to_string(), "process abc not found");
        assert!(err.suggestion().is_some());
    }
}
