//! Error types for the storage module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while staging, reading, or sweeping artifacts.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Refused to store an empty upload.
    #[error("Failed to store empty file: {name}")]
    EmptyInput { name: String },

    /// The requested name resolves outside the storage root.
    #[error("Cannot access file outside of the designated directory: {name}")]
    PathViolation { name: String },

    /// No artifact exists under this name.
    #[error("File not found: {name}")]
    NotFound { name: String },

    /// Could not find a free file name after repeated collisions.
    #[error("Could not allocate a unique name for: {name}")]
    NameExhausted { name: String },

    /// Failed to create a storage root.
    #[error("Failed to create directory: {path}")]
    DirectoryCreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// I/O error while touching an artifact.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    /// Creates an I/O error for the given path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error came from a rejected (unsafe) file name.
    pub fn is_path_violation(&self) -> bool {
        matches!(self, Self::PathViolation { .. })
    }
}
