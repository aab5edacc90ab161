//! Error types for transform strategies.

use std::path::PathBuf;
use thiserror::Error;

/// Failure of a transform after its job was accepted.
///
/// These never reach the submitting caller directly; the orchestrator
/// records them as the job's terminal `Failed` snapshot.
#[derive(Debug, Error)]
pub enum ProcessingError {
    /// External tool binary not found.
    #[error("{tool} not found at path: {path}")]
    ToolNotFound { tool: String, path: PathBuf },

    /// External tool exited unsuccessfully.
    #[error("{tool} failed: {reason}")]
    ToolFailed {
        tool: String,
        reason: String,
        stderr: Option<String>,
    },

    /// Transform did not finish in time.
    #[error("Processing timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// Input could not be decoded or output could not be encoded.
    #[error("Image processing failed: {reason}")]
    Image { reason: String },

    /// DOCX container could not be read or written.
    #[error("Archive processing failed: {reason}")]
    Archive { reason: String },

    /// The strategy produced no output.
    #[error("Output file not created: {path}")]
    MissingOutput { path: PathBuf },

    /// The strategy was handed a file it does not handle.
    #[error("Unsupported input: {reason}")]
    Unsupported { reason: String },

    /// The transform task terminated abnormally.
    #[error("Processing aborted: {reason}")]
    Aborted { reason: String },

    /// I/O error during processing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProcessingError {
    /// Creates a tool failure with captured stderr.
    pub fn tool_failed(
        tool: impl Into<String>,
        reason: impl Into<String>,
        stderr: Option<String>,
    ) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            reason: reason.into(),
            stderr,
        }
    }

    /// Creates an image codec failure.
    pub fn image(reason: impl std::fmt::Display) -> Self {
        Self::Image {
            reason: reason.to_string(),
        }
    }

    /// Creates an archive failure.
    pub fn archive(reason: impl std::fmt::Display) -> Self {
        Self::Archive {
            reason: reason.to_string(),
        }
    }

    /// Text recorded as the failed snapshot's detail.
    pub fn detail(&self) -> String {
        match self {
            Self::ToolFailed {
                stderr: Some(stderr),
                ..
            } if !stderr.trim().is_empty() => format!("{}: {}", self, stderr.trim()),
            _ => self.to_string(),
        }
    }
}

impl From<image::ImageError> for ProcessingError {
    fn from(e: image::ImageError) -> Self {
        Self::image(e)
    }
}

impl From<zip::result::ZipError> for ProcessingError {
    fn from(e: zip::result::ZipError) -> Self {
        Self::archive(e)
    }
}
