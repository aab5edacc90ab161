//! Types for the progress module.

use serde::{Deserialize, Serialize};

/// Error code recorded on every failed snapshot.
pub const PROCESSING_ERROR_CODE: &str = "PROCESSING_ERROR";

/// Message recorded on every failed snapshot.
pub const PROCESSING_ERROR_MESSAGE: &str = "File processing failed";

/// Lifecycle status of a job.
///
/// `Queued` exists for completeness; accepted jobs start at `Processing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether no further updates are accepted after this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

/// Error attached to a failed snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Latest known progress of one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    pub job_id: String,
    /// Percent complete, 0-100.
    pub progress: u8,
    pub status: JobStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetails>,
}

impl ProgressSnapshot {
    /// An in-flight snapshot.
    pub fn processing(job_id: impl Into<String>, progress: u8) -> Self {
        Self {
            job_id: job_id.into(),
            progress: progress.min(100),
            status: JobStatus::Processing,
            error: None,
        }
    }

    /// A successful terminal snapshot.
    pub fn completed(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            progress: 100,
            status: JobStatus::Completed,
            error: None,
        }
    }

    /// A failed terminal snapshot carrying `details`.
    pub fn failed(job_id: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            progress: 100,
            status: JobStatus::Failed,
            error: Some(ErrorDetails {
                code: PROCESSING_ERROR_CODE.to_string(),
                message: PROCESSING_ERROR_MESSAGE.to_string(),
                details: Some(details.into()),
            }),
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
