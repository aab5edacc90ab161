//! Types for the jobs module.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::format::{CompressionLevel, FileFormat};
use crate::progress::JobStatus;
use crate::storage::Artifact;

/// Base path under which processed files are served.
pub const DOWNLOAD_PATH_PREFIX: &str = "/api/v1/download/";

/// The transform a job performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JobOperation {
    Conversion {
        source: FileFormat,
        target: FileFormat,
    },
    Compression {
        format: FileFormat,
        level: CompressionLevel,
    },
}

impl JobOperation {
    /// Short label used in logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Conversion { .. } => "conversion",
            Self::Compression { .. } => "compression",
        }
    }

    /// Format of the produced file.
    pub fn output_format(&self) -> FileFormat {
        match self {
            Self::Conversion { target, .. } => *target,
            Self::Compression { format, .. } => *format,
        }
    }
}

/// An accepted unit of work. Owned by the orchestrator and moved into the
/// task that runs it.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub operation: JobOperation,
    pub original: Artifact,
    pub output: Artifact,
    /// Size of the uploaded original in bytes.
    pub file_size: u64,
    pub submitted_at: DateTime<Utc>,
}

/// Immediate reply to an accepted submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAcknowledgment {
    pub job_id: String,
    /// Name of the processed file.
    pub file_name: String,
    /// Identity used to download the processed file.
    pub file_id: String,
    pub download_url: String,
    /// Size of the uploaded original in bytes.
    pub file_size: u64,
    /// Extension of the output format.
    pub format: String,
    pub status: JobStatus,
    pub submitted_at: DateTime<Utc>,
}

impl JobAcknowledgment {
    pub(crate) fn for_job(job: &Job) -> Self {
        Self {
            job_id: job.id.clone(),
            file_name: job.output.file_name.clone(),
            file_id: job.output.file_name.clone(),
            download_url: format!("{}{}", DOWNLOAD_PATH_PREFIX, job.output.file_name),
            file_size: job.file_size,
            format: job.operation.output_format().extension().to_string(),
            status: JobStatus::Processing,
            submitted_at: job.submitted_at,
        }
    }
}

/// Worker pool status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorStatus {
    /// Jobs holding a worker slot.
    pub active_jobs: usize,
    /// Accepted jobs waiting for a slot.
    pub queued_jobs: usize,
    pub max_concurrent: usize,
    pub total_completed: u64,
    pub total_failed: u64,
    /// Jobs with a live progress observer.
    pub active_observers: usize,
    /// Jobs the tracker still holds a snapshot for.
    pub tracked_jobs: usize,
    pub conversion_strategies: Vec<String>,
    pub compression_strategies: Vec<String>,
}
