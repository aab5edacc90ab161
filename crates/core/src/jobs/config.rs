//! Configuration for job execution and uploads.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits for the job worker pool and progress retention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    /// Maximum number of transforms running at once.
    #[serde(default = "default_max_concurrent_jobs")]
    pub max_concurrent_jobs: usize,

    /// How long a finished job's snapshot stays queryable, in seconds.
    #[serde(default = "default_snapshot_retention")]
    pub snapshot_retention_secs: u64,
}

fn default_max_concurrent_jobs() -> usize {
    4
}

fn default_snapshot_retention() -> u64 {
    3600 // 1 hour
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent_jobs(),
            snapshot_retention_secs: default_snapshot_retention(),
        }
    }
}

impl JobsConfig {
    pub fn snapshot_retention(&self) -> Duration {
        Duration::from_secs(self.snapshot_retention_secs)
    }

    /// Sets the worker pool size.
    pub fn with_max_concurrent_jobs(mut self, max: usize) -> Self {
        self.max_concurrent_jobs = max;
        self
    }
}

/// Upload limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Largest accepted upload, in bytes.
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024 // 10 MiB
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
        }
    }
}
