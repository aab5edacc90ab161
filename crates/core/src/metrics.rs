//! Prometheus metrics for core components.
//!
//! This module provides metrics for:
//! - Job orchestration (submissions, outcomes, durations)
//! - Storage sweeps (deletions, per-entry failures)

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Jobs
// =============================================================================

/// Jobs accepted, by operation.
pub static JOBS_SUBMITTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("docforge_jobs_submitted_total", "Total jobs accepted"),
        &["operation"], // "conversion", "compression"
    )
    .unwrap()
});

/// Submissions refused before a job was created, by error code.
pub static JOBS_REJECTED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "docforge_jobs_rejected_total",
            "Total submissions refused before job creation",
        ),
        &["operation", "code"],
    )
    .unwrap()
});

/// Jobs that reached a terminal state, by operation and result.
pub static JOBS_FINISHED: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("docforge_jobs_finished_total", "Total jobs finished"),
        &["operation", "result"], // "completed", "failed"
    )
    .unwrap()
});

/// Time from worker slot acquisition to terminal state.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new("docforge_job_duration_seconds", "Duration of job transforms")
            .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
        &["operation", "result"],
    )
    .unwrap()
});

// =============================================================================
// Storage
// =============================================================================

/// Entries deleted by the expiry sweep.
pub static SWEEP_DELETED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "docforge_sweep_deleted_total",
        "Total expired artifacts deleted",
    )
    .unwrap()
});

/// Entries the expiry sweep failed to delete.
pub static SWEEP_FAILED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "docforge_sweep_failed_total",
        "Total expired artifacts that could not be deleted",
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        // Jobs
        Box::new(JOBS_SUBMITTED.clone()),
        Box::new(JOBS_REJECTED.clone()),
        Box::new(JOBS_FINISHED.clone()),
        Box::new(JOB_DURATION.clone()),
        // Storage
        Box::new(SWEEP_DELETED.clone()),
        Box::new(SWEEP_FAILED.clone()),
    ]
}
