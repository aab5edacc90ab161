//! Prometheus metrics for observability.
//!
//! This module provides metrics for monitoring the docforge server:
//! - HTTP request metrics (latency, counts, in flight)
//! - Live progress streams
//! - Worker pool status (collected dynamically)

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "docforge_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![
            0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
        ]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("docforge_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "docforge_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Progress Stream Metrics
// =============================================================================

/// Open SSE progress streams.
pub static PROGRESS_STREAMS_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "docforge_progress_streams_active",
        "Number of open progress streams",
    )
    .unwrap()
});

// =============================================================================
// Worker Pool Metrics (collected dynamically)
// =============================================================================

/// Jobs holding a worker slot.
pub static JOB_POOL_ACTIVE: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("docforge_job_pool_active", "Number of running jobs").unwrap()
});

/// Jobs waiting for a worker slot.
pub static JOB_POOL_QUEUED: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("docforge_job_pool_queued", "Number of queued jobs").unwrap()
});

/// Jobs with a stored snapshot in the tracker.
pub static TRACKED_JOBS: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "docforge_tracked_jobs",
        "Number of jobs held by the progress tracker",
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Progress streams
    registry
        .register(Box::new(PROGRESS_STREAMS_ACTIVE.clone()))
        .unwrap();

    // Worker pool
    registry
        .register(Box::new(JOB_POOL_ACTIVE.clone()))
        .unwrap();
    registry
        .register(Box::new(JOB_POOL_QUEUED.clone()))
        .unwrap();
    registry.register(Box::new(TRACKED_JOBS.clone())).unwrap();

    // Core metrics (jobs, storage sweeps)
    for metric in docforge_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!("Failed to encode metrics: {}", e);
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Collect dynamic metrics from current application state.
///
/// Called before encoding so the pool gauges reflect the orchestrator.
pub fn collect_dynamic_metrics(state: &crate::state::AppState) {
    let status = state.orchestrator().status();
    JOB_POOL_ACTIVE.set(status.active_jobs as i64);
    JOB_POOL_QUEUED.set(status.queued_jobs as i64);
    TRACKED_JOBS.set(status.tracked_jobs as i64);
}

/// Normalize a path for metric labels (replace IDs with placeholders).
///
/// Any segment after `progress`, `status` or `download` is an identifier,
/// as is any UUID or purely numeric segment.
pub fn normalize_path(path: &str) -> String {
    let mut previous = "";
    let segments: Vec<&str> = path
        .split('/')
        .map(|segment| {
            let replaced = if matches!(previous, "progress" | "status" | "download") {
                if previous == "download" {
                    "{file}"
                } else {
                    "{id}"
                }
            } else if is_uuid(segment) || is_numeric(segment) {
                "{id}"
            } else {
                segment
            };
            previous = segment;
            replaced
        })
        .collect();
    segments.join("/")
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

fn is_uuid(segment: &str) -> bool {
    let groups: Vec<&str> = segment.split('-').collect();
    groups.len() == 5
        && groups
            .iter()
            .zip([8, 4, 4, 4, 12])
            .all(|(g, len)| g.len() == len && g.bytes().all(|b| b.is_ascii_hexdigit()))
}
