//! Progress endpoints: live SSE stream and one-shot poll.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::sse::{Event, KeepAlive, Sse},
    Json,
};
use futures::{Stream, StreamExt};
use tracing::debug;

use docforge_core::ProgressSnapshot;

use super::error::ApiError;
use crate::metrics::PROGRESS_STREAMS_ACTIVE;
use crate::state::AppState;

/// SSE event name for snapshots.
pub const PROGRESS_EVENT: &str = "progress";

/// Decrements the active stream gauge when the client goes away.
struct StreamGuard {
    job_id: String,
}

impl StreamGuard {
    fn new(job_id: String) -> Self {
        PROGRESS_STREAMS_ACTIVE.inc();
        Self { job_id }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        PROGRESS_STREAMS_ACTIVE.dec();
        debug!(job_id = %self.job_id, "Progress stream closed");
    }
}

fn to_event(snapshot: &ProgressSnapshot) -> Event {
    Event::default()
        .event(PROGRESS_EVENT)
        .json_data(snapshot)
        .unwrap_or_else(|_| Event::default().event(PROGRESS_EVENT).data("{}"))
}

/// GET /api/v1/progress/{job_id}
///
/// Streams snapshots for the job as `progress` events. The stream ends
/// after the terminal snapshot, or when a newer subscriber takes over.
pub async fn stream_progress(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    debug!(job_id = %job_id, "Progress stream opened");
    let guard = StreamGuard::new(job_id.clone());
    let subscription = state.tracker().subscribe(&job_id);

    let stream = subscription.into_stream().map(move |snapshot| {
        let _held = &guard;
        Ok(to_event(&snapshot))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// GET /api/v1/status/{job_id}
pub async fn get_status(
    State(state): State<Arc<AppState>>,
    Path(job_id): Path<String>,
) -> Result<Json<ProgressSnapshot>, ApiError> {
    state
        .tracker()
        .get_snapshot(&job_id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Job not found: {}", job_id)))
}
