//! Worker pool and strategy status.

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::Arc;

use docforge_core::{FileFormat, OrchestratorStatus};

use crate::state::AppState;

/// Response for the pipeline status endpoint.
#[derive(Debug, Serialize)]
pub struct PipelineStatusResponse {
    /// Worker pool and tracker counters.
    #[serde(flatten)]
    pub pool: OrchestratorStatus,
    /// Formats accepted as uploads.
    pub supported_formats: Vec<String>,
}

/// GET /api/v1/pipeline/status
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<PipelineStatusResponse> {
    Json(PipelineStatusResponse {
        pool: state.orchestrator().status(),
        supported_formats: FileFormat::ALL
            .iter()
            .map(|f| f.extension().to_string())
            .collect(),
    })
}
