use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{download, handlers, jobs, middleware::metrics_middleware, pipeline, progress};
use crate::state::AppState;

/// Room for multipart boundaries and the small text fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn create_router(state: Arc<AppState>) -> Router {
    let body_limit = usize::try_from(state.config().upload.max_file_size_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD_BYTES);

    // API routes
    let api_routes = Router::new()
        // Health and config
        .route("/health", get(handlers::health))
        .route("/config", get(handlers::get_config))
        // Submission
        .route("/convert", post(jobs::convert))
        .route("/compress", post(jobs::compress))
        // Progress
        .route("/progress/{job_id}", get(progress::stream_progress))
        .route("/status/{job_id}", get(progress::get_status))
        // Retrieval
        .route("/download/{file_id}", get(download::download))
        // Worker pool
        .route("/pipeline/status", get(pipeline::get_status))
        .layer(DefaultBodyLimit::max(body_limit));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
