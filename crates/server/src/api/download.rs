//! Processed artifact download.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::warn;

use docforge_core::FileFormat;

use super::error::ApiError;
use crate::state::AppState;

pub const NO_CACHE: &str = "no-cache, no-store, must-revalidate";
const OCTET_STREAM: &str = "application/octet-stream";

/// Content type for a stored file name, by extension.
pub fn content_type_for(file_name: &str) -> &'static str {
    FileFormat::from_file_name(file_name)
        .map(|format| format.mime_type())
        .unwrap_or(OCTET_STREAM)
}

/// `Content-Disposition` value for an attachment named `file_name`.
///
/// The quoted `filename` is an ASCII fallback with quotes, backslashes and
/// control characters replaced. `filename*` carries the exact name.
pub fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '_',
        })
        .collect();
    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}

/// GET /api/v1/download/{file_id}
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Response, ApiError> {
    let not_found = || ApiError::not_found(format!("File not found: {}", file_id));

    let artifact = match state.storage().open_processed(&file_id).await {
        Ok(artifact) => artifact,
        Err(e) => {
            warn!(file_id = %file_id, "Download refused: {}", e);
            return Err(not_found());
        }
    };

    let bytes = tokio::fs::read(&artifact.path).await.map_err(|e| {
        warn!(file_id = %file_id, "Failed to read processed file: {}", e);
        not_found()
    })?;

    let disposition = content_disposition(&artifact.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, content_type_for(&artifact.file_name).to_string()),
            (header::CONTENT_DISPOSITION, disposition),
            (header::CACHE_CONTROL, NO_CACHE.to_string()),
        ],
        Body::from(bytes),
    )
        .into_response())
}
