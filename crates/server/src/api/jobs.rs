//! Submission endpoints.

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};
use tracing::debug;

use docforge_core::{
    CompressionRequest, ConversionRequest, JobAcknowledgment, UploadedFile,
    DEFAULT_COMPRESSION_LEVEL,
};

use super::error::ApiError;
use crate::state::AppState;

/// Multipart field carrying the upload.
pub const FILE_FIELD: &str = "file";
pub const TARGET_FORMAT_FIELD: &str = "targetFormat";
pub const COMPRESSION_LEVEL_FIELD: &str = "compressionLevel";

/// Fields of a submission form, before validation.
#[derive(Debug, Default)]
struct SubmissionForm {
    file: Option<UploadedFile>,
    target_format: Option<String>,
    compression_level: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<SubmissionForm, ApiError> {
    let mut form = SubmissionForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await?;
                form.file = Some(UploadedFile::new(file_name, data.to_vec()));
            }
            TARGET_FORMAT_FIELD => form.target_format = Some(field.text().await?),
            COMPRESSION_LEVEL_FIELD => form.compression_level = Some(field.text().await?),
            other => debug!(field = other, "Ignoring unknown form field"),
        }
    }

    Ok(form)
}

fn parse_level(raw: Option<String>) -> Result<i64, ApiError> {
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(DEFAULT_COMPRESSION_LEVEL),
        Some(value) => value.parse().map_err(|_| {
            ApiError::validation("Compression level must be an integer.").with_details(value)
        }),
    }
}

/// POST /api/v1/convert
///
/// Accepts a conversion job. The acknowledgment returns before the
/// transform runs; progress is available under `/progress/{jobId}`.
pub async fn convert(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<JobAcknowledgment>, ApiError> {
    let form = read_form(multipart).await?;
    let ack = state
        .orchestrator()
        .submit_conversion(ConversionRequest {
            file: form.file,
            target_format: form.target_format,
        })
        .await?;
    Ok(Json(ack))
}

/// POST /api/v1/compress
pub async fn compress(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<JobAcknowledgment>, ApiError> {
    let form = read_form(multipart).await?;
    let level = parse_level(form.compression_level)?;
    let ack = state
        .orchestrator()
        .submit_compression(CompressionRequest {
            file: form.file,
            compression_level: Some(level),
        })
        .await?;
    Ok(Json(ack))
}
