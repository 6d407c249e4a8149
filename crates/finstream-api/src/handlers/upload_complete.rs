//! Upload finalizer: assembles received chunks into a stored artifact.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::handlers::content_type_for;
use crate::state::AppState;
use crate::validation::{UploadKind, UploadValidator};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use finstream_core::AppError;
use finstream_storage::generate_artifact_name;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

/// Declared size may legitimately drift from assembled size by a few bytes
/// (form-field padding on some clients); larger drift is logged, not fatal.
const SIZE_MISMATCH_TOLERANCE_BYTES: i64 = 1000;

/// Request to finalize a chunked upload
#[derive(Debug, Deserialize, ToSchema)]
pub struct CompleteUploadRequest {
    /// Client-generated upload session identifier
    pub file_id: String,
    /// Total number of chunks that were uploaded
    pub total_chunks: u32,
    /// Original filename (contributes only its extension)
    pub file_name: String,
    /// Declared total file size in bytes
    pub file_size: u64,
}

/// Response for a finalized upload
#[derive(Debug, Serialize, ToSchema)]
pub struct CompleteUploadResponse {
    /// Original filename as the client declared it; the generated storage
    /// name is visible in `file_url`.
    pub file_name: String,
    /// Public URL of the stored artifact
    pub file_url: String,
    /// Actual assembled size in bytes
    pub file_size: u64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    pub chunks_count: u32,
}

/// Finalize a chunked upload by assembling its chunks
#[utoipa::path(
    post,
    path = "/api/v0/uploads/{kind}/complete",
    tag = "uploads",
    params(
        ("kind" = String, Path, description = "Upload kind: video or document")
    ),
    request_body = CompleteUploadRequest,
    responses(
        (status = 200, description = "Upload finalized", body = CompleteUploadResponse),
        (status = 400, description = "Invalid input or missing chunk", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn complete_upload(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    ValidatedJson(request): ValidatedJson<CompleteUploadRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    let kind = UploadKind::parse(&kind)?;
    let validator = UploadValidator::for_kind(&state.config, kind);

    let result = assemble_and_store(&state, kind, &validator, &request).await;

    // Sweep leftovers on both success and failure so no partial-upload
    // debris outlives the session.
    state.chunks.cleanup(&request.file_id).await;

    result.map(Json)
}

async fn assemble_and_store(
    state: &AppState,
    kind: UploadKind,
    validator: &UploadValidator,
    request: &CompleteUploadRequest,
) -> Result<CompleteUploadResponse, HttpAppError> {
    if request.total_chunks == 0 {
        return Err(HttpAppError::from(AppError::InvalidInput(
            "Field 'total_chunks' must be greater than 0".to_string(),
        )));
    }
    validator.validate_filename(&request.file_name)?;

    // Read in index order regardless of arrival order. A missing index is
    // fatal and names the hole; a failed delete after reading is not.
    let mut assembled: Vec<u8> = Vec::new();
    for index in 0..request.total_chunks {
        let data = state.chunks.read_chunk(&request.file_id, index).await?;
        assembled.extend_from_slice(&data);

        if let Err(e) = state.chunks.delete_chunk(&request.file_id, index).await {
            tracing::warn!(
                file_id = %request.file_id,
                chunk_index = index,
                error = %e,
                "Failed to delete chunk after reading"
            );
        }
    }

    let assembled_size = assembled.len() as u64;
    let drift = assembled_size as i64 - request.file_size as i64;
    if drift.abs() > SIZE_MISMATCH_TOLERANCE_BYTES {
        tracing::warn!(
            file_id = %request.file_id,
            declared_bytes = request.file_size,
            assembled_bytes = assembled_size,
            "Assembled size differs from declared size"
        );
    }
    validator.validate_file_size(assembled.len())?;

    let artifact_name = generate_artifact_name(kind.as_str(), &request.file_name);
    let key = format!("{}/{}", kind.key_prefix(), artifact_name);
    let mime_type = content_type_for(&key).to_string();

    let file_url = state
        .storage
        .upload_with_key(&key, assembled, &mime_type)
        .await?;

    tracing::info!(
        kind = %kind,
        file_id = %request.file_id,
        key = %key,
        size_bytes = assembled_size,
        chunks = request.total_chunks,
        "Upload finalized"
    );

    Ok(CompleteUploadResponse {
        file_name: request.file_name.clone(),
        file_url,
        file_size: assembled_size,
        mime_type,
        uploaded_at: Utc::now(),
        chunks_count: request.total_chunks,
    })
}
