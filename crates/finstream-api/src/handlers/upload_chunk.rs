//! Chunk receiver for resumable uploads.
//!
//! Each request carries one chunk of a larger file as multipart form data.
//! Chunks land in the temp directory keyed by `(file_id, chunk_index)` and
//! are assembled later by the completion endpoint.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use crate::validation::{UploadKind, UploadValidator};
use axum::{
    extract::{Multipart, Path, State},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use finstream_core::AppError;
use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;

/// Response for a single received chunk
#[derive(Debug, Serialize, ToSchema)]
pub struct ChunkUploadResponse {
    /// Client-generated upload session identifier
    pub file_id: String,
    /// Chunk index (0-based)
    pub chunk_index: u32,
    /// Total number of chunks in the upload
    pub total_chunks: u32,
    /// Size of this chunk in bytes
    pub chunk_size: usize,
    /// Upload progress percentage (0-100)
    pub progress: u32,
    pub uploaded_at: DateTime<Utc>,
}

/// Multipart fields collected from one chunk request.
#[derive(Debug, Default)]
struct ChunkForm {
    chunk: Option<bytes::Bytes>,
    chunk_content_type: Option<String>,
    chunk_index: Option<String>,
    total_chunks: Option<String>,
    file_id: Option<String>,
    file_name: Option<String>,
    file_size: Option<String>,
}

async fn read_form(multipart: &mut Multipart) -> Result<ChunkForm, AppError> {
    let mut form = ChunkForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        match name.as_str() {
            "chunk" => {
                form.chunk_content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read chunk field: {}", e))
                })?;
                form.chunk = Some(data);
            }
            "chunk_index" | "total_chunks" | "file_id" | "file_name" | "file_size" => {
                let value = field.text().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read field '{}': {}", name, e))
                })?;
                match name.as_str() {
                    "chunk_index" => form.chunk_index = Some(value),
                    "total_chunks" => form.total_chunks = Some(value),
                    "file_id" => form.file_id = Some(value),
                    "file_name" => form.file_name = Some(value),
                    "file_size" => form.file_size = Some(value),
                    _ => unreachable!(),
                }
            }
            other => {
                tracing::debug!(field = %other, "Ignoring unknown multipart field");
            }
        }
    }

    Ok(form)
}

fn require<T>(value: Option<T>, field: &str) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::InvalidInput(format!("Missing required field '{}'", field)))
}

fn parse_u32(value: &str, field: &str) -> Result<u32, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Field '{}' must be a non-negative integer", field)))
}

fn parse_u64(value: &str, field: &str) -> Result<u64, AppError> {
    value
        .trim()
        .parse()
        .map_err(|_| AppError::InvalidInput(format!("Field '{}' must be a non-negative integer", field)))
}

/// Receive one chunk of a resumable upload
#[utoipa::path(
    post,
    path = "/api/v0/uploads/{kind}/chunk",
    tag = "uploads",
    params(
        ("kind" = String, Path, description = "Upload kind: video or document")
    ),
    responses(
        (status = 200, description = "Chunk stored", body = ChunkUploadResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 413, description = "Declared file size exceeds the limit", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn upload_chunk(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let kind = UploadKind::parse(&kind)?;
    let validator = UploadValidator::for_kind(&state.config, kind);

    let form = read_form(&mut multipart).await?;

    // Required fields first, each with its own message. `file_name` and
    // `file_size` are optional on a chunk request; the finalizer carries
    // the authoritative values.
    let chunk = require(form.chunk, "chunk")?;
    let chunk_index = parse_u32(&require(form.chunk_index, "chunk_index")?, "chunk_index")?;
    let total_chunks = parse_u32(&require(form.total_chunks, "total_chunks")?, "total_chunks")?;
    let file_id = require(form.file_id, "file_id")?;
    let file_name = form.file_name;
    let file_size = form
        .file_size
        .as_deref()
        .map(|v| parse_u64(v, "file_size"))
        .transpose()?;

    if total_chunks == 0 {
        return Err(HttpAppError::from(AppError::InvalidInput(
            "Field 'total_chunks' must be greater than 0".to_string(),
        )));
    }
    if chunk_index >= total_chunks {
        return Err(HttpAppError::from(AppError::InvalidInput(format!(
            "Field 'chunk_index' ({}) must be less than total_chunks ({})",
            chunk_index, total_chunks
        ))));
    }

    // Declared size limit, then content type, then extension.
    if let Some(size) = file_size {
        validator.validate_file_size(size as usize)?;
    }
    if let Some(ref content_type) = form.chunk_content_type {
        validator.validate_content_type(content_type)?;
    }
    if let Some(ref file_name) = file_name {
        validator.validate_filename(file_name)?;
    }

    let chunk_size = state.chunks.write_chunk(&file_id, chunk_index, &chunk).await?;

    let progress = (((chunk_index + 1) as f64 / total_chunks as f64) * 100.0).round() as u32;

    tracing::info!(
        kind = %kind,
        file_id = %file_id,
        chunk_index,
        total_chunks,
        size_bytes = chunk_size,
        progress,
        "Chunk received"
    );

    Ok(Json(ChunkUploadResponse {
        file_id,
        chunk_index,
        total_chunks,
        chunk_size,
        progress,
        uploaded_at: Utc::now(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_rounding() {
        let progress = |index: u32, total: u32| -> u32 {
            (((index + 1) as f64 / total as f64) * 100.0).round() as u32
        };
        assert_eq!(progress(0, 3), 33);
        assert_eq!(progress(1, 3), 67);
        assert_eq!(progress(2, 3), 100);
        assert_eq!(progress(0, 1), 100);
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!(parse_u32("abc", "chunk_index").is_err());
        assert!(parse_u32("-1", "chunk_index").is_err());
        assert_eq!(parse_u32(" 7 ", "chunk_index").unwrap(), 7);
    }
}
