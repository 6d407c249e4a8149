//! Temporary chunk store for in-flight uploads.
//!
//! An upload session is identified by a client-generated `file_id` and exists
//! purely as filesystem state: each received chunk lives in its own file named
//! `{file_id}.chunk.{index}` inside the temp directory. Writes are idempotent
//! (re-uploading an index overwrites cleanly, supporting client retry) and
//! carry no ordering requirement; the finalizer reads indices 0..N-1
//! sequentially regardless of arrival order.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tokio::io::AsyncWriteExt;

#[derive(Debug, Error)]
pub enum ChunkStoreError {
    #[error("Invalid file id: {0}")]
    InvalidFileId(String),

    #[error("Chunk {index} not found for upload {file_id}")]
    ChunkMissing { file_id: String, index: u32 },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Filesystem-backed store for upload chunks.
#[derive(Clone)]
pub struct ChunkStore {
    dir: PathBuf,
}

impl ChunkStore {
    /// Create a chunk store rooted at `dir`, creating the directory if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self, ChunkStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(ChunkStore { dir })
    }

    /// Reject file ids that are empty or could act as path components.
    fn validate_file_id(file_id: &str) -> Result<(), ChunkStoreError> {
        let ok = !file_id.is_empty()
            && file_id.len() <= 128
            && file_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if ok {
            Ok(())
        } else {
            Err(ChunkStoreError::InvalidFileId(file_id.to_string()))
        }
    }

    fn chunk_path(&self, file_id: &str, index: u32) -> PathBuf {
        self.dir.join(format!("{}.chunk.{}", file_id, index))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write one chunk. The path is derived deterministically from
    /// `(file_id, index)`, so a retried upload overwrites its previous bytes.
    pub async fn write_chunk(
        &self,
        file_id: &str,
        index: u32,
        data: &[u8],
    ) -> Result<usize, ChunkStoreError> {
        Self::validate_file_id(file_id)?;

        // Tolerate a missing temp dir (e.g. cleaned up out-of-band).
        fs::create_dir_all(&self.dir).await?;

        let path = self.chunk_path(file_id, index);
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;

        tracing::debug!(
            file_id = %file_id,
            chunk_index = index,
            size_bytes = data.len(),
            "Chunk written"
        );

        Ok(data.len())
    }

    /// Read one chunk fully into memory. A missing chunk is a distinct error
    /// naming the index, so finalize failures are actionable.
    pub async fn read_chunk(&self, file_id: &str, index: u32) -> Result<Vec<u8>, ChunkStoreError> {
        Self::validate_file_id(file_id)?;

        let path = self.chunk_path(file_id, index);
        match fs::read(&path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(ChunkStoreError::ChunkMissing {
                    file_id: file_id.to_string(),
                    index,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Delete one chunk. Missing files succeed.
    pub async fn delete_chunk(&self, file_id: &str, index: u32) -> Result<(), ChunkStoreError> {
        Self::validate_file_id(file_id)?;

        let path = self.chunk_path(file_id, index);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort sweep of every `{file_id}.chunk.*` file. Individual delete
    /// failures are logged and swallowed; callers run this on both success and
    /// failure paths of finalize so no partial-upload debris is left behind.
    pub async fn cleanup(&self, file_id: &str) {
        if Self::validate_file_id(file_id).is_err() {
            return;
        }

        let prefix = format!("{}.chunk.", file_id);
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(file_id = %file_id, error = %e, "Failed to scan temp directory during cleanup");
                return;
            }
        };

        let mut removed = 0u32;
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.starts_with(&prefix) {
                continue;
            }
            if let Err(e) = fs::remove_file(entry.path()).await {
                tracing::warn!(
                    file_id = %file_id,
                    chunk_file = %name,
                    error = %e,
                    "Failed to delete chunk during cleanup"
                );
            } else {
                removed += 1;
            }
        }

        if removed > 0 {
            tracing::debug!(file_id = %file_id, removed, "Cleaned up upload chunks");
        }
    }
}
