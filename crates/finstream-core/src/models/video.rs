use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "processing_status", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl Display for ProcessingStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProcessingStatus::Pending => write!(f, "pending"),
            ProcessingStatus::Processing => write!(f, "processing"),
            ProcessingStatus::Completed => write!(f, "completed"),
            ProcessingStatus::Failed => write!(f, "failed"),
        }
    }
}

/// A video record as persisted by the CMS layer.
///
/// The pipeline never creates or mutates these rows; it reads them to
/// authorize and serve streaming requests. `video_id` is the public stable
/// identifier exposed in URLs, distinct from the internal primary key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
    pub id: Uuid,
    pub video_id: String,
    pub title: String,
    pub processing_status: ProcessingStatus,
    /// Storage key prefix under which the transcoder placed `index.m3u8`
    /// and the numbered `.ts` segments. None until transcoding starts.
    pub hls_segments_path: Option<String>,
    pub duration_secs: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// A video is streamable once transcoding has completed and the HLS
    /// output location is known.
    pub fn is_ready(&self) -> bool {
        self.processing_status == ProcessingStatus::Completed && self.hls_segments_path.is_some()
    }
}
