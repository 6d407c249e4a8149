//! Video repository: read-only lookup of CMS-owned video records.

use finstream_core::models::{ProcessingStatus, Video};
use finstream_core::AppError;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Read-only access to video records, keyed by the public `video_id`.
#[async_trait::async_trait]
pub trait VideoRepository: Send + Sync {
    async fn find_by_public_id(&self, video_id: &str) -> Result<Option<Video>, AppError>;
}

/// Row type for the videos table (for FromRow).
#[derive(Debug, sqlx::FromRow)]
struct VideoRow {
    id: Uuid,
    video_id: String,
    title: String,
    processing_status: ProcessingStatus,
    hls_segments_path: Option<String>,
    duration_secs: Option<f64>,
    created_at: chrono::DateTime<chrono::Utc>,
    updated_at: chrono::DateTime<chrono::Utc>,
}

impl VideoRow {
    fn into_video(self) -> Video {
        Video {
            id: self.id,
            video_id: self.video_id,
            title: self.title,
            processing_status: self.processing_status,
            hls_segments_path: self.hls_segments_path,
            duration_secs: self.duration_secs,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Postgres-backed repository over the CMS `videos` table.
#[derive(Clone)]
pub struct PgVideoRepository {
    pool: PgPool,
}

impl PgVideoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VideoRepository for PgVideoRepository {
    #[tracing::instrument(skip(self), fields(db.table = "videos"))]
    async fn find_by_public_id(&self, video_id: &str) -> Result<Option<Video>, AppError> {
        let row: Option<VideoRow> = sqlx::query_as::<Postgres, VideoRow>(
            r#"
            SELECT id, video_id, title, processing_status, hls_segments_path,
                   duration_secs, created_at, updated_at
            FROM videos
            WHERE video_id = $1
            "#,
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(VideoRow::into_video))
    }
}
