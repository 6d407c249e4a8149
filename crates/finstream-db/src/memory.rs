//! In-memory video repository for tests and database-less local development.

use crate::video::VideoRepository;
use finstream_core::models::Video;
use finstream_core::AppError;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Default)]
pub struct InMemoryVideoRepository {
    videos: Mutex<HashMap<String, Video>>,
}

impl InMemoryVideoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, video: Video) {
        self.videos
            .lock()
            .expect("video map poisoned")
            .insert(video.video_id.clone(), video);
    }
}

#[async_trait::async_trait]
impl VideoRepository for InMemoryVideoRepository {
    async fn find_by_public_id(&self, video_id: &str) -> Result<Option<Video>, AppError> {
        Ok(self
            .videos
            .lock()
            .expect("video map poisoned")
            .get(video_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use finstream_core::models::ProcessingStatus;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_insert_and_find() {
        let repo = InMemoryVideoRepository::new();
        repo.insert(Video {
            id: Uuid::new_v4(),
            video_id: "vid_1".to_string(),
            title: "Budgeting basics".to_string(),
            processing_status: ProcessingStatus::Completed,
            hls_segments_path: Some("hls/vid_1".to_string()),
            duration_secs: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });

        let found = repo.find_by_public_id("vid_1").await.unwrap();
        assert!(found.is_some());
        assert!(repo.find_by_public_id("vid_2").await.unwrap().is_none());
    }
}
