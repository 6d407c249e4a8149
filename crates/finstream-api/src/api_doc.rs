//! OpenAPI documentation assembled from handler annotations.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Finstream API",
        description = "Secure HLS streaming and chunked upload pipeline"
    ),
    paths(
        crate::handlers::upload_chunk::upload_chunk,
        crate::handlers::upload_complete::complete_upload,
        crate::handlers::playback_token::issue_playback_token,
        crate::handlers::playback_token::issue_download_token,
        crate::handlers::video_stream::stream_asset,
        crate::handlers::download::download_file,
    ),
    components(schemas(
        crate::error::ErrorResponse,
        crate::handlers::upload_chunk::ChunkUploadResponse,
        crate::handlers::upload_complete::CompleteUploadRequest,
        crate::handlers::upload_complete::CompleteUploadResponse,
        crate::handlers::playback_token::PlaybackTokenRequest,
        crate::handlers::playback_token::PlaybackTokenResponse,
        crate::handlers::playback_token::DownloadTokenResponse,
    )),
    tags(
        (name = "uploads", description = "Chunked upload endpoints"),
        (name = "videos", description = "Playback tokens and HLS streaming"),
        (name = "downloads", description = "Single-use artifact downloads")
    )
)]
pub struct ApiDoc;
