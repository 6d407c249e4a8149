//! Integration tests for token issuance, the HLS stream gateway, and
//! single-use downloads.

mod helpers;

use finstream_api::tokens::TokenService;
use helpers::{processing_video, ready_video, setup_test_app, setup_test_app_with, test_config};
use serde_json::Value;

const MANIFEST: &str = "#EXTM3U\n#EXT-X-VERSION:3\n#EXTINF:6.0,\nseg_0000.ts\n#EXTINF:6.0,\nseg_0001.ts\n#EXT-X-ENDLIST\n";

async fn seed_hls_video(app: &helpers::TestApp, video_id: &str) {
    app.videos
        .insert(ready_video(video_id, &format!("hls/{}", video_id)));
    app.storage
        .upload_with_key(
            &format!("hls/{}/index.m3u8", video_id),
            MANIFEST.as_bytes().to_vec(),
            "application/vnd.apple.mpegurl",
        )
        .await
        .unwrap();
    app.storage
        .upload_with_key(
            &format!("hls/{}/seg_0000.ts", video_id),
            b"segment zero bytes".to_vec(),
            "video/MP2T",
        )
        .await
        .unwrap();
}

async fn issue_token(app: &helpers::TestApp, video_id: &str) -> String {
    let response = app
        .server
        .post(&format!("/api/v0/videos/{}/playback-token", video_id))
        .json(&serde_json::json!({}))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_playback_token_issue() {
    let app = setup_test_app().await;
    app.videos.insert(ready_video("vid_1", "hls/vid_1"));

    let response = app
        .server
        .post("/api/v0/videos/vid_1/playback-token")
        .json(&serde_json::json!({ "user_id": "user_42" }))
        .await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    assert_eq!(body["video_id"], "vid_1");
    assert!(body["token"].as_str().unwrap().contains('.'));
    assert!(body["expires_at"].as_i64().unwrap() > chrono::Utc::now().timestamp_millis());

    // Unknown videos never get a token.
    let response = app
        .server
        .post("/api/v0/videos/ghost/playback-token")
        .json(&serde_json::json!({}))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_manifest_is_rewritten_with_token() {
    let app = setup_test_app().await;
    seed_hls_video(&app, "vid_1").await;
    let token = issue_token(&app, "vid_1").await;

    let response = app
        .server
        .get(&format!("/api/v0/videos/vid_1/stream/index.m3u8?token={}", token))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "application/vnd.apple.mpegurl");
    assert_eq!(response.header("cache-control"), "no-cache");

    let body = response.text();
    assert!(body.contains(&format!("seg_0000.ts?token={}", token)));
    assert!(body.contains(&format!("seg_0001.ts?token={}", token)));
    assert!(body.contains("#EXT-X-VERSION:3"));
}

#[tokio::test]
async fn test_segment_served_with_immutable_cache() {
    let app = setup_test_app().await;
    seed_hls_video(&app, "vid_1").await;
    let token = issue_token(&app, "vid_1").await;

    let response = app
        .server
        .get(&format!("/api/v0/videos/vid_1/stream/seg_0000.ts?token={}", token))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "video/MP2T");
    assert_eq!(
        response.header("cache-control"),
        "public, max-age=31536000, immutable"
    );
    assert_eq!(response.as_bytes().as_ref(), b"segment zero bytes");
}

#[tokio::test]
async fn test_stream_requires_valid_token() {
    let app = setup_test_app().await;
    seed_hls_video(&app, "vid_1").await;
    app.videos.insert(ready_video("vid_2", "hls/vid_2"));

    // No token.
    let response = app.server.get("/api/v0/videos/vid_1/stream/index.m3u8").await;
    assert_eq!(response.status_code(), 401);

    // Garbage token.
    let response = app
        .server
        .get("/api/v0/videos/vid_1/stream/index.m3u8?token=not-a-token")
        .await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");

    // Token issued for a different video.
    let other = issue_token(&app, "vid_2").await;
    let response = app
        .server
        .get(&format!("/api/v0/videos/vid_1/stream/index.m3u8?token={}", other))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_segment_token_bound_to_one_path() {
    let app = setup_test_app().await;
    seed_hls_video(&app, "vid_1").await;

    let service = TokenService::new(&test_config());
    let segment_token = service
        .issue_segment_token("vid_1", "seg_0000.ts")
        .unwrap()
        .token;

    let response = app
        .server
        .get(&format!(
            "/api/v0/videos/vid_1/stream/seg_0000.ts?token={}",
            segment_token
        ))
        .await;
    assert_eq!(response.status_code(), 200);

    // The same token opens nothing else.
    let response = app
        .server
        .get(&format!(
            "/api/v0/videos/vid_1/stream/index.m3u8?token={}",
            segment_token
        ))
        .await;
    assert_eq!(response.status_code(), 401);
}

#[tokio::test]
async fn test_not_ready_video_is_rejected_before_storage() {
    let app = setup_test_app().await;
    app.videos.insert(processing_video("vid_wip"));
    // The asset exists, but readiness gating must reject first.
    app.storage
        .upload_with_key(
            "hls/vid_wip/index.m3u8",
            MANIFEST.as_bytes().to_vec(),
            "application/vnd.apple.mpegurl",
        )
        .await
        .unwrap();
    let token = issue_token(&app, "vid_wip").await;

    let response = app
        .server
        .get(&format!("/api/v0/videos/vid_wip/stream/index.m3u8?token={}", token))
        .await;
    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("not ready"));
}

#[tokio::test]
async fn test_expired_token_is_unauthorized() {
    let mut config = test_config();
    config.stream_token_ttl_secs = 0;
    let app = setup_test_app_with(config).await;
    seed_hls_video(&app, "vid_1").await;

    let token = issue_token(&app, "vid_1").await;
    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let response = app
        .server
        .get(&format!("/api/v0/videos/vid_1/stream/index.m3u8?token={}", token))
        .await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("expired"));
}

#[tokio::test]
async fn test_unknown_video_with_forged_scope_is_not_found() {
    let app = setup_test_app().await;
    // Valid signature for a video id the repository has never seen.
    let service = TokenService::new(&test_config());
    let token = service.issue_stream_token("ghost", None).unwrap().token;

    let response = app
        .server
        .get(&format!("/api/v0/videos/ghost/stream/index.m3u8?token={}", token))
        .await;
    assert_eq!(response.status_code(), 404);
}

#[tokio::test]
async fn test_path_traversal_rejected() {
    let app = setup_test_app().await;
    seed_hls_video(&app, "vid_1").await;
    let token = issue_token(&app, "vid_1").await;

    let response = app
        .server
        .get(&format!(
            "/api/v0/videos/vid_1/stream/..%2Fsecrets.ts?token={}",
            token
        ))
        .await;
    assert_eq!(response.status_code(), 400);
}

#[tokio::test]
async fn test_download_token_is_single_use() {
    let app = setup_test_app().await;
    app.storage
        .upload_with_key("workbook.pdf", b"%PDF-1.4 data".to_vec(), "application/pdf")
        .await
        .unwrap();

    let response = app.server.post("/api/v0/downloads/workbook.pdf/token").await;
    assert_eq!(response.status_code(), 200);
    let body: Value = response.json();
    let token = body["token"].as_str().unwrap().to_string();

    let response = app
        .server
        .get(&format!("/api/v0/downloads/workbook.pdf?token={}", token))
        .await;
    assert_eq!(response.status_code(), 200);
    assert_eq!(response.header("content-type"), "application/pdf");
    assert_eq!(
        response.header("content-disposition"),
        "attachment; filename=\"workbook.pdf\""
    );
    assert_eq!(response.as_bytes().as_ref(), b"%PDF-1.4 data");

    // Replaying the same URL fails.
    let response = app
        .server
        .get(&format!("/api/v0/downloads/workbook.pdf?token={}", token))
        .await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("already been used"));
}

#[tokio::test]
async fn test_download_token_bound_to_file() {
    let app = setup_test_app().await;
    for key in ["workbook.pdf", "other.pdf"] {
        app.storage
            .upload_with_key(key, b"%PDF-1.4 data".to_vec(), "application/pdf")
            .await
            .unwrap();
    }

    let response = app.server.post("/api/v0/downloads/workbook.pdf/token").await;
    let body: Value = response.json();
    let token = body["token"].as_str().unwrap().to_string();

    let response = app
        .server
        .get(&format!("/api/v0/downloads/other.pdf?token={}", token))
        .await;
    assert_eq!(response.status_code(), 401);

    // No token for files that do not exist.
    let response = app.server.post("/api/v0/downloads/ghost.pdf/token").await;
    assert_eq!(response.status_code(), 404);
}
