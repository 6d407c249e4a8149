//! Configuration module
//!
//! Environment-driven configuration for the streaming and upload pipeline.
//! Call [`Config::from_env`] once at startup, then [`Config::validate`]
//! before serving; validation failures abort startup rather than falling
//! back to insecure defaults.

use std::env;

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_MAX_UPLOAD_SIZE_MB: usize = 100;
const DEFAULT_STREAM_TOKEN_TTL_SECS: u64 = 30;
const DEFAULT_SEGMENT_TOKEN_TTL_SECS: u64 = 10;
const DEFAULT_DOWNLOAD_TOKEN_TTL_SECS: u64 = 60;

/// Development-only fallback signing secret. Never accepted in production;
/// `validate()` rejects it there.
const DEV_FALLBACK_TOKEN_SECRET: &str = "finstream-dev-secret-do-not-deploy";

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,

    /// HMAC signing secret for stream/segment/download tokens.
    pub video_token_secret: String,
    pub stream_token_ttl_secs: u64,
    pub segment_token_ttl_secs: u64,
    pub download_token_ttl_secs: u64,

    /// Root directory for permanent artifact storage.
    pub storage_path: String,
    /// Public base URL under which stored artifacts are reachable.
    pub storage_base_url: String,
    /// Directory holding in-flight upload chunks.
    pub temp_upload_path: String,

    pub max_video_size_bytes: usize,
    pub video_allowed_extensions: Vec<String>,
    pub video_allowed_content_types: Vec<String>,
    pub max_document_size_bytes: usize,
    pub document_allowed_extensions: Vec<String>,
    pub document_allowed_content_types: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let video_token_secret = match env::var("VIDEO_TOKEN_SECRET") {
            Ok(secret) => secret,
            Err(_) => {
                tracing::warn!(
                    "VIDEO_TOKEN_SECRET not set, using development fallback secret; \
                     startup will fail in production"
                );
                DEV_FALLBACK_TOKEN_SECRET.to_string()
            }
        };

        let max_upload_size_mb = |var: &str| {
            env::var(var)
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_SIZE_MB)
        };

        let csv_list = |var: &str, default: &str| -> Vec<String> {
            env::var(var)
                .unwrap_or_else(|_| default.to_string())
                .split(',')
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect()
        };

        Ok(Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| DEFAULT_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/finstream".to_string()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            video_token_secret,
            stream_token_ttl_secs: env::var("STREAM_TOKEN_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_STREAM_TOKEN_TTL_SECS),
            segment_token_ttl_secs: env::var("SEGMENT_TOKEN_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SEGMENT_TOKEN_TTL_SECS),
            download_token_ttl_secs: env::var("DOWNLOAD_TOKEN_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_DOWNLOAD_TOKEN_TTL_SECS),
            storage_path: env::var("STORAGE_PATH")
                .unwrap_or_else(|_| "./data/media".to_string()),
            storage_base_url: env::var("STORAGE_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:4000/media".to_string()),
            temp_upload_path: env::var("TEMP_UPLOAD_PATH")
                .unwrap_or_else(|_| "./data/tmp/uploads".to_string()),
            max_video_size_bytes: max_upload_size_mb("MAX_VIDEO_SIZE_MB") * 1024 * 1024,
            video_allowed_extensions: csv_list(
                "VIDEO_ALLOWED_EXTENSIONS",
                "mp4,mov,webm,mkv",
            ),
            // Chunked uploads arrive as opaque blobs, so octet-stream is
            // allow-listed alongside the real media types.
            video_allowed_content_types: csv_list(
                "VIDEO_ALLOWED_CONTENT_TYPES",
                "video/mp4,video/quicktime,video/webm,video/x-matroska,application/octet-stream",
            ),
            max_document_size_bytes: max_upload_size_mb("MAX_DOCUMENT_SIZE_MB") * 1024 * 1024,
            document_allowed_extensions: csv_list("DOCUMENT_ALLOWED_EXTENSIONS", "pdf"),
            document_allowed_content_types: csv_list(
                "DOCUMENT_ALLOWED_CONTENT_TYPES",
                "application/pdf,application/octet-stream",
            ),
        })
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    /// Validate configuration invariants that must hold before serving.
    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() {
            if self.video_token_secret == DEV_FALLBACK_TOKEN_SECRET {
                return Err(anyhow::anyhow!(
                    "VIDEO_TOKEN_SECRET must be set explicitly in production"
                ));
            }
            if self.cors_origins.contains(&"*".to_string()) {
                return Err(anyhow::anyhow!(
                    "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
                ));
            }
        }
        if self.video_token_secret.len() < 16 {
            return Err(anyhow::anyhow!(
                "VIDEO_TOKEN_SECRET must be at least 16 characters long"
            ));
        }
        if self.max_video_size_bytes == 0 || self.max_document_size_bytes == 0 {
            return Err(anyhow::anyhow!("Upload size limits must be greater than 0"));
        }
        Ok(())
    }
}
