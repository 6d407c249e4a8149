//! Upload validation: kinds, filenames, sizes, content types.

use finstream_core::Config;
use std::path::Path;

/// Common validation errors for uploaded files
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Unknown upload kind: {0} (allowed: video, document)")]
    UnknownKind(String),

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: usize, max: usize },

    #[error("Invalid file extension: {extension} (allowed: {allowed:?})")]
    InvalidExtension {
        extension: String,
        allowed: Vec<String>,
    },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },

    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Empty file")]
    EmptyFile,
}

/// The two artifact kinds the upload pipeline accepts, each with its own
/// size limit, extension allowlist, and storage prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Video,
    Document,
}

impl UploadKind {
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.to_lowercase().as_str() {
            "video" => Ok(UploadKind::Video),
            "document" => Ok(UploadKind::Document),
            other => Err(ValidationError::UnknownKind(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Video => "video",
            UploadKind::Document => "document",
        }
    }

    /// Storage key prefix for finalized artifacts of this kind.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            UploadKind::Video => "videos",
            UploadKind::Document => "documents",
        }
    }
}

impl std::fmt::Display for UploadKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upload file validator
///
/// Per-kind validation logic, configured from the kind's limits in [`Config`].
pub struct UploadValidator {
    max_file_size: usize,
    allowed_extensions: Vec<String>,
    allowed_content_types: Vec<String>,
}

impl UploadValidator {
    pub fn new(
        max_file_size: usize,
        allowed_extensions: Vec<String>,
        allowed_content_types: Vec<String>,
    ) -> Self {
        Self {
            max_file_size,
            allowed_extensions,
            allowed_content_types,
        }
    }

    pub fn for_kind(config: &Config, kind: UploadKind) -> Self {
        match kind {
            UploadKind::Video => Self::new(
                config.max_video_size_bytes,
                config.video_allowed_extensions.clone(),
                config.video_allowed_content_types.clone(),
            ),
            UploadKind::Document => Self::new(
                config.max_document_size_bytes,
                config.document_allowed_extensions.clone(),
                config.document_allowed_content_types.clone(),
            ),
        }
    }

    pub fn max_file_size(&self) -> usize {
        self.max_file_size
    }

    /// Validate total file size
    pub fn validate_file_size(&self, size: usize) -> Result<(), ValidationError> {
        if size == 0 {
            return Err(ValidationError::EmptyFile);
        }

        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate the original filename: no path separators, a known extension.
    pub fn validate_filename(&self, filename: &str) -> Result<(), ValidationError> {
        if filename.is_empty()
            || filename.contains('/')
            || filename.contains('\\')
            || filename.contains("..")
        {
            return Err(ValidationError::InvalidFilename(filename.to_string()));
        }

        let extension = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .ok_or_else(|| ValidationError::InvalidFilename(filename.to_string()))?;

        if !self.allowed_extensions.contains(&extension) {
            return Err(ValidationError::InvalidExtension {
                extension,
                allowed: self.allowed_extensions.clone(),
            });
        }

        Ok(())
    }

    /// Validate content type when the client supplies one
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        let normalized = content_type.to_lowercase();

        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == &normalized)
        {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_validator() -> UploadValidator {
        UploadValidator::new(
            1024 * 1024, // 1MB
            vec!["mp4".to_string(), "mov".to_string()],
            vec!["video/mp4".to_string(), "video/quicktime".to_string()],
        )
    }

    #[test]
    fn test_parse_kind() {
        assert_eq!(UploadKind::parse("video").unwrap(), UploadKind::Video);
        assert_eq!(UploadKind::parse("Document").unwrap(), UploadKind::Document);
        assert!(matches!(
            UploadKind::parse("audio"),
            Err(ValidationError::UnknownKind(_))
        ));
    }

    #[test]
    fn test_validate_file_size() {
        let validator = test_validator();
        assert!(validator.validate_file_size(512 * 1024).is_ok());
        assert!(validator.validate_file_size(2 * 1024 * 1024).is_err());
        assert!(matches!(
            validator.validate_file_size(0),
            Err(ValidationError::EmptyFile)
        ));
    }

    #[test]
    fn test_validate_filename_extension() {
        let validator = test_validator();
        assert!(validator.validate_filename("lesson.mp4").is_ok());
        assert!(validator.validate_filename("lesson.MOV").is_ok()); // case insensitive
        assert!(validator.validate_filename("lesson.avi").is_err());
        assert!(validator.validate_filename("noextension").is_err());
    }

    #[test]
    fn test_validate_filename_rejects_path_components() {
        let validator = test_validator();
        assert!(validator.validate_filename("../evil.mp4").is_err());
        assert!(validator.validate_filename("dir/evil.mp4").is_err());
        assert!(validator.validate_filename("dir\\evil.mp4").is_err());
        assert!(validator.validate_filename("").is_err());
    }

    #[test]
    fn test_validate_content_type() {
        let validator = test_validator();
        assert!(validator.validate_content_type("video/mp4").is_ok());
        assert!(validator.validate_content_type("VIDEO/MP4").is_ok()); // case insensitive
        assert!(validator.validate_content_type("video/webm").is_err());
    }

    #[test]
    fn test_for_kind_uses_document_limits() {
        let config = finstream_core::Config {
            server_port: 4000,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            database_url: String::new(),
            db_max_connections: 1,
            video_token_secret: "a-long-enough-test-secret".to_string(),
            stream_token_ttl_secs: 30,
            segment_token_ttl_secs: 10,
            download_token_ttl_secs: 60,
            storage_path: String::new(),
            storage_base_url: String::new(),
            temp_upload_path: String::new(),
            max_video_size_bytes: 100,
            video_allowed_extensions: vec!["mp4".to_string()],
            video_allowed_content_types: vec!["video/mp4".to_string()],
            max_document_size_bytes: 50,
            document_allowed_extensions: vec!["pdf".to_string()],
            document_allowed_content_types: vec!["application/pdf".to_string()],
        };

        let validator = UploadValidator::for_kind(&config, UploadKind::Document);
        assert_eq!(validator.max_file_size(), 50);
        assert!(validator.validate_filename("workbook.pdf").is_ok());
        assert!(validator.validate_filename("lesson.mp4").is_err());
    }
}
