//! Collision-resistant artifact naming.
//!
//! Final artifact names are `{prefix}_{timestamp}_{random}.{ext}` so a stored
//! file can never collide with, or be addressed by, a user-chosen name. The
//! extension is the only part taken from the original filename, and it is
//! lowercased.

use rand::distr::Alphanumeric;
use rand::Rng;

const RANDOM_TOKEN_LEN: usize = 16;

/// Generate a fresh storage filename for a finalized artifact.
///
/// `prefix` identifies the upload kind (e.g. `video`, `document`);
/// `original_filename` contributes only its extension, defaulting to `bin`
/// when absent.
pub fn generate_artifact_name(prefix: &str, original_filename: &str) -> String {
    let ext = std::path::Path::new(original_filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_else(|| "bin".to_string());

    let timestamp = chrono::Utc::now().timestamp_millis();
    let token: String = rand::rng()
        .sample_iter(&Alphanumeric)
        .take(RANDOM_TOKEN_LEN)
        .map(char::from)
        .collect();

    format!("{}_{}_{}.{}", prefix, timestamp, token, ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_uses_prefix_and_extension() {
        let name = generate_artifact_name("video", "Lesson 1 FINAL.MP4");
        assert!(name.starts_with("video_"));
        assert!(name.ends_with(".mp4"));
    }

    #[test]
    fn test_name_never_contains_original_stem() {
        let name = generate_artifact_name("document", "../../etc/passwd.pdf");
        assert!(!name.contains("passwd"));
        assert!(!name.contains(".."));
        assert!(name.ends_with(".pdf"));
    }

    #[test]
    fn test_missing_extension_defaults_to_bin() {
        let name = generate_artifact_name("document", "noextension");
        assert!(name.ends_with(".bin"));
    }

    #[test]
    fn test_names_are_unique() {
        let a = generate_artifact_name("video", "a.mp4");
        let b = generate_artifact_name("video", "a.mp4");
        assert_ne!(a, b);
    }
}
