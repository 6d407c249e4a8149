//! Signed playback, segment, and download tokens.
//!
//! Tokens are a compact two-part envelope: `base64url(payload_json) "." base64url(sig)`
//! where `sig` is HMAC-SHA256 over the encoded payload. Verification is
//! constant-time via `Mac::verify_slice` and never panics on malformed input.
//!
//! Three kinds with distinct lifetimes:
//! - stream tokens gate playlist access (short TTL, bound to a video id)
//! - segment tokens gate individual `.ts` fetches (very short TTL, bound to
//!   a video id and a segment path)
//! - download tokens gate file downloads (single-use, carry a nonce)

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::Utc;
use finstream_core::{AppError, Config};
use hmac::{Hmac, Mac};
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

type HmacSha256 = Hmac<Sha256>;

/// How long consumed download tokens are remembered. Anything older than
/// this is necessarily expired, so the entry can be dropped.
const CONSUMED_RETENTION: Duration = Duration::from_secs(3600);

/// Reasons a token fails verification. Callers map all of these to a 401;
/// the discriminant only shows up in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token format is invalid")]
    InvalidFormat,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token has expired")]
    Expired,
    #[error("token was issued for a different video")]
    VideoMismatch,
    #[error("token was issued for a different segment")]
    SegmentMismatch,
    #[error("token was issued for a different file")]
    FileMismatch,
    #[error("token has already been used")]
    AlreadyUsed,
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        AppError::Unauthorized(err.to_string())
    }
}

// `deny_unknown_fields` keeps the kinds disjoint: a segment token can never
// deserialize as a (broader) stream token.
#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StreamClaims {
    video_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_id: Option<String>,
    expires_at: i64,
    /// Issuance time, epoch milliseconds.
    timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct SegmentClaims {
    video_id: String,
    segment_path: String,
    expires_at: i64,
    timestamp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DownloadClaims {
    file_id: String,
    nonce: String,
    expires_at: i64,
    timestamp: i64,
}

/// A freshly issued token plus its expiry, for the issue-endpoint response.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    /// Epoch milliseconds.
    pub expires_at: i64,
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn sign_claims<T: Serialize>(secret: &[u8], claims: &T) -> Result<String, AppError> {
    let payload = serde_json::to_vec(claims)?;
    let encoded = URL_SAFE_NO_PAD.encode(payload);
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|_| AppError::Internal("token secret is empty".to_string()))?;
    mac.update(encoded.as_bytes());
    let sig = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());
    Ok(format!("{encoded}.{sig}"))
}

fn verify_claims<T: DeserializeOwned>(
    secret: &[u8],
    token: &str,
    now_ms: i64,
) -> Result<T, TokenError> {
    let (encoded, sig_b64) = token.split_once('.').ok_or(TokenError::InvalidFormat)?;
    if encoded.is_empty() || sig_b64.is_empty() || sig_b64.contains('.') {
        return Err(TokenError::InvalidFormat);
    }

    let sig = URL_SAFE_NO_PAD
        .decode(sig_b64)
        .map_err(|_| TokenError::InvalidSignature)?;
    let mut mac =
        HmacSha256::new_from_slice(secret).map_err(|_| TokenError::InvalidSignature)?;
    mac.update(encoded.as_bytes());
    mac.verify_slice(&sig)
        .map_err(|_| TokenError::InvalidSignature)?;

    // Only parse after the signature checks out.
    let payload = URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|_| TokenError::InvalidFormat)?;
    let claims: serde_json::Value =
        serde_json::from_slice(&payload).map_err(|_| TokenError::InvalidFormat)?;
    let expires_at = claims
        .get("expires_at")
        .and_then(serde_json::Value::as_i64)
        .ok_or(TokenError::InvalidFormat)?;
    if now_ms > expires_at {
        return Err(TokenError::Expired);
    }
    serde_json::from_value(claims).map_err(|_| TokenError::InvalidFormat)
}

/// Tracks consumed download-token nonces so each token redeems at most once.
///
/// Process-local by design: a multi-instance deployment would swap this for a
/// shared store behind the same methods.
#[derive(Default)]
pub struct ConsumedTokens {
    inner: Mutex<HashMap<String, Instant>>,
}

impl ConsumedTokens {
    /// Marks `nonce` consumed. Returns false if it was already consumed.
    fn consume(&self, nonce: &str) -> bool {
        let mut map = self.inner.lock().expect("consumed-token map poisoned");
        map.insert(nonce.to_string(), Instant::now()).is_none()
    }

    /// Drops entries older than the retention window.
    pub fn evict_expired(&self) {
        let mut map = self.inner.lock().expect("consumed-token map poisoned");
        map.retain(|_, consumed_at| consumed_at.elapsed() < CONSUMED_RETENTION);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("consumed-token map poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Issues and verifies all three token kinds with one shared secret.
#[derive(Clone)]
pub struct TokenService {
    secret: Vec<u8>,
    stream_ttl_ms: i64,
    segment_ttl_ms: i64,
    download_ttl_ms: i64,
    consumed: Arc<ConsumedTokens>,
}

impl TokenService {
    pub fn new(config: &Config) -> Self {
        Self {
            secret: config.video_token_secret.as_bytes().to_vec(),
            stream_ttl_ms: config.stream_token_ttl_secs as i64 * 1000,
            segment_ttl_ms: config.segment_token_ttl_secs as i64 * 1000,
            download_ttl_ms: config.download_token_ttl_secs as i64 * 1000,
            consumed: Arc::new(ConsumedTokens::default()),
        }
    }

    pub fn consumed(&self) -> Arc<ConsumedTokens> {
        Arc::clone(&self.consumed)
    }

    pub fn issue_stream_token(
        &self,
        video_id: &str,
        user_id: Option<&str>,
    ) -> Result<IssuedToken, AppError> {
        let issued_at = now_ms();
        let expires_at = issued_at + self.stream_ttl_ms;
        let token = sign_claims(
            &self.secret,
            &StreamClaims {
                video_id: video_id.to_string(),
                user_id: user_id.map(str::to_string),
                expires_at,
                timestamp: issued_at,
            },
        )?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies a stream token against the video being requested. Returns the
    /// user id the token was issued for, if any.
    pub fn verify_stream_token(
        &self,
        token: &str,
        video_id: &str,
    ) -> Result<Option<String>, TokenError> {
        let claims: StreamClaims = verify_claims(&self.secret, token, now_ms())?;
        if claims.video_id != video_id {
            return Err(TokenError::VideoMismatch);
        }
        Ok(claims.user_id)
    }

    pub fn issue_segment_token(
        &self,
        video_id: &str,
        segment_path: &str,
    ) -> Result<IssuedToken, AppError> {
        let issued_at = now_ms();
        let expires_at = issued_at + self.segment_ttl_ms;
        let token = sign_claims(
            &self.secret,
            &SegmentClaims {
                video_id: video_id.to_string(),
                segment_path: segment_path.to_string(),
                expires_at,
                timestamp: issued_at,
            },
        )?;
        Ok(IssuedToken { token, expires_at })
    }

    pub fn verify_segment_token(
        &self,
        token: &str,
        video_id: &str,
        segment_path: &str,
    ) -> Result<(), TokenError> {
        let claims: SegmentClaims = verify_claims(&self.secret, token, now_ms())?;
        if claims.video_id != video_id {
            return Err(TokenError::VideoMismatch);
        }
        if claims.segment_path != segment_path {
            return Err(TokenError::SegmentMismatch);
        }
        Ok(())
    }

    pub fn issue_download_token(&self, file_id: &str) -> Result<IssuedToken, AppError> {
        let nonce: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();
        let issued_at = now_ms();
        let expires_at = issued_at + self.download_ttl_ms;
        let token = sign_claims(
            &self.secret,
            &DownloadClaims {
                file_id: file_id.to_string(),
                nonce,
                expires_at,
                timestamp: issued_at,
            },
        )?;
        Ok(IssuedToken { token, expires_at })
    }

    /// Verifies a download token and consumes its nonce. A second call with
    /// the same token fails with [`TokenError::AlreadyUsed`] even while the
    /// token is otherwise still valid.
    pub fn verify_and_consume_download_token(
        &self,
        token: &str,
        file_id: &str,
    ) -> Result<(), TokenError> {
        let claims: DownloadClaims = verify_claims(&self.secret, token, now_ms())?;
        if claims.file_id != file_id {
            return Err(TokenError::FileMismatch);
        }
        if !self.consumed.consume(&claims.nonce) {
            return Err(TokenError::AlreadyUsed);
        }
        Ok(())
    }
}
