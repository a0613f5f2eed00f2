//! Upload-endpoint gate.
//!
//! A narrower, cheaper filter that runs before media validation on raw
//! multipart image uploads:
//!
//! - its own per-IP rate limit, tracked under the `image-upload:` namespace
//!   independently of the general limiter
//! - declared-MIME allow-list and an absolute byte ceiling
//! - dangerous-extension substring scan on the original filename (so
//!   `photo.php.jpg` is still rejected)
//! - raw base64 `image_data` field checks with a fixed character ceiling
//! - sanitization of the auxiliary `folder` and `filename` fields

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::config::UploadConfig;
use crate::http::response::PipelineError;
use crate::media::descriptor::MediaDescriptor;
use crate::observability::metrics;
use crate::security::rate_limit::{RateDecision, RateLimiter};
use crate::security::signature;

const ALLOWED_IMAGE_SUBTYPES: &[&str] = &["jpeg", "png", "gif", "webp"];

/// Extensions rejected anywhere in the original filename, case-insensitive.
const DANGEROUS_EXTENSIONS: &[&str] = &[
    ".php", ".exe", ".bat", ".cmd", ".com", ".pif", ".scr", ".vbs", ".js",
];

static BASE64_IMAGE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/(?:jpeg|jpg|png|webp);base64,").unwrap());

/// One reason the gate turned an upload away.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadViolation {
    #[error("The image must be of type: {allowed} (got {got})")]
    MimeNotAllowed { allowed: String, got: String },

    #[error("The image may not be greater than {max} bytes (got {size})")]
    TooLarge { size: u64, max: u64 },

    #[error("The filename contains a forbidden extension")]
    DangerousFilename,

    #[error("image_data must be a base64-encoded image (data:image/...;base64,)")]
    MalformedImageData,

    #[error("image_data may not be longer than {max} characters (got {chars})")]
    ImageDataTooLarge { chars: usize, max: usize },
}

/// Upload-specific checks, configured once at startup.
pub struct UploadGuard {
    config: UploadConfig,
}

impl UploadGuard {
    pub fn new(config: UploadConfig) -> Self {
        Self { config }
    }

    /// Check an uploaded image file: MIME, absolute size, filename.
    pub fn check_file(&self, file: &MediaDescriptor) -> Result<(), UploadViolation> {
        if !ALLOWED_IMAGE_SUBTYPES.contains(&file.subtype().as_str()) {
            return Err(UploadViolation::MimeNotAllowed {
                allowed: ALLOWED_IMAGE_SUBTYPES.join(", "),
                got: file.mime.clone(),
            });
        }
        if file.size > self.config.max_upload_bytes {
            return Err(UploadViolation::TooLarge {
                size: file.size,
                max: self.config.max_upload_bytes,
            });
        }
        if let Some(name) = &file.filename {
            check_filename(name)?;
        }
        Ok(())
    }

    /// Check a raw base64 `image_data` field: prefix, then a character
    /// ceiling that bounds the decoded size without decoding.
    pub fn check_image_data(&self, data: &str) -> Result<(), UploadViolation> {
        if !BASE64_IMAGE_PREFIX.is_match(data) {
            return Err(UploadViolation::MalformedImageData);
        }
        if data.len() > self.config.max_base64_chars {
            return Err(UploadViolation::ImageDataTooLarge {
                chars: data.len(),
                max: self.config.max_base64_chars,
            });
        }
        Ok(())
    }

    /// Sanitize the destination folder: keep `[a-zA-Z0-9/_-]`, drop `../`
    /// and `..\` sequences, trim slashes, fall back to the default when
    /// nothing survives.
    pub fn sanitize_folder(&self, raw: &str) -> String {
        let dropped = raw.replace("../", "").replace("..\\", "");
        let kept: String = dropped
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '_' | '-'))
            .collect();
        let trimmed = kept.trim_matches('/');
        if trimmed.is_empty() {
            self.config.default_folder.clone()
        } else {
            trimmed.to_string()
        }
    }
}

/// Check a client filename for dangerous extension substrings.
pub fn check_filename(name: &str) -> Result<(), UploadViolation> {
    let lowered = name.to_ascii_lowercase();
    if DANGEROUS_EXTENSIONS.iter().any(|ext| lowered.contains(ext)) {
        return Err(UploadViolation::DangerousFilename);
    }
    Ok(())
}

/// Sanitize a client-supplied target filename: keep `[a-zA-Z0-9_.-]` only.
/// Returns `None` when sanitization empties the name; the field is then
/// dropped rather than passed downstream as an empty string.
pub fn sanitize_filename(raw: &str) -> Option<String> {
    let kept: String = raw
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept)
    }
}

/// State for the upload rate-limit middleware.
pub struct UploadLimiterState {
    pub limiter: RateLimiter,
    pub policy: UploadConfig,
}

/// Middleware enforcing the upload budget per IP, under its own namespace.
pub async fn upload_rate_limit_middleware(
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<UploadLimiterState>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let key = format!("image-upload:{}", addr.ip());
    let decision = state.limiter.check_and_increment(
        &key,
        state.policy.max_uploads,
        Duration::from_secs(state.policy.window_secs),
    );

    match decision {
        RateDecision::Allowed { .. } => next.run(request).await,
        RateDecision::Limited { retry_after, count } => {
            tracing::warn!(
                signature = %key,
                ip = %addr.ip(),
                user_agent = signature::user_agent(&request),
                path = request.uri().path(),
                count,
                max_uploads = state.policy.max_uploads,
                "Upload rate limit exceeded"
            );
            metrics::record_rejection("upload_rate_limit");
            PipelineError::RateLimited { retry_after }.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> UploadGuard {
        UploadGuard::new(UploadConfig::default())
    }

    #[test]
    fn test_mime_allow_list() {
        let bad = MediaDescriptor::image("image/svg+xml", 10, None);
        assert!(matches!(
            guard().check_file(&bad),
            Err(UploadViolation::MimeNotAllowed { .. })
        ));
        let good = MediaDescriptor::image("image/webp", 10, Some("a.webp".into()));
        assert!(guard().check_file(&good).is_ok());
    }

    #[test]
    fn test_size_ceiling() {
        let big = MediaDescriptor::image("image/png", 11 * 1024 * 1024, None);
        assert!(matches!(
            guard().check_file(&big),
            Err(UploadViolation::TooLarge { .. })
        ));
    }

    #[test]
    fn test_dangerous_extension_anywhere_in_name() {
        assert!(check_filename("photo.php.jpg").is_err());
        assert!(check_filename("UPLOAD.EXE").is_err());
        assert!(check_filename("script.vbs").is_err());
        assert!(check_filename("photo.jpg").is_ok());
        // Substring check is intentionally conservative.
        assert!(check_filename("my.jsx-notes.png").is_err());
    }

    #[test]
    fn test_image_data_prefix_and_ceiling() {
        let guard = guard();
        assert!(matches!(
            guard.check_image_data("data:text/plain;base64,QQ=="),
            Err(UploadViolation::MalformedImageData)
        ));
        assert!(guard
            .check_image_data("data:image/jpeg;base64,QUJD")
            .is_ok());

        let mut small = UploadConfig::default();
        small.max_base64_chars = 30;
        let guard = UploadGuard::new(small);
        let data = format!("data:image/png;base64,{}", "A".repeat(40));
        assert!(matches!(
            guard.check_image_data(&data),
            Err(UploadViolation::ImageDataTooLarge { .. })
        ));
    }

    #[test]
    fn test_folder_sanitization() {
        let guard = guard();
        assert_eq!(guard.sanitize_folder("listings/2024"), "listings/2024");
        assert_eq!(guard.sanitize_folder("../../etc"), "etc");
        assert_eq!(guard.sanitize_folder("/gallery/"), "gallery");
        assert_eq!(guard.sanitize_folder("a b!c"), "abc");
        assert_eq!(guard.sanitize_folder("!!!"), "uploads");
        assert_eq!(guard.sanitize_folder(""), "uploads");
    }

    #[test]
    fn test_filename_sanitization() {
        assert_eq!(sanitize_filename("my photo (1).jpg"), Some("myphoto1.jpg".into()));
        assert_eq!(sanitize_filename("façade.png"), Some("faade.png".into()));
        assert_eq!(sanitize_filename("§±!@"), None);
    }
}
