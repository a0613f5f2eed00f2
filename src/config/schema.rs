//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the listing gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limits).
    pub listener: ListenerConfig,

    /// General API rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Upload-endpoint gate settings (its own rate limit, ceilings).
    pub upload: UploadConfig,

    /// Media validation policies (images, base64 images, videos).
    pub media: MediaConfig,

    /// Content sanitizer path allow-list.
    pub sanitizer: SanitizerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum bytes buffered for a JSON body during sanitization.
    pub max_json_body_bytes: usize,

    /// Maximum bytes accepted for a multipart request body.
    pub max_multipart_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_json_body_bytes: 2 * 1024 * 1024,
            // Must hold a full video upload plus form fields.
            max_multipart_body_bytes: 600 * 1024 * 1024,
        }
    }
}

/// General API rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Maximum requests per window for general API traffic.
    pub max_requests: u64,

    /// Window length in seconds. The window is fixed: the TTL is set at the
    /// first increment and never refreshed by later hits.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_requests: 60,
            window_secs: 60,
        }
    }
}

/// Upload gate configuration. Runs before media validation on the raw
/// multipart upload endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Maximum uploads per window, tracked per IP under its own namespace.
    pub max_uploads: u64,

    /// Upload rate-limit window in seconds.
    pub window_secs: u64,

    /// Absolute ceiling for an uploaded image file, in bytes.
    pub max_upload_bytes: u64,

    /// Ceiling for a raw base64 `image_data` field, in base64 characters
    /// (~10MB decoded at the default).
    pub max_base64_chars: usize,

    /// Destination folder substituted when sanitization empties the
    /// client-supplied one.
    pub default_folder: String,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_uploads: 10,
            window_secs: 60,
            max_upload_bytes: 10 * 1024 * 1024,
            max_base64_chars: 14_000_000,
            default_folder: "uploads".to_string(),
        }
    }
}

/// Media validation configuration.
///
/// The ceilings here are the single source of truth for every endpoint; the
/// create and update paths share them rather than carrying their own values.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MediaConfig {
    /// Total images allowed per property (main + gallery + base64).
    pub max_images: u64,

    /// Per-image byte ceiling.
    pub max_image_bytes: u64,

    /// Gallery entries allowed per submission.
    pub max_gallery_images: u64,

    /// Base64-encoded images allowed per submission.
    pub max_base64_images: u64,

    /// Decoded byte ceiling for one base64 image.
    pub max_base64_image_bytes: u64,

    /// Videos allowed per property.
    pub max_videos: u64,

    /// Per-video byte ceiling.
    pub max_video_bytes: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            max_images: 20,
            max_image_bytes: 10 * 1024 * 1024,
            max_gallery_images: 20,
            max_base64_images: 20,
            max_base64_image_bytes: 10 * 1024 * 1024,
            max_videos: 1,
            max_video_bytes: 500 * 1024 * 1024,
        }
    }
}

/// Content sanitizer allow-list configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SanitizerConfig {
    /// Exact paths that bypass sanitization and inspection.
    pub exempt_paths: Vec<String>,

    /// Path prefixes that bypass sanitization and inspection.
    pub exempt_prefixes: Vec<String>,
}

impl Default for SanitizerConfig {
    fn default() -> Self {
        Self {
            exempt_paths: vec!["/api/home-stats".to_string()],
            // Property payloads carry rich-text descriptions and structured
            // filters that collide with the attack signatures.
            exempt_prefixes: vec![
                "/api/properties".to_string(),
                "/api/cities/state".to_string(),
            ],
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total request timeout in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus exposition endpoint.
    pub metrics_enabled: bool,

    /// Address for the metrics endpoint.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
