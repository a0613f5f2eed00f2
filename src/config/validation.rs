//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (windows > 0, ceilings > 0)
//! - Catch policies that would lock every client out
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} must be greater than zero")]
    ZeroValue { field: &'static str },

    #[error("media.max_images ({max_images}) is smaller than media.max_gallery_images ({max_gallery})")]
    GalleryExceedsTotal { max_images: u64, max_gallery: u64 },

    #[error("listener.bind_address is empty")]
    EmptyBindAddress,
}

/// Validate the full configuration, accumulating every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    }

    let nonzero: &[(&'static str, u64)] = &[
        ("rate_limit.max_requests", config.rate_limit.max_requests),
        ("rate_limit.window_secs", config.rate_limit.window_secs),
        ("upload.max_uploads", config.upload.max_uploads),
        ("upload.window_secs", config.upload.window_secs),
        ("upload.max_upload_bytes", config.upload.max_upload_bytes),
        ("upload.max_base64_chars", config.upload.max_base64_chars as u64),
        ("media.max_images", config.media.max_images),
        ("media.max_image_bytes", config.media.max_image_bytes),
        ("media.max_videos", config.media.max_videos),
        ("media.max_video_bytes", config.media.max_video_bytes),
        ("timeouts.request_secs", config.timeouts.request_secs),
    ];
    for (field, value) in nonzero {
        if *value == 0 {
            errors.push(ValidationError::ZeroValue { field });
        }
    }

    if config.media.max_gallery_images > config.media.max_images {
        errors.push(ValidationError::GalleryExceedsTotal {
            max_images: config.media.max_images,
            max_gallery: config.media.max_gallery_images,
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
