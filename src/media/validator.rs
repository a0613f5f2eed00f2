//! Media submission validation.
//!
//! # Responsibilities
//! - Validate the main image, gallery images, base64 images, and videos of a
//!   property submission against the configured policies
//! - Accumulate every problem into one field-error map, never fail-fast
//!
//! # Design Decisions
//! - Per-item checks return `Result<(), MediaError>`; the error map is a fold
//!   over those results, so no per-file failure can escape the validator.
//! - Base64 payloads are decoded once to settle validity and decoded size;
//!   pixel data is never inspected.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::config::MediaConfig;
use crate::media::descriptor::MediaDescriptor;

/// Field path → human-readable messages, ordered for stable responses.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

const IMAGE_SUBTYPES: &[&str] = &["jpeg", "png", "gif", "webp"];
const VIDEO_SUBTYPES: &[&str] = &["mp4", "avi", "quicktime", "x-msvideo", "webm"];

static BASE64_IMAGE_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^data:image/(?:jpeg|jpg|png|webp);base64,").unwrap());

/// A single validation failure for one artifact.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("The file must be of type: {allowed} (got {got})")]
    MimeNotAllowed { allowed: String, got: String },

    #[error("The file may not be greater than {max} bytes (got {size})")]
    TooLarge { size: u64, max: u64 },

    #[error("The field must be a base64-encoded image (data:image/...;base64,)")]
    MalformedBase64Image,

    #[error("The decoded image may not be greater than {max} bytes (got {size})")]
    DecodedTooLarge { size: u64, max: u64 },

    #[error("The file could not be processed")]
    Unreadable,
}

/// Validates media submissions against the configured ceilings.
pub struct MediaValidator {
    config: MediaConfig,
}

impl MediaValidator {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Validate a full property submission. All problems are reported
    /// together, keyed by field path (`images.3`, `videos.0`, `total_images`).
    pub fn validate_submission(
        &self,
        main_image: Option<&MediaDescriptor>,
        gallery: &[MediaDescriptor],
        base64_images: &[String],
        videos: &[MediaDescriptor],
    ) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Some(main) = main_image {
            record(&mut errors, "main_image", self.check_image(main));
        }

        if gallery.len() as u64 > self.config.max_gallery_images {
            push(
                &mut errors,
                "images",
                format!(
                    "Too many gallery images: {} uploaded, {} allowed",
                    gallery.len(),
                    self.config.max_gallery_images
                ),
            );
        }
        for (idx, image) in gallery.iter().enumerate() {
            record(&mut errors, &format!("images.{}", idx), self.check_image(image));
        }

        if base64_images.len() as u64 > self.config.max_base64_images {
            push(
                &mut errors,
                "base64_images",
                format!(
                    "Too many base64 images: {} uploaded, {} allowed",
                    base64_images.len(),
                    self.config.max_base64_images
                ),
            );
        }
        for (idx, data) in base64_images.iter().enumerate() {
            record(
                &mut errors,
                &format!("base64_images.{}", idx),
                self.check_base64_image(data),
            );
        }

        if videos.len() as u64 > self.config.max_videos {
            push(
                &mut errors,
                "videos",
                format!(
                    "Too many videos: {} uploaded, {} allowed",
                    videos.len(),
                    self.config.max_videos
                ),
            );
        }
        for (idx, video) in videos.iter().enumerate() {
            record(&mut errors, &format!("videos.{}", idx), self.check_video(video));
        }

        let total_images = main_image.map(|_| 1).unwrap_or(0) + gallery.len() + base64_images.len();
        if total_images as u64 > self.config.max_images {
            push(
                &mut errors,
                "total_images",
                format!(
                    "Too many images: {} uploaded, {} allowed",
                    total_images, self.config.max_images
                ),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate one image file: MIME allow-list and size ceiling.
    pub fn check_image(&self, image: &MediaDescriptor) -> Result<(), MediaError> {
        if !IMAGE_SUBTYPES.contains(&image.subtype().as_str()) {
            return Err(MediaError::MimeNotAllowed {
                allowed: IMAGE_SUBTYPES.join(", "),
                got: image.mime.clone(),
            });
        }
        if image.size > self.config.max_image_bytes {
            return Err(MediaError::TooLarge {
                size: image.size,
                max: self.config.max_image_bytes,
            });
        }
        Ok(())
    }

    /// Validate one base64 data URI: literal prefix, payload validity, then
    /// the decoded size against the configured ceiling.
    pub fn check_base64_image(&self, data: &str) -> Result<(), MediaError> {
        let matched = BASE64_IMAGE_PREFIX
            .find(data)
            .ok_or(MediaError::MalformedBase64Image)?;
        let payload = data[matched.end()..].trim_end();
        if payload.is_empty() {
            return Err(MediaError::MalformedBase64Image);
        }

        // Decoding settles validity and size in one pass; the pixels are
        // never inspected.
        let decoded = STANDARD
            .decode(payload)
            .map_err(|_| MediaError::MalformedBase64Image)?;
        let size = decoded.len() as u64;
        if size > self.config.max_base64_image_bytes {
            return Err(MediaError::DecodedTooLarge {
                size,
                max: self.config.max_base64_image_bytes,
            });
        }
        Ok(())
    }

    /// Validate one video file: MIME allow-list and size ceiling.
    pub fn check_video(&self, video: &MediaDescriptor) -> Result<(), MediaError> {
        if !VIDEO_SUBTYPES.contains(&video.subtype().as_str()) {
            return Err(MediaError::MimeNotAllowed {
                allowed: VIDEO_SUBTYPES.join(", "),
                got: video.mime.clone(),
            });
        }
        if video.size > self.config.max_video_bytes {
            return Err(MediaError::TooLarge {
                size: video.size,
                max: self.config.max_video_bytes,
            });
        }
        Ok(())
    }
}

fn record(errors: &mut FieldErrors, field: &str, result: Result<(), MediaError>) {
    if let Err(err) = result {
        push(errors, field, err.to_string());
    }
}

fn push(errors: &mut FieldErrors, field: &str, message: String) {
    errors.entry(field.to_string()).or_default().push(message);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator() -> MediaValidator {
        MediaValidator::new(MediaConfig::default())
    }

    fn jpeg(size: u64) -> MediaDescriptor {
        MediaDescriptor::image("image/jpeg", size, Some("photo.jpg".into()))
    }

    fn b64_png(bytes: usize) -> String {
        let raw = vec![0u8; bytes];
        format!("data:image/png;base64,{}", STANDARD.encode(raw))
    }

    #[test]
    fn test_valid_submission_passes() {
        let gallery = vec![jpeg(1024); 3];
        let videos = vec![MediaDescriptor::video("video/mp4", 1024, None)];
        let base64 = vec![b64_png(100)];
        assert!(validator()
            .validate_submission(Some(&jpeg(2048)), &gallery, &base64, &videos)
            .is_ok());
    }

    #[test]
    fn test_bad_mime_and_size_are_keyed_by_index() {
        let gallery = vec![
            jpeg(1024),
            MediaDescriptor::image("image/tiff", 1024, None),
            jpeg(100 * 1024 * 1024),
        ];
        let errors = validator()
            .validate_submission(None, &gallery, &[], &[])
            .unwrap_err();
        assert!(!errors.contains_key("images.0"));
        assert!(errors["images.1"][0].contains("must be of type"));
        assert!(errors["images.2"][0].contains("not be greater than"));
    }

    #[test]
    fn test_bad_base64_prefix_reports_exactly_one_error() {
        let base64 = vec![
            b64_png(10),
            "data:image/svg+xml;base64,PHN2Zz4=".to_string(),
            "not a data uri".to_string(),
        ];
        let errors = validator()
            .validate_submission(None, &[], &base64, &[])
            .unwrap_err();
        assert!(!errors.contains_key("base64_images.0"));
        assert_eq!(errors["base64_images.1"].len(), 1);
        assert_eq!(errors["base64_images.2"].len(), 1);
    }

    #[test]
    fn test_truncated_base64_payload_is_malformed() {
        // Shorter than one base64 quantum; must never reach the size check.
        for data in [
            "data:image/png;base64,=",
            "data:image/png;base64,==",
            "data:image/jpeg;base64,A",
        ] {
            assert!(matches!(
                validator().check_base64_image(data),
                Err(MediaError::MalformedBase64Image)
            ));
        }
    }

    #[test]
    fn test_oversized_decoded_base64_rejected() {
        let mut config = MediaConfig::default();
        config.max_base64_image_bytes = 64;
        let validator = MediaValidator::new(config);
        assert!(matches!(
            validator.check_base64_image(&b64_png(65)),
            Err(MediaError::DecodedTooLarge { size: 65, max: 64 })
        ));
        assert!(validator.check_base64_image(&b64_png(64)).is_ok());
    }

    #[test]
    fn test_total_images_error_names_both_counts() {
        let gallery = vec![jpeg(10); 21];
        let errors = validator()
            .validate_submission(None, &gallery, &[], &[])
            .unwrap_err();
        let message = &errors["total_images"][0];
        assert!(message.contains("21"));
        assert!(message.contains("20"));
    }

    #[test]
    fn test_video_count_error_names_actual_vs_allowed() {
        let videos = vec![
            MediaDescriptor::video("video/mp4", 10, None),
            MediaDescriptor::video("video/webm", 10, None),
        ];
        let errors = validator()
            .validate_submission(None, &[], &[], &videos)
            .unwrap_err();
        let message = &errors["videos"][0];
        assert!(message.contains("2 uploaded"));
        assert!(message.contains("1 allowed"));
    }

    #[test]
    fn test_video_mime_allow_list() {
        let bad = MediaDescriptor::video("video/x-matroska", 10, None);
        assert!(matches!(
            validator().check_video(&bad),
            Err(MediaError::MimeNotAllowed { .. })
        ));
        let good = MediaDescriptor::video("video/quicktime", 10, None);
        assert!(validator().check_video(&good).is_ok());
    }
}
