//! Request handlers for the ingestion endpoints.
//!
//! # Responsibilities
//! - Parse multipart property submissions into fields + media descriptors
//! - Run Upload Guard and Media Validator checks in pipeline order
//! - Normalize field names and answer with the canonical submission
//!
//! # Design Decisions
//! - Handlers decide whether a request is allowed through and in what
//!   normalized shape; persistence and storage are downstream collaborators.
//! - Per-file read failures become field errors; only a broken multipart
//!   stream is a 500.

use axum::{
    extract::{Multipart, State},
    response::IntoResponse,
    Json,
};
use serde_json::{json, Map, Value};

use crate::http::response::PipelineError;
use crate::http::server::AppState;
use crate::media::{FieldErrors, MediaDescriptor, MediaError};
use crate::normalize;
use crate::observability::metrics;
use crate::security::upload_guard::{self, UploadViolation};

/// A property submission pulled apart into fields and media.
#[derive(Default)]
struct RawSubmission {
    fields: Map<String, Value>,
    main_image: Option<MediaDescriptor>,
    gallery: Vec<MediaDescriptor>,
    base64_images: Vec<String>,
    videos: Vec<MediaDescriptor>,
    read_errors: FieldErrors,
}

/// Strip a trailing `[...]` index from a multipart field name.
fn base_name(name: &str) -> &str {
    match name.find('[') {
        Some(pos) if name.ends_with(']') => &name[..pos],
        _ => name,
    }
}

async fn read_submission(mut multipart: Multipart) -> Result<RawSubmission, PipelineError> {
    let mut submission = RawSubmission::default();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                tracing::error!(error = %err, "Multipart stream failed during property ingestion");
                return Err(PipelineError::MediaValidationCrashed);
            }
        };

        let name = field.name().unwrap_or("").to_string();
        let base = base_name(&name).to_string();
        let mime = field.content_type().map(str::to_string);
        let filename = field.file_name().map(str::to_string);

        // File parts carry a content type; everything else is a text field.
        match mime {
            Some(mime) => {
                let size = match field.bytes().await {
                    Ok(bytes) => bytes.len() as u64,
                    Err(err) => {
                        // A single unreadable file must not sink the request.
                        tracing::warn!(field = %name, error = %err, "Failed to read uploaded file");
                        let key = error_key(&base, &submission);
                        submission
                            .read_errors
                            .entry(key)
                            .or_default()
                            .push(MediaError::Unreadable.to_string());
                        continue;
                    }
                };
                match base.as_str() {
                    "mainImage" | "main_image" => {
                        if submission.main_image.is_none() {
                            submission.main_image =
                                Some(MediaDescriptor::image(mime, size, filename));
                        }
                    }
                    "videos" => submission
                        .videos
                        .push(MediaDescriptor::video(mime, size, filename)),
                    _ => submission
                        .gallery
                        .push(MediaDescriptor::image(mime, size, filename)),
                }
            }
            None => {
                let text = match field.text().await {
                    Ok(text) => text,
                    Err(err) => {
                        tracing::warn!(field = %name, error = %err, "Failed to read form field");
                        continue;
                    }
                };
                if base == "base64_images" {
                    submission.base64_images.push(text);
                } else {
                    submission.fields.insert(name, Value::String(text));
                }
            }
        }
    }

    Ok(submission)
}

fn error_key(base: &str, submission: &RawSubmission) -> String {
    match base {
        "mainImage" | "main_image" => "main_image".to_string(),
        "videos" => format!("videos.{}", submission.videos.len()),
        _ => format!("images.{}", submission.gallery.len()),
    }
}

async fn ingest_property(state: AppState, multipart: Multipart) -> impl IntoResponse {
    let submission = match read_submission(multipart).await {
        Ok(submission) => submission,
        Err(err) => return err.into_response(),
    };

    let mut errors = submission.read_errors.clone();
    if let Err(media_errors) = state.media_validator.validate_submission(
        submission.main_image.as_ref(),
        &submission.gallery,
        &submission.base64_images,
        &submission.videos,
    ) {
        for (field, messages) in media_errors {
            errors.entry(field).or_default().extend(messages);
        }
    }
    if !errors.is_empty() {
        tracing::info!(errors = ?errors, "Property submission failed media validation");
        metrics::record_rejection("media_validation");
        return PipelineError::MediaValidationFailed(errors).into_response();
    }

    let canonical = normalize::normalize(submission.fields);
    Json(json!({
        "message": "Property accepted for review",
        "property": canonical,
    }))
    .into_response()
}

/// POST /api/properties — create a property submission.
pub async fn create_property(State(state): State<AppState>, multipart: Multipart) -> impl IntoResponse {
    ingest_property(state, multipart).await
}

/// PUT /api/properties/{id} — update a property submission. Shares the
/// create path's ceilings; historical per-endpoint drift is gone.
pub async fn update_property(State(state): State<AppState>, multipart: Multipart) -> impl IntoResponse {
    ingest_property(state, multipart).await
}

/// POST /api/uploads/images — single-image upload endpoint.
///
/// Guard checks run first as the early cheap filter, then the shared media
/// validation. The response names the sanitized destination.
pub async fn upload_image(State(state): State<AppState>, mut multipart: Multipart) -> impl IntoResponse {
    let mut image: Option<MediaDescriptor> = None;
    let mut image_data: Option<String> = None;
    let mut folder: Option<String> = None;
    let mut filename: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                tracing::error!(error = %err, "Multipart stream failed during image upload");
                return PipelineError::MediaValidationCrashed.into_response();
            }
        };

        let name = field.name().unwrap_or("").to_string();
        let mime = field.content_type().map(str::to_string);
        let part_filename = field.file_name().map(str::to_string);

        match name.as_str() {
            "image" => {
                let size = match field.bytes().await {
                    Ok(bytes) => bytes.len() as u64,
                    Err(err) => {
                        tracing::warn!(error = %err, "Failed to read uploaded image");
                        return PipelineError::MediaValidationCrashed.into_response();
                    }
                };
                let mime = mime.unwrap_or_else(|| "application/octet-stream".to_string());
                image = Some(MediaDescriptor::image(mime, size, part_filename));
            }
            "image_data" => image_data = field.text().await.ok(),
            "folder" => folder = field.text().await.ok(),
            "filename" => filename = field.text().await.ok(),
            _ => {}
        }
    }

    let mut violations = FieldErrors::new();
    if let Some(image) = &image {
        if let Err(violation) = state.upload_guard.check_file(image) {
            push_violation(&mut violations, "image", violation);
        }
    }
    if let Some(data) = &image_data {
        if let Err(violation) = state.upload_guard.check_image_data(data) {
            push_violation(&mut violations, "image_data", violation);
        }
    }
    if image.is_none() && image_data.is_none() {
        violations
            .entry("image".to_string())
            .or_default()
            .push("An image file or image_data field is required".to_string());
    }
    if !violations.is_empty() {
        metrics::record_rejection("upload_guard");
        return PipelineError::UploadRejected(violations).into_response();
    }

    // Guard passed; the shared media policy still applies.
    if let Some(image) = &image {
        if let Err(err) = state.media_validator.check_image(image) {
            let mut errors = FieldErrors::new();
            errors.entry("image".to_string()).or_default().push(err.to_string());
            tracing::info!(errors = ?errors, "Upload failed media validation");
            metrics::record_rejection("media_validation");
            return PipelineError::MediaValidationFailed(errors).into_response();
        }
    }

    let folder = state
        .upload_guard
        .sanitize_folder(folder.as_deref().unwrap_or(""));
    let filename = filename.as_deref().and_then(upload_guard::sanitize_filename);

    let mut body = json!({
        "message": "Upload accepted",
        "folder": folder,
    });
    if let Some(filename) = filename {
        body["filename"] = Value::String(filename);
    }
    Json(body).into_response()
}

fn push_violation(errors: &mut FieldErrors, field: &str, violation: UploadViolation) {
    errors
        .entry(field.to_string())
        .or_default()
        .push(violation.to_string());
}

/// POST /api/inquiries — contact inquiry for a listing. The sanitizer has
/// already cleaned and inspected this payload; downstream delivery is
/// external.
pub async fn create_inquiry(Json(inquiry): Json<Value>) -> impl IntoResponse {
    Json(json!({
        "message": "Inquiry received",
        "inquiry": inquiry,
    }))
}

/// GET /api/home-stats — landing-page aggregates, allow-listed because the
/// admin-entered labels collide with the attack signatures. Numbers come
/// from the persistence layer in the full product.
pub async fn home_stats() -> impl IntoResponse {
    Json(json!({
        "featured_properties": Value::Null,
        "cities": Value::Null,
        "status": "ok",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name_strips_index_suffix() {
        assert_eq!(base_name("images[0]"), "images");
        assert_eq!(base_name("images[]"), "images");
        assert_eq!(base_name("features[12]"), "features");
        assert_eq!(base_name("image"), "image");
        assert_eq!(base_name("odd[0]name"), "odd[0]name");
    }
}
