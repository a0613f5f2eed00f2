//! Pipeline error responses.
//!
//! # Responsibilities
//! - Map every pipeline rejection to its HTTP status and JSON body
//! - Keep client-facing messages generic; detail lives in the logs
//!
//! # Design Decisions
//! - 422 means "fix your input" (validation failures, upload rejections);
//!   500 means "try again later" (unexpected crash during validation).
//! - Suspicious-input rejections never reveal which pattern matched.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::media::FieldErrors;

/// Everything a pipeline stage can reject a request with.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Client exceeded its bucket; recoverable after `retry_after` seconds.
    #[error("Too many requests")]
    RateLimited { retry_after: u64 },

    /// Input matched an attack signature. Deliberately generic to clients.
    #[error("Invalid request")]
    SuspiciousInput,

    /// Structured media validation failures, recoverable by the client.
    #[error("The given data was invalid")]
    MediaValidationFailed(FieldErrors),

    /// Unexpected failure during validation, distinct from ordinary 422s.
    #[error("Media processing failed, please try again later")]
    MediaValidationCrashed,

    /// Upload Guard rejection (bad MIME, dangerous filename, oversized data).
    #[error("Upload rejected")]
    UploadRejected(FieldErrors),
}

/// JSON error body shared by every stage.
#[derive(Debug, Serialize)]
struct ErrorBody {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<FieldErrors>,
}

impl PipelineError {
    fn status(&self) -> StatusCode {
        match self {
            PipelineError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            PipelineError::SuspiciousInput => StatusCode::BAD_REQUEST,
            PipelineError::MediaValidationFailed(_) | PipelineError::UploadRejected(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            PipelineError::MediaValidationCrashed => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.to_string();
        let (retry_after, errors) = match self {
            PipelineError::RateLimited { retry_after } => (Some(retry_after), None),
            PipelineError::MediaValidationFailed(errors)
            | PipelineError::UploadRejected(errors) => (None, Some(errors)),
            _ => (None, None),
        };
        (
            status,
            Json(ErrorBody {
                message,
                retry_after,
                errors,
            }),
        )
            .into_response()
    }
}
