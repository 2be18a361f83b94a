use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::analysis::sanitize::ParseError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to upload file: {0}")]
    UploadFailed(String),

    #[error("PDF conversion error: {0}")]
    ConversionFailed(String),

    #[error("Failed to analyze resume: {0}")]
    AiInvocationFailed(String),

    #[error("AI response format error: {0}")]
    FeedbackParse(#[from] ParseError),

    #[error("Failed to save analysis: {0}")]
    PersistenceFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Stored record is corrupt: {0}")]
    CorruptRecord(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::UploadFailed(_) => (StatusCode::BAD_GATEWAY, "UPLOAD_FAILED", self.to_string()),
            AppError::ConversionFailed(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CONVERSION_FAILED",
                self.to_string(),
            ),
            AppError::AiInvocationFailed(_) => {
                (StatusCode::BAD_GATEWAY, "AI_INVOCATION_FAILED", self.to_string())
            }
            AppError::FeedbackParse(e) => {
                // The raw text is kept for diagnostics; it never reaches the client.
                tracing::error!(raw = %e.raw, "AI response failed to parse");
                (
                    StatusCode::BAD_GATEWAY,
                    "FEEDBACK_PARSE_FAILED",
                    "AI response format error. Please try analyzing again.".to_string(),
                )
            }
            AppError::PersistenceFailed(_) => {
                (StatusCode::BAD_GATEWAY, "PERSISTENCE_FAILED", self.to_string())
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::CorruptRecord(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "CORRUPT_RECORD",
                msg.clone(),
            ),
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "STORAGE_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHORIZED",
                "Authentication required".to_string(),
            ),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
