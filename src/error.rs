/// Unified error types for the landing page service
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for the service
#[derive(Error, Debug)]
pub enum LandingError {
    /// Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Client input errors (missing image, non-object body, ...)
    #[error("{0}")]
    Validation(String),

    /// Identifier that the document store cannot parse
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    /// The store did not acknowledge a write
    #[error("{0}")]
    NotAcknowledged(String),

    /// Request body exceeded the upload cap
    #[error("{0}")]
    PayloadTooLarge(String),

    /// Blob adapter failed to store an upload
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    /// Record could not be persisted after its blob was stored
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    /// Blob storage errors
    #[error("Blob storage error: {0}")]
    BlobStorage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server errors
    #[error("Internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl LandingError {
    /// Status code and error code for this error
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            LandingError::Validation(_) => (StatusCode::BAD_REQUEST, "InvalidRequest"),
            LandingError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, "InvalidIdentifier"),
            LandingError::NotAcknowledged(_) => (StatusCode::BAD_REQUEST, "NotAcknowledged"),
            LandingError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, "PayloadTooLarge"),
            LandingError::UploadFailed(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UploadFailed"),
            LandingError::PersistenceFailed(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "PersistenceFailed")
            }
            _ => (StatusCode::INTERNAL_SERVER_ERROR, "InternalServerError"),
        }
    }
}

/// Convert LandingError to HTTP response
impl IntoResponse for LandingError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.status();

        // Don't leak details; the full error is logged below
        let message = match &self {
            LandingError::Database(_) | LandingError::Internal(_) | LandingError::Io(_) => {
                "Internal Server Error".to_string()
            }
            LandingError::UploadFailed(_) => "Image upload failed".to_string(),
            LandingError::PersistenceFailed(_) => "Failed to save record".to_string(),
            _ => self.to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, "request rejected");
        }

        let body = Json(ErrorResponse {
            error: error_code.to_string(),
            message,
        });

        (status, body).into_response()
    }
}

/// Result type alias for service operations
pub type LandingResult<T> = Result<T, LandingError>;
