//! Application error types and HTTP error mapping.
//!
//! Only request-level failures live here. Remote service failures are a
//! separate [`crate::cloud::CloudError`] caught inside each component; they
//! degrade the response instead of failing the request.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Error model for request parsing, upload validation, and unexpected faults.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    InvalidUpload(String),
    #[error("{0}")]
    BadMultipart(String),
    #[error("{0}")]
    PayloadTooLarge(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Creates a `400` error for a missing or unacceptable audio upload.
    pub fn invalid_upload(message: impl Into<String>) -> Self {
        Self::InvalidUpload(message.into())
    }

    /// Creates a multipart parsing/shape validation error.
    pub fn bad_multipart(message: impl Into<String>) -> Self {
        Self::BadMultipart(message.into())
    }

    /// Creates a `413` error for uploads over the configured size limit.
    pub fn payload_too_large(message: impl Into<String>) -> Self {
        Self::PayloadTooLarge(message.into())
    }

    /// Creates a generic internal server error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

#[derive(Debug, Serialize)]
struct ErrorPayload {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidUpload(_) | AppError::BadMultipart(_) => StatusCode::BAD_REQUEST,
            AppError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = ErrorPayload {
            success: false,
            error: self.to_string(),
        };

        (status, Json(payload)).into_response()
    }
}
