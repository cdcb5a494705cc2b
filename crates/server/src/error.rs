//! API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

/// API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("metadata error: {0}")]
    Metadata(#[from] lantern_metadata::MetadataError),

    #[error("content error: {0}")]
    Content(#[from] lantern_content::ContentError),

    #[error("core error: {0}")]
    Core(#[from] lantern_core::Error),
}

impl ApiError {
    /// Get the error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Forbidden(_) => "forbidden",
            Self::Internal(_) => "internal_error",
            Self::Metadata(e) => match e {
                lantern_metadata::MetadataError::NotFound(_) => "not_found",
                lantern_metadata::MetadataError::AlreadyExists(_)
                | lantern_metadata::MetadataError::Constraint(_) => "bad_request",
                _ => "metadata_error",
            },
            Self::Content(_) => "content_error",
            Self::Core(_) => "bad_request",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Metadata(e) => match e {
                lantern_metadata::MetadataError::NotFound(_) => StatusCode::NOT_FOUND,
                // Duplicate codes and constraint violations are user errors,
                // reported as 400 rather than 409 or 500.
                lantern_metadata::MetadataError::AlreadyExists(_)
                | lantern_metadata::MetadataError::Constraint(_) => StatusCode::BAD_REQUEST,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Content(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Core(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            // Internal detail is logged here and never echoed to clients.
            tracing::error!(error = %self, "request failed");
            let body = ErrorResponse {
                code: self.code().to_string(),
                message: "internal server error".to_string(),
            };
            return (status, Json(body)).into_response();
        }

        let body = ErrorResponse {
            code: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = std::result::Result<T, ApiError>;
