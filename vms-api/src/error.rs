//! HTTP error mapping
//!
//! Every failure leaves the service as
//! `{"status": "error", "error": {"code": ..., "message": ...}}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use vms_common::auth::TokenError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request could not be accepted as sent (400)
    #[error("{0}")]
    BadRequest(String),

    /// Missing or rejected access token (401)
    #[error("{0}")]
    Unauthorized(String),

    /// Error raised by the common library
    #[error(transparent)]
    Common(#[from] vms_common::Error),
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            // Signing failures are on our side, not the caller's
            TokenError::InvalidKey | TokenError::Encoding(_) => {
                ApiError::Common(vms_common::Error::Internal(err.to_string()))
            }
            _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
        }
    }
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str) {
        use vms_common::Error as E;
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            ApiError::Common(err) => match err {
                E::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
                E::InvalidInput(_) => (StatusCode::BAD_REQUEST, "INVALID_INPUT"),
                E::MalformedInput(_) => (StatusCode::BAD_REQUEST, "MALFORMED_INPUT"),
                E::EmptyImport => (StatusCode::BAD_REQUEST, "EMPTY_IMPORT"),
                E::DuplicateCode(_) => (StatusCode::CONFLICT, "DUPLICATE_CODE"),
                E::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
                E::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
                E::Config(_) | E::Io(_) | E::Internal(_) => {
                    (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = self.parts();
        if status.is_server_error() {
            error!(code = error_code, "Request failed: {}", self);
        }

        let body = Json(json!({
            "status": "error",
            "error": {
                "code": error_code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
