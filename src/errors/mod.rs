//! Unified error handling with consistent API response envelope.
//!
//! Structural failures (unknown commit, duplicate build id, invalid status)
//! surface as distinct named variants; they are never collapsed into a
//! generic error. Per-record normalization problems are not errors at all
//! and live in `crate::normalize`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Error detail in the API response envelope.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
}

/// Consistent JSON envelope for all API responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: Option<T>,
    pub error: Option<ApiError>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Wrap a successful result in the envelope.
    pub fn success(data: T) -> Json<Self> {
        Json(Self {
            data: Some(data),
            error: None,
        })
    }
}

/// Application error type mapping to HTTP status codes.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Commit not found: {0}")]
    CommitNotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Duplicate build id: {0}")]
    DuplicateBuildId(String),

    #[error("Invalid status: {0}")]
    InvalidStatus(String),

    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl AppError {
    /// Check if this error represents a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::CommitNotFound(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::CommitNotFound(msg) => {
                (StatusCode::NOT_FOUND, "COMMIT_NOT_FOUND", msg.clone())
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            AppError::DuplicateBuildId(msg) => {
                (StatusCode::CONFLICT, "DUPLICATE_BUILD_ID", msg.clone())
            }
            AppError::InvalidStatus(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_STATUS", msg.clone())
            }
            AppError::InvalidTransition(msg) => {
                (StatusCode::CONFLICT, "INVALID_TRANSITION", msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()> {
            data: None,
            error: Some(ApiError {
                code: code.to_string(),
                message,
            }),
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_response_success() {
        let response = ApiResponse::success("hello");
        let json = serde_json::to_value(&response.0).unwrap();
        assert_eq!(json["data"], "hello");
        assert!(json["error"].is_null());
    }

    #[test]
    fn commit_not_found_is_not_found() {
        let err = AppError::CommitNotFound("build 'abc123'".to_string());
        assert!(err.is_not_found());
    }

    #[test]
    fn duplicate_build_id_display() {
        let err = AppError::DuplicateBuildId("abc123".to_string());
        assert_eq!(err.to_string(), "Duplicate build id: abc123");
        assert!(!err.is_not_found());
    }

    #[test]
    fn invalid_status_display() {
        let err = AppError::InvalidStatus("Retired".to_string());
        assert_eq!(err.to_string(), "Invalid status: Retired");
    }

    #[test]
    fn app_error_from_sqlx() {
        let sqlx_err = sqlx::Error::RowNotFound;
        let err: AppError = sqlx_err.into();
        assert!(matches!(err, AppError::Database(_)));
    }
}
