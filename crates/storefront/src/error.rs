//! Unified error handling for the storefront API.
//!
//! Provides a unified `AppError` type mapped onto the API's failure
//! taxonomy. All route handlers return `Result<T, AppError>`; failures are
//! surfaced to clients as a structured body `{"error": {"kind", "message"}}`
//! and are never fatal to the process.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::token::AuthError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Credential verification failed where authentication is required.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Referenced product or resource absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed identifier or out-of-range value from the client.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Concurrent-creation race the store-level upsert did not absorb.
    /// Callers should treat this as retryable.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Structured failure body returned to clients.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    kind: &'static str,
    message: String,
}

impl AppError {
    /// Stable machine-readable kind for the client.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Repository(RepositoryError::Conflict(_)) | Self::Conflict(_) => "conflict",
            Self::Repository(_) | Self::Internal(_) => "internal",
            Self::Auth(_) => "authentication_error",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::Repository(RepositoryError::Conflict(_)) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Repository(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Repository(_) | Self::Internal(_)) {
            tracing::error!(error = %self, "Request error");
        }

        let status = self.status();
        let kind = self.kind();

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Repository(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Repository(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        };

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail { kind, message },
            }),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::Validation("quantity must be positive".to_string());
        assert_eq!(err.to_string(), "Validation failed: quantity must be positive");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::MissingCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Validation("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_conflict_is_retryable_conflict() {
        let err = AppError::Repository(RepositoryError::Conflict("creation race".to_string()));
        assert_eq!(err.kind(), "conflict");
        assert_eq!(get_status(err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_internal_details_are_withheld() {
        let err = AppError::Internal("connection pool exhausted".to_string());
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
