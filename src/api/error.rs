//! API Error Types
//!
//! Defines error types for the API layer and implements conversion
//! to HTTP responses with appropriate status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::agent::AgentError;
use crate::auth::AuthError;
use crate::storage::StorageError;

/// API error types
#[derive(Error, Debug)]
pub enum ApiError {
    /// Request validation failed
    #[error("{0}")]
    Validation(String),

    /// Bad credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Resource not found
    #[error("{0}")]
    NotFound(String),

    /// Resource already exists
    #[error("{0}")]
    Conflict(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Storage(StorageError),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Service unavailable (dependency down)
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            ApiError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            // clients treat a taken username like any other rejected form
            ApiError::Conflict(_) => (StatusCode::BAD_REQUEST, "CONFLICT"),
            ApiError::Storage(_) => (StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            ApiError::ServiceUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            ApiError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR"),
        }
    }

    /// Message shown to the client. Server-side failures are not echoed.
    fn detail(&self) -> String {
        match self {
            ApiError::Validation(m)
            | ApiError::Unauthorized(m)
            | ApiError::NotFound(m)
            | ApiError::Conflict(m) => m.clone(),
            ApiError::ServiceUnavailable(_) => "Service temporarily unavailable".to_string(),
            ApiError::Storage(_) | ApiError::Internal(_) | ApiError::Io(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

/// Error response body
#[derive(Serialize)]
pub struct ErrorResponse {
    pub detail: String,
    pub code: String,
    pub request_id: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let request_id = uuid::Uuid::new_v4().to_string();

        // Log the error
        if status.is_server_error() {
            tracing::error!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "API error occurred"
            );
        } else {
            tracing::warn!(
                request_id = %request_id,
                error_code = %code,
                error_message = %self,
                "Request rejected"
            );
        }

        let body = ErrorResponse {
            detail: self.detail(),
            code: code.to_string(),
            request_id,
        };

        (status, Json(body)).into_response()
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(what) => ApiError::NotFound(format!("Not found: {}", what)),
            StorageError::Conflict(what) => ApiError::Conflict(what),
            other => ApiError::Storage(other),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Validation(msg) => ApiError::Validation(msg),
            AuthError::UsernameTaken => ApiError::Conflict(e.to_string()),
            AuthError::InvalidCredentials => ApiError::Unauthorized(e.to_string()),
            AuthError::Hashing(msg) => ApiError::Internal(msg),
            AuthError::Storage(inner) => inner.into(),
        }
    }
}

impl From<AgentError> for ApiError {
    fn from(e: AgentError) -> Self {
        match e {
            AgentError::Storage(inner) => inner.into(),
            other => ApiError::ServiceUnavailable(other.to_string()),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(format!("Worker task failed: {}", e))
    }
}

/// Result type for API operations
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_client_statuses() {
        let taken: ApiError = AuthError::UsernameTaken.into();
        assert_eq!(taken.status_and_code().0, StatusCode::BAD_REQUEST);
        assert_eq!(taken.detail(), "Username already exists");

        let bad: ApiError = AuthError::InvalidCredentials.into();
        assert_eq!(bad.status_and_code().0, StatusCode::UNAUTHORIZED);
        assert_eq!(bad.detail(), "Invalid username or password");
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = ApiError::Internal("mutex poisoned".to_string());
        assert_eq!(err.detail(), "Internal server error");
    }
}
