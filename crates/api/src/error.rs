use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use auth::prelude::AuthError;
use storage::StorageError;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Everything a handler can fail with, mapped onto a status code
#[derive(Debug)]
pub enum ApiError {
    Auth(AuthError),
    Storage(StorageError),
    /// Request body or path could not be parsed
    BadRequest(String),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        ApiError::Auth(AuthError::Unauthorized)
    }

    pub fn forbidden() -> Self {
        ApiError::Auth(AuthError::Forbidden)
    }

    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            ApiError::Auth(err) => match err {
                AuthError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                AuthError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
                AuthError::Unauthorized => (StatusCode::UNAUTHORIZED, err.to_string()),
                AuthError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
                AuthError::Forbidden => (StatusCode::FORBIDDEN, err.to_string()),
                AuthError::Unavailable(detail) => {
                    error!(error = %detail, "auth backend unavailable");
                    unavailable()
                }
            },
            ApiError::Storage(err) => match err {
                StorageError::Validation(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                StorageError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
                StorageError::StorageError(detail) => {
                    error!(error = %detail, "catalog storage failed");
                    unavailable()
                }
            },
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
        }
    }
}

fn unavailable() -> (StatusCode, String) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        "Service temporarily unavailable".to_string(),
    )
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_message();
        (status, Json(ErrorResponse { error })).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Auth(err)
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Invalid path: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: impl Into<ApiError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn test_auth_error_statuses() {
        assert_eq!(status(AuthError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(AuthError::Conflict("x".into())), StatusCode::CONFLICT);
        assert_eq!(status(AuthError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status(AuthError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(AuthError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(
            status(AuthError::Unavailable("db down".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_storage_error_statuses() {
        assert_eq!(status(StorageError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(StorageError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(
            status(StorageError::StorageError("x".into())),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_unavailable_hides_detail() {
        let (_, message) = ApiError::from(AuthError::Unavailable("secret dsn".into()))
            .status_and_message();
        assert!(!message.contains("secret dsn"));
    }
}
