//! Error handling module
//!
//! Centralized error types and HTTP response conversion.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;
use crate::storage::StorageError;
use crate::validation::{codes, FieldError, ValidationErrors};

/// Application-wide Result type
pub type AppResult<T> = Result<T, AppError>;

/// Application error types
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Client errors (4xx)
    #[error("{0}")]
    Validation(#[from] ValidationErrors),

    #[error("{0}")]
    Conflict(String),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),

    // Server errors (5xx), unless the store reports a conflict
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl AppError {
    /// HTTP status this error maps to
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Domain(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Storage(e) if e.is_conflict() => StatusCode::CONFLICT,
            AppError::Storage(StorageError::DuplicateEmail(_)) => StatusCode::CONFLICT,
            AppError::Storage(_) | AppError::Internal(_) | AppError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

// Extractor rejections are reported like any other malformed field

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(ValidationErrors::single(
            "body",
            codes::INVALID_FORMAT,
            rejection.body_text(),
        ))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(ValidationErrors::single(
            "user_id",
            codes::INVALID_FORMAT,
            rejection.body_text(),
        ))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(ValidationErrors::single(
            "query",
            codes::INVALID_FORMAT,
            rejection.body_text(),
        ))
    }
}

/// Error response body
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub status_code: u16,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let (message, errors) = match &self {
            AppError::Validation(errors) => {
                (errors.joined_messages(), Some(errors.errors().to_vec()))
            }
            AppError::Conflict(msg) => (msg.clone(), None),
            AppError::Domain(e) => (e.to_string(), None),
            AppError::Storage(e) if status == StatusCode::CONFLICT => (e.to_string(), None),

            // 500 Internal Server Error
            AppError::Storage(e) => {
                tracing::error!("Storage error: {:?}", e);
                ("Internal server error".to_string(), None)
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                ("Internal server error".to_string(), None)
            }
            AppError::Config(e) => {
                tracing::error!("Config error: {:?}", e);
                ("Internal server error".to_string(), None)
            }
        };

        let body = ErrorResponse {
            status_code: status.as_u16(),
            message,
            errors,
        };

        (status, Json(body)).into_response()
    }
}
