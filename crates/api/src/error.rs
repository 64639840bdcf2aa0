//! API error handling
//!
//! Consistent JSON error responses across all endpoints.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

/// Structured JSON error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// API error type that converts to JSON responses
#[derive(Debug)]
pub enum ApiError {
    /// Missing or invalid bearer token
    Unauthorized,
    /// Malformed query or body parameters
    BadRequest(String),
    /// Resource not found
    NotFound(String),
    /// Freeze attempted on a day that already counts
    AlreadyActive(String),
    /// Freeze attempted with an empty balance
    NoFreezeAvailable,
    /// Storage error
    Database(String),
    /// Internal server error
    Internal(String),
}

impl From<common::Error> for ApiError {
    fn from(err: common::Error) -> Self {
        match err {
            common::Error::NotFound(msg) => ApiError::NotFound(msg),
            common::Error::AlreadyActive(day) => {
                ApiError::AlreadyActive(format!("Day {day} is already active"))
            }
            common::Error::NoFreezeAvailable => ApiError::NoFreezeAvailable,
            common::Error::Database(msg) => ApiError::Database(msg),
            common::Error::Config(msg) | common::Error::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, response) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse {
                    error: "Missing or invalid credentials".to_string(),
                    code: Some("unauthorized".to_string()),
                },
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse {
                    error: msg,
                    code: Some("bad_request".to_string()),
                },
            ),
            ApiError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorResponse {
                    error: msg,
                    code: Some("not_found".to_string()),
                },
            ),
            ApiError::AlreadyActive(msg) => (
                StatusCode::CONFLICT,
                ErrorResponse {
                    error: msg,
                    code: Some("already_active".to_string()),
                },
            ),
            ApiError::NoFreezeAvailable => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse {
                    error: "No freeze tokens available".to_string(),
                    code: Some("no_freeze_available".to_string()),
                },
            ),
            ApiError::Database(msg) => {
                error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Database error".to_string(),
                        code: Some("database_error".to_string()),
                    },
                )
            }
            ApiError::Internal(msg) => {
                error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: "Internal server error".to_string(),
                        code: Some("internal_error".to_string()),
                    },
                )
            }
        };

        (status, Json(response)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
