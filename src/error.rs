// src/error.rs

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::fmt;

use crate::quiz::attempt::AttemptError;

/// Global Application Error Enum.
/// One variant per error category; each maps to a single HTTP status.
#[derive(Debug)]
pub enum AppError {
    // 500 Internal Server Error (persistence and unexpected faults)
    InternalServerError(String),

    // 400 Bad Request (input validation)
    BadRequest(String),

    // 401 Unauthorized (missing identity, bad credentials)
    AuthError(String),

    // 403 Forbidden (ownership mismatch)
    Forbidden(String),

    // 404 Not Found (no questions for a title, no record yet)
    NotFound(String),

    // 409 Conflict (duplicate username, attempt already finalized)
    Conflict(String),

    // 502 Bad Gateway (question generator failed)
    GenerationFailed(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InternalServerError(msg) => write!(f, "internal error: {}", msg),
            AppError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            AppError::AuthError(msg) => write!(f, "unauthorized: {}", msg),
            AppError::Forbidden(msg) => write!(f, "forbidden: {}", msg),
            AppError::NotFound(msg) => write!(f, "not found: {}", msg),
            AppError::Conflict(msg) => write!(f, "conflict: {}", msg),
            AppError::GenerationFailed(msg) => write!(f, "generation failed: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

/// Converts the error into a JSON response with the matching HTTP status code.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::AuthError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::GenerationFailed(msg) => {
                tracing::error!("Question generation failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Failed to generate questions".to_string(),
                )
            }
        };
        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Allows using `?` operator on database queries.
impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::InternalServerError(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

impl From<AttemptError> for AppError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::AlreadyFinalized => AppError::Conflict(err.to_string()),
            AttemptError::UnknownQuestion(_) | AttemptError::OptionOutOfRange(_) => {
                AppError::BadRequest(err.to_string())
            }
            AttemptError::NotStarted | AttemptError::NoQuestions | AttemptError::AlreadyLoaded => {
                AppError::Conflict(err.to_string())
            }
        }
    }
}
