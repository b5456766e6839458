//! Application error types and Axum response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use zcal_core::AgentError;

/// Application-level errors with HTTP status code mapping.
#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    MethodNotAllowed(String),
    BadRequest(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::MethodNotAllowed(msg) => (StatusCode::METHOD_NOT_ALLOWED, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

/// Caller mistakes become 400, everything else 500; the message is kept.
impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        if err.is_invalid_input() {
            AppError::BadRequest(err.to_string())
        } else {
            AppError::Internal(err.to_string())
        }
    }
}
