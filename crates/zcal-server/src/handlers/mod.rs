//! HTTP route handlers for the z-cal server.

pub mod food;
pub mod recipe;

use axum::Json;
use chrono::{SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dto::HealthResponse;
use crate::error::AppError;

pub const SERVICE_NAME: &str = "z-cal-api";

/// Health check endpoint.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: SERVICE_NAME,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

/// Fallback for paths no route matches.
pub async fn not_found() -> AppError {
    AppError::NotFound("Not found".into())
}

/// Fallback for known paths hit with the wrong method.
pub async fn method_not_allowed() -> AppError {
    AppError::MethodNotAllowed("Method not allowed".into())
}

/// Parses a request body as a JSON object whatever its `Content-Type`.
///
/// Arrays and scalars are rejected before `T` is built, since serde would
/// otherwise fill a struct from a positional array.
pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    let object = match serde_json::from_slice::<Value>(body) {
        Ok(value @ Value::Object(_)) => value,
        Ok(other) => {
            tracing::debug!("Rejected non-object body: {}", other);
            return Err(invalid_json());
        }
        Err(e) => {
            tracing::debug!("Rejected body: {}", e);
            return Err(invalid_json());
        }
    };

    serde_json::from_value(object).map_err(|e| {
        tracing::debug!("Rejected body shape: {}", e);
        invalid_json()
    })
}

fn invalid_json() -> AppError {
    AppError::BadRequest("Invalid JSON body".into())
}
