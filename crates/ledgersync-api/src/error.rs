//! API error types.
//!
//! Trigger handlers never leak internals: any unexpected failure collapses
//! to a generic 500 body while the detail is logged server-side.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Errors surfaced by the API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or invalid credentials.
    #[error("unauthorized")]
    Unauthorized,

    /// The request was malformed or referenced nothing actionable.
    #[error("{0}")]
    BadRequest(String),

    /// Anything unexpected. The message is logged, never returned.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Bad request with a caller-visible message.
    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }
}

impl From<ledgersync_db::DbError> for ApiError {
    fn from(e: ledgersync_db::DbError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<ledgersync_vault::VaultError> for ApiError {
    fn from(e: ledgersync_vault::VaultError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl From<ledgersync_engine::EngineError> for ApiError {
    fn from(e: ledgersync_engine::EngineError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "error": "unauthorized" }),
            ),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, json!({ "error": message }))
            }
            ApiError::Internal(detail) => {
                error!(error = %detail, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "internal server error" }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;
