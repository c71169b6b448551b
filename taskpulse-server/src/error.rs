//! HTTP error mapping.
//!
//! Callers always receive either a complete analytics payload or a single
//! error envelope, never a mixed partial result. Any aggregation failure
//! (store unavailable, timeout) maps to 500 with the cause logged.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Wrapper turning core errors into the `{ "error": ... }` envelope.
pub struct ApiError(pub taskpulse_core::Error);

impl From<taskpulse_core::Error> for ApiError {
    fn from(err: taskpulse_core::Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!(error = %self.0, "Analytics request failed");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
