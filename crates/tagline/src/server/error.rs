//! HTTP error responses.
//!
//! Every failure is request-scoped and rendered as
//! `{"error": {"kind": ..., "message": ...}}`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tagline_core::InferenceError;

/// Errors returned by the tagging endpoint.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed or missing request fields; no model was invoked
    Validation { status: StatusCode, message: String },
    /// The model or a scoring step failed
    Inference(String),
    /// Inference exceeded the configured timeout
    Timeout(u64),
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "validation",
            ApiError::Inference(_) => "inference",
            ApiError::Timeout(_) => "timeout",
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Oversized or unreadable bodies keep their own status. Syntax errors,
        // which axum reports as 400, are folded into 422 with the rest.
        let status = match rejection {
            JsonRejection::BytesRejection(ref inner) => inner.status(),
            _ => StatusCode::UNPROCESSABLE_ENTITY,
        };
        Self::Validation {
            status,
            message: rejection.body_text(),
        }
    }
}

impl From<InferenceError> for ApiError {
    fn from(err: InferenceError) -> Self {
        match err {
            InferenceError::EmptyText => ApiError::validation(err.to_string()),
            InferenceError::Timeout { timeout_ms } => ApiError::Timeout(timeout_ms),
            other => ApiError::Inference(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, message) = match self {
            ApiError::Validation { status, message } => {
                tracing::debug!("Rejected request: {message}");
                (status, message)
            }
            ApiError::Inference(message) => {
                tracing::error!("Inference failed: {message}");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
            ApiError::Timeout(timeout_ms) => {
                tracing::warn!("Inference timed out after {timeout_ms}ms");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    format!("Inference timed out after {timeout_ms}ms"),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "kind": kind,
                "message": message,
            }
        }));

        (status, body).into_response()
    }
}
