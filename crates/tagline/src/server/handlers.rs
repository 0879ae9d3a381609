//! Request handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use tagline_core::Prediction;

use super::error::ApiError;
use super::AppState;

/// Body of `POST /get-tags`.
#[derive(Debug, Deserialize)]
pub struct TagRequest {
    pub description: String,
}

/// Successful tagging response.
#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub tags: Prediction,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub strategy: String,
    pub version: String,
}

/// POST /get-tags
///
/// Returns the top tags per category for the description.
///
/// Every unusable body answers 422, including JSON syntax errors that axum
/// would report as 400. Clients see one validation status for any bad input.
/// Oversized bodies are the exception and keep 413.
pub async fn get_tags(
    State(state): State<AppState>,
    payload: Result<Json<TagRequest>, JsonRejection>,
) -> Result<Json<TagResponse>, ApiError> {
    let Json(request) = payload?;

    if request.description.trim().is_empty() {
        return Err(ApiError::validation("description must not be empty"));
    }

    let tags = state.predict(request.description).await?;
    Ok(Json(TagResponse { tags }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        strategy: state.tagger.strategy_name().to_string(),
        version: tagline_core::VERSION.to_string(),
    })
}
