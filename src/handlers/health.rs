//! Health check endpoint
//!
//! Reports liveness and which upstream provider is configured. Never calls
//! the provider.

use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;

use crate::handlers::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: &'static str,
    /// Configured provider kind
    pub provider: &'static str,
    /// Model sent with completion requests
    pub model: String,
}

/// Health check handler
pub async fn handler(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "OK",
            provider: state.config().provider.kind().as_str(),
            model: state.config().provider.model().to_string(),
        }),
    )
}
