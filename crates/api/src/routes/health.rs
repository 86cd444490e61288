use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Whether the ComfyUI instance answered the health probe.
    pub comfyui_healthy: bool,
}

/// GET /health -- returns service and ComfyUI health.
///
/// The server itself always answers 200; a failing ComfyUI probe only
/// degrades the reported status.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let comfyui_healthy = state.comfy.health_check().await.is_ok();

    let status = if comfyui_healthy { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        comfyui_healthy,
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
