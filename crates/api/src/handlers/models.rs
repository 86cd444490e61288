//! Artifact discovery endpoints over the ComfyUI output directory.
//!
//! ComfyUI gives no completion callback; the files it writes are the
//! only completion signal, so clients poll these endpoints.

use axum::extract::State;
use axum::Json;
use meshcam_core::artifacts::{latest_artifact, list_artifacts, Artifact};
use serde::Serialize;

use crate::state::AppState;

/// Response for `GET /models`.
#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub success: bool,
    pub models: Vec<Artifact>,
    pub count: usize,
}

/// GET /models -- all discovered mesh artifacts, newest first.
pub async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let models = list_artifacts(
        &state.models_dir(),
        &state.config.model_extension,
        &state.models_url_base(),
    )
    .await;
    let count = models.len();

    Json(ModelsResponse {
        success: true,
        models,
        count,
    })
}

/// Response for `GET /latest-model`.
#[derive(Debug, Serialize)]
pub struct LatestModelResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<Artifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// GET /latest-model -- the newest mesh artifact, if any exists yet.
pub async fn latest_model(State(state): State<AppState>) -> Json<LatestModelResponse> {
    match latest_artifact(
        &state.models_dir(),
        &state.config.model_extension,
        &state.models_url_base(),
    )
    .await
    {
        Some(model) => Json(LatestModelResponse {
            success: true,
            model: Some(model),
            message: None,
        }),
        None => Json(LatestModelResponse {
            success: false,
            model: None,
            message: Some("No models generated yet".to_string()),
        }),
    }
}
