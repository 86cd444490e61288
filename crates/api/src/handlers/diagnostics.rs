//! Operator-facing diagnostics: configuration reflection and a live
//! ComfyUI probe.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Response for `GET /config`.
#[derive(Debug, Serialize)]
pub struct ConfigResponse {
    pub comfyui_url: String,
    pub comfyui_enabled: bool,
    pub workflow_path: String,
    pub workflow_nodes: usize,
    pub input_dir: String,
    pub output_dir: String,
    pub mesh_subfolder: Option<String>,
    pub output_prefix: String,
    pub dispatch_delay_secs: u64,
}

/// GET /config -- reflect the live configuration.
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    Json(ConfigResponse {
        comfyui_url: state.config.comfyui_url.clone(),
        comfyui_enabled: state.comfyui_enabled(),
        workflow_path: state.config.workflow_path.display().to_string(),
        workflow_nodes: state.template.len(),
        input_dir: state.config.input_dir.display().to_string(),
        output_dir: state.config.output_dir.display().to_string(),
        mesh_subfolder: state.config.mesh_subfolder.clone(),
        output_prefix: state.config.output_prefix.clone(),
        dispatch_delay_secs: state.config.dispatch_delay_secs,
    })
}

/// Response for `GET /test-comfyui`.
#[derive(Debug, Serialize)]
pub struct TestComfyUIResponse {
    pub success: bool,
    /// Opaque `/system_stats` body, passed through on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /test-comfyui -- probe ComfyUI and pass its stats through.
///
/// Always answers 200; the `success` flag carries the probe outcome.
pub async fn test_comfyui(State(state): State<AppState>) -> Json<TestComfyUIResponse> {
    match state.comfy.system_stats().await {
        Ok(stats) => Json(TestComfyUIResponse {
            success: true,
            stats: Some(stats),
            error: None,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "ComfyUI probe failed");
            Json(TestComfyUIResponse {
                success: false,
                stats: None,
                error: Some(e.to_string()),
            })
        }
    }
}
