//! Webcam frame capture: decode, persist, schedule deferred dispatch.

use axum::extract::State;
use axum::Json;
use base64::engine::general_purpose;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Request body for `POST /save-frame`.
///
/// The front-end sends the canvas contents as a JPEG data URL.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFrameRequest {
    pub image_data: Option<String>,
}

/// Response for a successfully captured frame.
#[derive(Debug, Serialize)]
pub struct SaveFrameResponse {
    pub success: bool,
    pub filename: String,
    pub path: String,
    pub comfyui_enabled: bool,
    pub delay_seconds: u64,
}

/// POST /save-frame -- persist one webcam frame and schedule dispatch.
///
/// The file write is synchronous with the request. The ComfyUI
/// submission happens later on an independent task, so nothing past the
/// write can affect this response.
pub async fn save_frame(
    State(state): State<AppState>,
    Json(request): Json<SaveFrameRequest>,
) -> AppResult<Json<SaveFrameResponse>> {
    let image_data = request
        .image_data
        .as_deref()
        .filter(|data| !data.is_empty())
        .ok_or_else(|| AppError::BadRequest("imageData is required".to_string()))?;

    // Expected shape: "data:image/jpeg;base64,<payload>".
    let payload = image_data
        .split_once("base64,")
        .map(|(_, payload)| payload)
        .ok_or_else(|| {
            AppError::BadRequest("imageData must be a base64 data URL".to_string())
        })?;

    let bytes = general_purpose::STANDARD
        .decode(payload)
        .map_err(|e| AppError::BadRequest(format!("imageData is not valid base64: {e}")))?;

    let generation = state.asset_slot.advance();
    let path = state.config.input_dir.join(&generation.filename);

    tokio::fs::write(&path, &bytes).await.map_err(|e| {
        AppError::InternalError(format!("Failed to write {}: {e}", path.display()))
    })?;

    tracing::info!(
        generation = generation.id,
        filename = %generation.filename,
        size_bytes = bytes.len(),
        "Frame captured"
    );

    let comfyui_enabled = state.comfyui_enabled();
    if comfyui_enabled {
        // Freeze the job at capture time so a later capture cannot change
        // which file this dispatch references.
        let job = state
            .template
            .patch(&generation.filename, &state.output_naming());
        state.scheduler.schedule(job, generation.id);
    } else {
        tracing::debug!(
            generation = generation.id,
            "No workflow template configured, dispatch skipped"
        );
    }

    Ok(Json(SaveFrameResponse {
        success: true,
        filename: generation.filename,
        path: path.display().to_string(),
        comfyui_enabled,
        delay_seconds: state.config.dispatch_delay_secs,
    }))
}
