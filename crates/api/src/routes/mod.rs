pub mod capture;
pub mod diagnostics;
pub mod health;
pub mod models;

use axum::Router;

use crate::state::AppState;

/// Build the application route tree (mounted at the server root).
///
/// ```text
/// POST /save-frame     accept a webcam frame, schedule deferred dispatch
/// GET  /models         discovered mesh artifacts, newest first
/// GET  /latest-model   newest mesh artifact, if any
/// GET  /config         reflect live configuration
/// GET  /health         service + ComfyUI health
/// GET  /test-comfyui   live ComfyUI probe with pass-through stats
/// ```
///
/// Static file services (`/outputs`, the capture UI at `/`) are mounted
/// in `main.rs` next to the middleware stack.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(capture::router())
        .merge(models::router())
        .merge(diagnostics::router())
}
