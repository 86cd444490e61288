//! Route definitions for operator diagnostics.

use axum::routing::get;
use axum::Router;

use crate::handlers::diagnostics;
use crate::state::AppState;

/// Diagnostic routes mounted at the server root.
///
/// ```text
/// GET /config       -> get_config
/// GET /test-comfyui -> test_comfyui
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/config", get(diagnostics::get_config))
        .route("/test-comfyui", get(diagnostics::test_comfyui))
}
