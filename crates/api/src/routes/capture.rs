//! Route definitions for frame capture.

use axum::routing::post;
use axum::Router;

use crate::handlers::capture;
use crate::state::AppState;

/// Capture routes mounted at the server root.
///
/// ```text
/// POST /save-frame -> save_frame
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/save-frame", post(capture::save_frame))
}
