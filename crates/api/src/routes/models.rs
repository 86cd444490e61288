//! Route definitions for artifact discovery.

use axum::routing::get;
use axum::Router;

use crate::handlers::models;
use crate::state::AppState;

/// Artifact discovery routes mounted at the server root.
///
/// ```text
/// GET /models       -> list_models
/// GET /latest-model -> latest_model
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/models", get(models::list_models))
        .route("/latest-model", get(models::latest_model))
}
