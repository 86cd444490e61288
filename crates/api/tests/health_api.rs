//! Integration tests for health, diagnostics, and general HTTP
//! behaviour.

use axum::http::StatusCode;
use common::{body_json, build_test_app, get, test_config};
use meshcam_comfyui::workflow::Workflow;

mod common;

fn template() -> Workflow {
    serde_json::from_str(
        r#"{"1": {"class_type": "LoadImage", "inputs": {"image": "placeholder.png"}}}"#,
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// Test: GET /health degrades when ComfyUI is unreachable
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_degrades_without_comfyui() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = build_test_app(
        test_config(dir.path(), dir.path()),
        Workflow::default(),
    );

    let response = get(app, "/health").await;

    // The server answers even when the compute service is down.
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "degraded");
    assert_eq!(json["comfyui_healthy"], false);
    assert!(json["version"].is_string());
}

// ---------------------------------------------------------------------------
// Test: GET /config reflects the loaded template and directories
// ---------------------------------------------------------------------------

#[tokio::test]
async fn config_reflects_live_state() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = build_test_app(test_config(dir.path(), dir.path()), template());

    let json = body_json(get(app, "/config").await).await;

    assert_eq!(json["comfyui_enabled"], true);
    assert_eq!(json["workflow_nodes"], 1);
    assert_eq!(json["comfyui_url"], "http://127.0.0.1:1");
    assert_eq!(json["mesh_subfolder"], "mesh");
    assert_eq!(json["output_prefix"], "webcam_3d_mesh");
    assert_eq!(json["dispatch_delay_secs"], 60);
}

// ---------------------------------------------------------------------------
// Test: GET /config reports dispatch off for an empty template
// ---------------------------------------------------------------------------

#[tokio::test]
async fn config_reports_dispatch_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = build_test_app(
        test_config(dir.path(), dir.path()),
        Workflow::default(),
    );

    let json = body_json(get(app, "/config").await).await;

    assert_eq!(json["comfyui_enabled"], false);
    assert_eq!(json["workflow_nodes"], 0);
}

// ---------------------------------------------------------------------------
// Test: GET /test-comfyui reports the probe failure detail
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_comfyui_reports_unreachable_instance() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = build_test_app(
        test_config(dir.path(), dir.path()),
        Workflow::default(),
    );

    let response = get(app, "/test-comfyui").await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"].is_string());
    assert!(json.get("stats").is_none());
}

// ---------------------------------------------------------------------------
// Test: unknown route returns 404
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_route_returns_404() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = build_test_app(
        test_config(dir.path(), dir.path()),
        Workflow::default(),
    );

    let response = get(app, "/this-route-does-not-exist").await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

// ---------------------------------------------------------------------------
// Test: x-request-id header is present in response
// ---------------------------------------------------------------------------

#[tokio::test]
async fn response_contains_x_request_id_header() {
    let dir = tempfile::tempdir().unwrap();
    let (app, _state) = build_test_app(
        test_config(dir.path(), dir.path()),
        Workflow::default(),
    );

    let response = get(app, "/health").await;

    let request_id = response.headers().get("x-request-id");
    assert!(
        request_id.is_some(),
        "Response must contain an x-request-id header"
    );

    // The value should be a valid UUID (36 chars with hyphens).
    let id_str = request_id.unwrap().to_str().unwrap();
    assert_eq!(id_str.len(), 36, "x-request-id should be a UUID string");
}
