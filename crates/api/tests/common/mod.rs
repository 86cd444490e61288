//! Shared helpers for API integration tests.
//!
//! Mirrors the router construction in `main.rs` so the tests exercise
//! the same middleware stack (CORS, request ID, timeout, tracing, panic
//! recovery) that production uses.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

use meshcam_api::config::ServerConfig;
use meshcam_api::routes;
use meshcam_api::state::AppState;
use meshcam_comfyui::api::ComfyUIApi;
use meshcam_comfyui::dispatch::{ComputeTransport, DispatchScheduler, JobDispatcher};
use meshcam_comfyui::workflow::Workflow;
use meshcam_core::slot::AssetSlot;

/// Build a test `ServerConfig` rooted in the given temp directories.
///
/// The ComfyUI URL points at a port nothing listens on, so health
/// probes fail fast and nothing ever reaches a real instance.
pub fn test_config(input_dir: &Path, output_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        comfyui_url: "http://127.0.0.1:1".to_string(),
        comfyui_timeout_secs: 1,
        input_dir: input_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        workflow_path: "workflows/webcam_3d.json".into(),
        mesh_subfolder: Some("mesh".to_string()),
        output_prefix: "webcam_3d_mesh".to_string(),
        input_prefix: "webcam_input".to_string(),
        model_extension: "glb".to_string(),
        // Long enough that a scheduled dispatch never fires mid-test.
        dispatch_delay_secs: 60,
        static_dir: output_dir.join("no-such-static-dir"),
    }
}

/// Build the full application router plus the state behind it.
pub fn build_test_app(config: ServerConfig, template: Workflow) -> (Router, AppState) {
    let comfy = Arc::new(ComfyUIApi::new(
        config.comfyui_url.clone(),
        Duration::from_secs(config.comfyui_timeout_secs),
    ));
    let dispatcher = Arc::new(JobDispatcher::new(
        Arc::clone(&comfy) as Arc<dyn ComputeTransport>
    ));
    let scheduler = DispatchScheduler::new(
        dispatcher,
        Duration::from_secs(config.dispatch_delay_secs),
    );

    let state = AppState {
        config: Arc::new(config.clone()),
        template: Arc::new(template),
        scheduler,
        comfy,
        asset_slot: Arc::new(AssetSlot::new(config.input_prefix.clone(), "jpg")),
    };

    let cors = CorsLayer::new()
        .allow_origin(["http://localhost:5173".parse().unwrap()])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let request_id_header = HeaderName::from_static("x-request-id");

    let app = Router::new()
        .merge(routes::router())
        .nest_service("/outputs", ServeDir::new(&config.output_dir))
        .fallback_service(ServeDir::new(&config.static_dir))
        .layer(CatchPanicLayer::new())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(config.request_timeout_secs),
        ))
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        .layer(cors)
        .with_state(state.clone());

    (app, state)
}

/// Issue a GET request against the router.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Issue a POST request with a JSON body against the router.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
