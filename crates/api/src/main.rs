use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::CONTENT_TYPE;
use axum::http::{HeaderName, Method, StatusCode};
use axum::Router;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use meshcam_api::config::ServerConfig;
use meshcam_api::{routes, state};
use meshcam_comfyui::api::ComfyUIApi;
use meshcam_comfyui::dispatch::{ComputeTransport, DispatchScheduler, JobDispatcher};
use meshcam_comfyui::workflow::Workflow;
use meshcam_core::slot::AssetSlot;

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meshcam=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, comfyui_url = %config.comfyui_url, "Loaded server configuration");

    // --- Workflow template ---
    // A missing or unreadable template disables dispatch, not capture.
    let template = match Workflow::load(&config.workflow_path) {
        Ok(workflow) => {
            tracing::info!(
                path = %config.workflow_path.display(),
                nodes = workflow.len(),
                "Workflow template loaded"
            );
            workflow
        }
        Err(e) => {
            tracing::warn!(
                path = %config.workflow_path.display(),
                error = %e,
                "No usable workflow template, dispatch disabled"
            );
            Workflow::default()
        }
    };

    // --- Input directory ---
    if let Err(e) = tokio::fs::create_dir_all(&config.input_dir).await {
        tracing::warn!(
            dir = %config.input_dir.display(),
            error = %e,
            "Could not create input directory, captures will fail"
        );
    }

    // --- ComfyUI client and dispatch pipeline ---
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

    // --- CORS ---
    let cors = build_cors_layer(&config);

    // --- App state ---
    let asset_slot = Arc::new(AssetSlot::new(
        config.input_prefix.clone(),
        "jpg".to_string(),
    ));
    let state = AppState {
        config: Arc::new(config.clone()),
        template: Arc::new(template),
        scheduler: Arc::clone(&scheduler),
        comfy,
        asset_slot,
    };

    // --- Request ID header name ---
    let request_id_header = HeaderName::from_static("x-request-id");

    // --- Router ---
    let app = Router::new()
        .merge(routes::router())
        // Artifacts written by ComfyUI, exposed read-only.
        .nest_service("/outputs", ServeDir::new(&config.output_dir))
        // Capture UI.
        .fallback_service(ServeDir::new(&config.static_dir))
        // -- Middleware stack (applied bottom-up) --
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
        .with_state(state);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    // Unfired dispatches die with the process; fired ones were already
    // fire-and-forget.
    scheduler.shutdown();
    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the server
/// shuts down cleanly whether stopped interactively or by a process
/// manager.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}

/// Build the CORS middleware layer from server configuration.
///
/// Panics at startup if any configured origin is invalid, which is the
/// desired behaviour -- we want misconfiguration to fail fast.
fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let origins: Vec<_> = config
        .cors_origins
        .iter()
        .map(|o| {
            o.parse()
                .unwrap_or_else(|e| panic!("Invalid CORS origin '{o}': {e}"))
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(3600))
}
