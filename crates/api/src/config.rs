use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development
/// against a ComfyUI instance on the same machine. In production,
/// override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Base URL of the ComfyUI instance.
    pub comfyui_url: String,
    /// Timeout for requests to ComfyUI, in seconds.
    pub comfyui_timeout_secs: u64,
    /// ComfyUI input directory captured frames are written into.
    pub input_dir: PathBuf,
    /// ComfyUI output directory scanned, never written, by this server.
    pub output_dir: PathBuf,
    /// Workflow template path; a missing or empty template disables
    /// dispatch without disabling capture.
    pub workflow_path: PathBuf,
    /// Subfolder under the output directory for mesh artifacts.
    /// `None` when disabled via an empty `MESH_SUBFOLDER`.
    pub mesh_subfolder: Option<String>,
    /// `filename_prefix` written into save nodes.
    pub output_prefix: String,
    /// Filename stem for captured frames.
    pub input_prefix: String,
    /// Extension of the artifacts exposed by the model endpoints.
    pub model_extension: String,
    /// Seconds between accepting a frame and submitting its job.
    pub dispatch_delay_secs: u64,
    /// Directory served at `/` for the capture UI.
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default                   |
    /// |-------------------------|---------------------------|
    /// | `HOST`                  | `0.0.0.0`                 |
    /// | `PORT`                  | `3000`                    |
    /// | `CORS_ORIGINS`          | `http://localhost:5173`   |
    /// | `REQUEST_TIMEOUT_SECS`  | `30`                      |
    /// | `COMFYUI_URL`           | `http://127.0.0.1:8188`   |
    /// | `COMFYUI_TIMEOUT_SECS`  | `5`                       |
    /// | `COMFYUI_INPUT_DIR`     | `input`                   |
    /// | `COMFYUI_OUTPUT_DIR`    | `output`                  |
    /// | `WORKFLOW_PATH`         | `workflows/webcam_3d.json`|
    /// | `MESH_SUBFOLDER`        | `mesh` (empty disables)   |
    /// | `OUTPUT_PREFIX`         | `webcam_3d_mesh`          |
    /// | `INPUT_PREFIX`          | `webcam_input`            |
    /// | `MODEL_EXTENSION`       | `glb`                     |
    /// | `DISPATCH_DELAY_SECS`   | `3`                       |
    /// | `STATIC_DIR`            | `public`                  |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let comfyui_url = std::env::var("COMFYUI_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8188".into())
            .trim_end_matches('/')
            .to_string();

        let comfyui_timeout_secs: u64 = std::env::var("COMFYUI_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".into())
            .parse()
            .expect("COMFYUI_TIMEOUT_SECS must be a valid u64");

        let input_dir = PathBuf::from(std::env::var("COMFYUI_INPUT_DIR").unwrap_or_else(|_| "input".into()));
        let output_dir =
            PathBuf::from(std::env::var("COMFYUI_OUTPUT_DIR").unwrap_or_else(|_| "output".into()));
        let workflow_path = PathBuf::from(
            std::env::var("WORKFLOW_PATH").unwrap_or_else(|_| "workflows/webcam_3d.json".into()),
        );

        let mesh_subfolder = match std::env::var("MESH_SUBFOLDER") {
            Ok(value) if value.trim().is_empty() => None,
            Ok(value) => Some(value.trim().to_string()),
            Err(_) => Some("mesh".to_string()),
        };

        let output_prefix =
            std::env::var("OUTPUT_PREFIX").unwrap_or_else(|_| "webcam_3d_mesh".into());
        let input_prefix = std::env::var("INPUT_PREFIX").unwrap_or_else(|_| "webcam_input".into());
        let model_extension = std::env::var("MODEL_EXTENSION").unwrap_or_else(|_| "glb".into());

        let dispatch_delay_secs: u64 = std::env::var("DISPATCH_DELAY_SECS")
            .unwrap_or_else(|_| "3".into())
            .parse()
            .expect("DISPATCH_DELAY_SECS must be a valid u64");

        let static_dir =
            PathBuf::from(std::env::var("STATIC_DIR").unwrap_or_else(|_| "public".into()));

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            comfyui_url,
            comfyui_timeout_secs,
            input_dir,
            output_dir,
            workflow_path,
            mesh_subfolder,
            output_prefix,
            input_prefix,
            model_extension,
            dispatch_delay_secs,
            static_dir,
        }
    }
}
