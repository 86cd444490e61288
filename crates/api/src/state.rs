use std::path::PathBuf;
use std::sync::Arc;

use meshcam_comfyui::api::ComfyUIApi;
use meshcam_comfyui::dispatch::DispatchScheduler;
use meshcam_comfyui::workflow::{OutputNaming, Workflow};
use meshcam_core::slot::AssetSlot;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable; everything mutable or heavy sits behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Parsed workflow template; empty when none is configured.
    pub template: Arc<Workflow>,
    /// Deferred dispatch scheduler.
    pub scheduler: Arc<DispatchScheduler>,
    /// ComfyUI REST client (used directly by the diagnostic endpoints).
    pub comfy: Arc<ComfyUIApi>,
    /// Generation counter for captured frames.
    pub asset_slot: Arc<AssetSlot>,
}

impl AppState {
    /// Whether job dispatch is enabled (a non-empty template is loaded).
    pub fn comfyui_enabled(&self) -> bool {
        !self.template.is_empty()
    }

    /// Directory scanned for mesh artifacts.
    pub fn models_dir(&self) -> PathBuf {
        match &self.config.mesh_subfolder {
            Some(folder) => self.config.output_dir.join(folder),
            None => self.config.output_dir.clone(),
        }
    }

    /// URL base under which the static file service exposes that
    /// directory (see the `/outputs` mount in `main.rs`).
    pub fn models_url_base(&self) -> String {
        match &self.config.mesh_subfolder {
            Some(folder) => format!("/outputs/{folder}"),
            None => "/outputs".to_string(),
        }
    }

    /// Output naming written into patched workflows.
    pub fn output_naming(&self) -> OutputNaming {
        OutputNaming {
            filename_prefix: self.config.output_prefix.clone(),
            mesh_subfolder: self.config.mesh_subfolder.clone(),
        }
    }
}
