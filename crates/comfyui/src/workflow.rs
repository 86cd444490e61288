//! Workflow template parsing and per-capture patching.
//!
//! A ComfyUI workflow is a JSON object mapping node ids to node
//! definitions: `{"<id>": {"class_type": "...", "inputs": {...}}}`. The
//! template is loaded once at startup and never mutated; every capture
//! gets its own patched deep copy with the capture's asset name and the
//! configured output prefixes written into the relevant nodes.

use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Node class that loads an input image by name from the ComfyUI input
/// directory.
pub const CLASS_LOAD_IMAGE: &str = "LoadImage";
/// Node class that loads an input image as a mask.
pub const CLASS_LOAD_IMAGE_MASK: &str = "LoadImageMask";
/// Node class that saves a 2D image result.
pub const CLASS_SAVE_IMAGE: &str = "SaveImage";
/// Node class that saves a 3D mesh result as GLB.
pub const CLASS_SAVE_GLB: &str = "SaveGLB";

/// A parsed workflow template (or a patched copy of one).
///
/// Node order is preserved: ComfyUI treats the document as an ordered
/// object and the patched copy must serialize back in the same order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Workflow {
    pub nodes: IndexMap<String, WorkflowNode>,
}

/// One node of a workflow document.
///
/// Fields the patcher does not know about (`_meta` titles and whatever
/// future ComfyUI versions add) are carried in `extra` and round-trip
/// unmodified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowNode {
    pub class_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inputs: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Errors loading a workflow template from disk.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Failed to read workflow template {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Workflow template {path} is not valid JSON: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Naming for the files a patched workflow writes into the ComfyUI
/// output directory.
#[derive(Debug, Clone)]
pub struct OutputNaming {
    /// Prefix for 2D results and the stem for mesh results.
    pub filename_prefix: String,
    /// Subfolder for mesh artifacts, when configured.
    pub mesh_subfolder: Option<String>,
}

impl OutputNaming {
    /// The `filename_prefix` for mesh-save nodes:
    /// `<subfolder>/<prefix>` when a subfolder is configured, else the
    /// bare prefix.
    pub fn mesh_prefix(&self) -> String {
        match &self.mesh_subfolder {
            Some(folder) => format!("{folder}/{}", self.filename_prefix),
            None => self.filename_prefix.clone(),
        }
    }
}

impl Workflow {
    /// Load and parse a workflow template.
    pub fn load(path: &Path) -> Result<Self, WorkflowError> {
        let raw = std::fs::read_to_string(path).map_err(|source| WorkflowError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| WorkflowError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    /// A workflow with zero nodes means "no template configured":
    /// dispatch is disabled but capture still works.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Produce a patched deep copy for one capture. Pure and
    /// deterministic; `self` is never modified.
    ///
    /// - `LoadImage` / `LoadImageMask` nodes get `inputs.image` set to
    ///   `asset_name`.
    /// - `SaveImage` nodes get `inputs.filename_prefix` set to the
    ///   configured prefix.
    /// - `SaveGLB` nodes get `inputs.filename_prefix` set to
    ///   [`OutputNaming::mesh_prefix`].
    /// - Every other node class passes through untouched.
    ///
    /// Patching is best-effort per node: a node without an `inputs` map,
    /// or whose map lacks the expected key, is left alone for that field.
    pub fn patch(&self, asset_name: &str, naming: &OutputNaming) -> Workflow {
        let mut patched = self.clone();

        for node in patched.nodes.values_mut() {
            match node.class_type.as_str() {
                CLASS_LOAD_IMAGE | CLASS_LOAD_IMAGE_MASK => {
                    set_input(node, "image", asset_name.into());
                }
                CLASS_SAVE_IMAGE => {
                    set_input(node, "filename_prefix", naming.filename_prefix.clone().into());
                }
                CLASS_SAVE_GLB => {
                    set_input(node, "filename_prefix", naming.mesh_prefix().into());
                }
                _ => {}
            }
        }

        patched
    }
}

/// Overwrite `key` on the node's inputs when both the map and the key
/// already exist.
fn set_input(node: &mut WorkflowNode, key: &str, value: serde_json::Value) {
    if let Some(inputs) = node.inputs.as_mut() {
        if let Some(slot) = inputs.get_mut(key) {
            *slot = value;
        }
    }
}
