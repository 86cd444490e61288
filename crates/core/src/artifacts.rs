//! Artifact discovery over the ComfyUI output directory.
//!
//! ComfyUI writes result files on its own schedule and never calls back,
//! so the filesystem is the source of truth for job completion. Nothing is
//! cached between scans: every listing re-reads the directory, which makes
//! files written externally visible on the next query without any polling
//! loop on our side.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A result file discovered on disk.
///
/// Derived entirely from filesystem metadata at scan time. A file that is
/// still being written by ComfyUI may appear with a stale size; callers
/// that care should re-query.
#[derive(Debug, Clone, Serialize)]
pub struct Artifact {
    /// Bare file name, e.g. `webcam_3d_mesh_00001_.glb`.
    pub name: String,
    /// Path on disk as seen by this process.
    pub path: String,
    /// URL under which the static file service exposes the artifact.
    pub url: String,
    /// File size in bytes at scan time.
    pub size_bytes: u64,
    /// Last-modified timestamp.
    pub modified_at: DateTime<Utc>,
}

/// List artifacts in `dir` matching `extension`, newest first.
///
/// The extension match is case-insensitive. The sort is stable by
/// modification time descending: entries with identical timestamps keep
/// the directory enumeration order. A missing or unreadable directory
/// yields an empty vec, not an error -- "no artifacts yet" is a normal
/// state for a fresh output directory. Entries whose metadata cannot be
/// read are skipped.
pub async fn list_artifacts(dir: &Path, extension: &str, url_base: &str) -> Vec<Artifact> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Artifact directory not readable");
            return Vec::new();
        }
    };

    let url_base = url_base.trim_end_matches('/');
    let mut artifacts = Vec::new();

    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Directory scan aborted");
                break;
            }
        };

        let path = entry.path();
        let matches = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false);
        if !matches {
            continue;
        }

        let metadata = match entry.metadata().await {
            Ok(metadata) => metadata,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !metadata.is_file() {
            continue;
        }

        let modified_at = match metadata.modified() {
            Ok(time) => DateTime::<Utc>::from(time),
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "Skipping entry without mtime");
                continue;
            }
        };

        let name = entry.file_name().to_string_lossy().to_string();
        artifacts.push(Artifact {
            url: format!("{url_base}/{name}"),
            name,
            path: path.display().to_string(),
            size_bytes: metadata.len(),
            modified_at,
        });
    }

    // Stable sort: ties keep enumeration order.
    artifacts.sort_by(|a, b| b.modified_at.cmp(&a.modified_at));
    artifacts
}

/// The newest artifact in `dir`, or `None` when nothing matches yet.
pub async fn latest_artifact(dir: &Path, extension: &str, url_base: &str) -> Option<Artifact> {
    list_artifacts(dir, extension, url_base)
        .await
        .into_iter()
        .next()
}
