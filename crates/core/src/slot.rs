//! Capture slot bookkeeping.
//!
//! Every accepted frame advances a generation counter. The generation id
//! is embedded in the on-disk filename and doubles as the correlation key
//! for that capture's deferred dispatch, so overlapping captures never
//! overwrite the file a queued job is about to read. Older generations are
//! left on disk; an in-flight ComfyUI job always reads the exact file its
//! dispatch referenced.

use std::sync::atomic::{AtomicU64, Ordering};

/// Mints per-capture asset generations for a single input slot.
pub struct AssetSlot {
    prefix: String,
    extension: String,
    counter: AtomicU64,
}

/// One minted generation: a unique id and the filename derived from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetGeneration {
    /// Monotonically increasing id, starting at 1.
    pub id: u64,
    /// Filename of the form `<prefix>_<id:06>.<extension>`.
    pub filename: String,
}

impl AssetSlot {
    pub fn new(prefix: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            extension: extension.into(),
            counter: AtomicU64::new(0),
        }
    }

    /// Mint the next generation. Safe to call from concurrent handlers.
    pub fn advance(&self) -> AssetGeneration {
        let id = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        AssetGeneration {
            id,
            filename: format!("{}_{:06}.{}", self.prefix, id, self.extension),
        }
    }
}
