//! Pipeline path configuration.
//!
//! Every component receives an explicit [`StoreLayout`] at
//! construction; nothing reads ambient global state. The batch and
//! speed layers write to disjoint output namespaces and own distinct
//! persisted artifacts, which is the whole isolation story between
//! the two writers.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Filesystem layout of the raw ingest, processed, and checkpoint stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreLayout {
    /// Directory of raw batch dump files (newline-delimited JSON).
    pub raw_batch_dir: PathBuf,
    /// Directory of raw stream micro-batch files.
    pub raw_stream_dir: PathBuf,
    /// Reference user dimension table (CSV with header).
    pub dimension_path: PathBuf,
    /// Batch snapshot output directory.
    pub snapshot_dir: PathBuf,
    /// Speed partition output directory.
    pub partition_dir: PathBuf,
    /// Durable committed-set artifact for the stream committer.
    pub checkpoint_path: PathBuf,
}

impl StoreLayout {
    /// Conventional layout under a single base data directory.
    pub fn from_base_dir(base: impl AsRef<Path>) -> Self {
        let data = base.as_ref().join("data");
        Self {
            raw_batch_dir: data.join("raw").join("batch"),
            raw_stream_dir: data.join("raw").join("stream"),
            dimension_path: data.join("master").join("users.csv"),
            snapshot_dir: data.join("processed").join("batch_views"),
            partition_dir: data.join("processed").join("speed_views"),
            checkpoint_path: data.join("speed_checkpoint.json"),
        }
    }
}

impl Default for StoreLayout {
    fn default() -> Self {
        Self::from_base_dir(".")
    }
}
