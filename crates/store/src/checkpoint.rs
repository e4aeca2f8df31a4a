//! Durable committed-set checkpoint for the stream committer.
//!
//! The checkpoint records which raw stream files have already been
//! committed to partitions. It only ever grows during normal
//! operation: entries are added after their partition write succeeds
//! and never removed. Persistence is atomic, so a crash mid-cycle
//! leaves the previous checkpoint intact and at worst causes
//! re-processing, never silent loss.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use pipeline_core::{Error, Result};

use crate::atomic::publish_bytes;

const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CheckpointFile {
    version: u32,
    committed: BTreeSet<String>,
}

/// Set of raw stream file names already committed.
#[derive(Debug, Clone, Default)]
pub struct CheckpointSet {
    path: PathBuf,
    committed: BTreeSet<String>,
}

impl CheckpointSet {
    /// Load the checkpoint from disk.
    ///
    /// A missing file is a fresh pipeline and loads as the empty set.
    /// An unreadable or undecodable file is `CheckpointCorrupt`:
    /// treating it as empty would re-commit every historical file.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self {
                path,
                committed: BTreeSet::new(),
            });
        }

        let raw = fs::read_to_string(&path)
            .map_err(|e| Error::checkpoint(&path, format!("unreadable: {e}")))?;
        let file: CheckpointFile = serde_json::from_str(&raw)
            .map_err(|e| Error::checkpoint(&path, format!("undecodable: {e}")))?;
        if file.version != CHECKPOINT_VERSION {
            return Err(Error::checkpoint(
                &path,
                format!("unsupported version {}", file.version),
            ));
        }

        Ok(Self {
            path,
            committed: file.committed,
        })
    }

    /// Persist the set atomically to its backing path.
    pub fn persist(&self) -> Result<()> {
        let file = CheckpointFile {
            version: CHECKPOINT_VERSION,
            committed: self.committed.clone(),
        };
        let bytes = serde_json::to_vec_pretty(&file)?;
        publish_bytes(&self.path, &bytes)
    }

    pub fn contains(&self, file_name: &str) -> bool {
        self.committed.contains(file_name)
    }

    /// Record a file as committed. In-memory only until [`persist`].
    ///
    /// [`persist`]: CheckpointSet::persist
    pub fn insert(&mut self, file_name: impl Into<String>) {
        self.committed.insert(file_name.into());
    }

    pub fn len(&self) -> usize {
        self.committed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.committed.is_empty()
    }

    /// Committed file names in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.committed.iter().map(String::as_str)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cp = CheckpointSet::load(dir.path().join("speed_checkpoint.json")).unwrap();
        assert!(cp.is_empty());
    }

    #[test]
    fn test_persist_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speed_checkpoint.json");

        let mut cp = CheckpointSet::load(&path).unwrap();
        cp.insert("events_0.json");
        cp.insert("events_1.json");
        cp.persist().unwrap();

        let reloaded = CheckpointSet::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains("events_0.json"));
        assert!(reloaded.contains("events_1.json"));
    }

    #[test]
    fn test_monotonic_growth_across_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speed_checkpoint.json");

        let mut cp = CheckpointSet::load(&path).unwrap();
        cp.insert("f1");
        cp.persist().unwrap();
        let first: Vec<String> = CheckpointSet::load(&path)
            .unwrap()
            .iter()
            .map(String::from)
            .collect();

        let mut cp = CheckpointSet::load(&path).unwrap();
        cp.insert("f2");
        cp.persist().unwrap();
        let second = CheckpointSet::load(&path).unwrap();

        for name in &first {
            assert!(second.contains(name), "checkpoint shrank: lost {name}");
        }
    }

    #[test]
    fn test_corrupt_file_fails_loudly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speed_checkpoint.json");
        fs::write(&path, "not json at all").unwrap();

        let err = CheckpointSet::load(&path).unwrap_err();
        assert!(matches!(err, Error::CheckpointCorrupt { .. }));
    }

    #[test]
    fn test_unknown_version_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("speed_checkpoint.json");
        fs::write(&path, r#"{"version": 99, "committed": []}"#).unwrap();

        let err = CheckpointSet::load(&path).unwrap_err();
        assert!(matches!(err, Error::CheckpointCorrupt { .. }));
    }
}
