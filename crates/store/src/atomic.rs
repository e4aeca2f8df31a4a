//! Atomic file publication.
//!
//! Every durable artifact (snapshot, partition, checkpoint) is
//! written to a temporary file in the destination directory and then
//! renamed into place, so concurrent readers never observe a partial
//! write. Rename is atomic only within a filesystem, hence the
//! temporary file lives next to its target.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use pipeline_core::{Error, Result};

/// Write `bytes` to `path` atomically, creating parent directories.
pub fn publish_bytes(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::schema(format!("output path {} has no parent", path.display())))?;
    fs::create_dir_all(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
