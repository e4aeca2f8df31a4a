//! Stream committer.
//!
//! Each cycle discovers raw stream files not yet in the checkpoint
//! set, transforms each into exactly one immutable output partition,
//! and persists the grown checkpoint once every file in the cycle has
//! been handled. Partition writes are idempotent overwrites by name,
//! so a crash between a partition write and the checkpoint persist
//! costs at most one re-processing, never data loss.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use columnar_store::{write_partition, CheckpointSet};
use pipeline_core::{
    coerce::parse_record_line, now_millis, Error, Result, StoreLayout, TransactionRecord,
};
use telemetry::metrics;

/// Outcome of one commit cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    /// New files discovered this cycle.
    pub discovered: usize,
    /// Files committed to partitions and checkpointed.
    pub committed: usize,
    /// Files that failed to parse; retried next cycle.
    pub failed: usize,
    /// Records written across committed partitions.
    pub records: usize,
}

impl CycleSummary {
    pub fn is_noop(&self) -> bool {
        self.discovered == 0
    }
}

/// Incrementally commits raw stream files into speed partitions.
pub struct StreamCommitter {
    layout: StoreLayout,
}

impl StreamCommitter {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    /// Run one commit cycle to completion.
    ///
    /// Not preemptible: cancellation belongs between cycles, in the
    /// scheduler. A file that fails to parse is skipped and left out
    /// of the checkpoint; a partition write failure aborts the cycle
    /// with the checkpoint still at its pre-cycle state.
    pub fn run_cycle(&self) -> Result<CycleSummary> {
        let mut checkpoint = CheckpointSet::load(&self.layout.checkpoint_path)?;
        let new_files = self.discover_new(&checkpoint)?;

        if new_files.is_empty() {
            debug!("No new stream files, cycle is a no-op");
            return Ok(CycleSummary::default());
        }

        let mut summary = CycleSummary {
            discovered: new_files.len(),
            ..CycleSummary::default()
        };
        let processed_at = now_millis();

        for file_name in &new_files {
            let records = match self.load_records(file_name) {
                Ok(records) => records,
                Err(e) => {
                    summary.failed += 1;
                    warn!(
                        file = %file_name,
                        error = %e,
                        "Stream file failed to parse, excluded from checkpoint"
                    );
                    continue;
                }
            };

            let rows: Vec<_> = records
                .into_iter()
                .map(|r| r.into_speed(processed_at))
                .collect();
            write_partition(&self.partition_path(file_name), &rows)?;

            checkpoint.insert(file_name.clone());
            summary.committed += 1;
            summary.records += rows.len();
        }

        // One atomic checkpoint persist per cycle, after every
        // partition of the cycle is durable.
        if summary.committed > 0 {
            checkpoint.persist()?;
        }

        metrics().commit_cycles.inc();
        metrics().partitions_written.inc_by(summary.committed as u64);
        metrics()
            .stream_records_committed
            .inc_by(summary.records as u64);
        metrics().stream_files_failed.inc_by(summary.failed as u64);

        info!(
            discovered = summary.discovered,
            committed = summary.committed,
            failed = summary.failed,
            records = summary.records,
            "Commit cycle complete"
        );
        Ok(summary)
    }

    /// Files present in the stream directory but not yet committed,
    /// sorted by name. An absent directory is an empty discovery.
    fn discover_new(&self, checkpoint: &CheckpointSet) -> Result<Vec<String>> {
        let dir = &self.layout.raw_stream_dir;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut new_files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.extension().is_some_and(|ext| ext == "json") {
                continue;
            }
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if !checkpoint.contains(name) {
                    new_files.push(name.to_string());
                }
            }
        }
        new_files.sort();
        Ok(new_files)
    }

    /// Parse one raw stream file permissively.
    ///
    /// Malformed lines are skipped; an unreadable file, or a non-empty
    /// file yielding zero valid records, is a file-level failure.
    fn load_records(&self, file_name: &str) -> Result<Vec<TransactionRecord>> {
        let path = self.layout.raw_stream_dir.join(file_name);
        let reader = BufReader::new(fs::File::open(&path)?);

        let mut records = Vec::new();
        let mut lines = 0usize;
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            lines += 1;
            match parse_record_line(&line, file_name, idx + 1) {
                Ok(record) => records.push(record),
                Err(e) => warn!(error = %e, "Skipping malformed stream record"),
            }
        }

        if records.is_empty() && lines > 0 {
            return Err(Error::parse(file_name, 0, "no valid records in file"));
        }
        Ok(records)
    }

    /// One partition per input file: `events_3.json` maps to
    /// `speed_events_3.parquet`.
    pub fn partition_path(&self, file_name: &str) -> PathBuf {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_string());
        self.layout.partition_dir.join(format!("speed_{stem}.parquet"))
    }
}
