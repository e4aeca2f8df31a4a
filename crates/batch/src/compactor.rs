//! Batch compactor.
//!
//! Rebuilds the full deduplicated, enriched snapshot from every raw
//! batch dump file plus the user dimension table. The snapshot is
//! rebuilt from scratch on each run and published atomically, fully
//! replacing the previous one; there is no incremental merge.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use tracing::{debug, info, warn};

use columnar_store::write_snapshot;
use pipeline_core::{
    coerce::parse_record_line, now_millis, DimensionTable, Result, StoreLayout, TransactionRecord,
};
use telemetry::metrics;

/// File name of the published snapshot inside the snapshot directory.
pub const SNAPSHOT_FILE: &str = "batch_data.parquet";

/// Outcome of one compaction run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactionSummary {
    /// Raw records scanned across all dump files.
    pub raw_records: usize,
    /// Malformed records skipped.
    pub malformed: usize,
    /// Rows in the published snapshot.
    pub snapshot_rows: usize,
    /// Snapshot rows that matched a dimension row.
    pub dimension_matches: usize,
}

/// Rebuilds the batch snapshot from the raw history.
pub struct BatchCompactor {
    layout: StoreLayout,
}

impl BatchCompactor {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    /// Run one full compaction.
    ///
    /// Per-record failures are skipped; a missing raw batch directory
    /// yields an empty snapshot. Only an unreadable dimension table or
    /// a snapshot write failure aborts the run, and an aborted run
    /// leaves the previous snapshot untouched.
    pub fn run(&self) -> Result<CompactionSummary> {
        info!(
            raw_batch_dir = %self.layout.raw_batch_dir.display(),
            "Starting batch compaction"
        );

        // Enrichment is mandatory: load the dimension table before
        // touching the raw history so a bad table aborts early.
        let (dimension, dim_skipped) = DimensionTable::load(&self.layout.dimension_path)?;
        if dim_skipped > 0 {
            warn!(
                skipped = dim_skipped,
                path = %self.layout.dimension_path.display(),
                "Skipped undecodable dimension rows"
            );
        }

        let (records, raw_records, malformed) = self.scan_raw_history()?;
        let survivors = dedupe_latest(records);

        let processed_at = now_millis();
        let mut dimension_matches = 0usize;
        let rows: Vec<_> = survivors
            .into_iter()
            .map(|rec| {
                let dim = rec.user_id.and_then(|id| dimension.get(id));
                if dim.is_some() {
                    dimension_matches += 1;
                }
                rec.enrich(dim, processed_at)
            })
            .collect();

        write_snapshot(&self.layout.snapshot_dir.join(SNAPSHOT_FILE), &rows)?;

        let summary = CompactionSummary {
            raw_records,
            malformed,
            snapshot_rows: rows.len(),
            dimension_matches,
        };

        metrics().compaction_runs.inc();
        metrics().raw_records_scanned.inc_by(raw_records as u64);
        metrics().records_malformed.inc_by(malformed as u64);
        metrics().snapshot_rows_written.inc_by(rows.len() as u64);

        info!(
            raw_records = summary.raw_records,
            malformed = summary.malformed,
            snapshot_rows = summary.snapshot_rows,
            dimension_matches = summary.dimension_matches,
            "Batch compaction complete"
        );
        Ok(summary)
    }

    /// Scan every raw dump file, in sorted file order, line by line.
    ///
    /// Returns (records, raw scanned, malformed skipped). Scan order
    /// is deterministic so dedup tie-breaking is too.
    fn scan_raw_history(&self) -> Result<(Vec<TransactionRecord>, usize, usize)> {
        let mut records = Vec::new();
        let mut raw_records = 0usize;
        let mut malformed = 0usize;

        for path in self.list_dump_files()? {
            let file_name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let reader = BufReader::new(fs::File::open(&path)?);

            for (idx, line) in reader.lines().enumerate() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                raw_records += 1;
                match parse_record_line(&line, &file_name, idx + 1) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        malformed += 1;
                        warn!(error = %e, "Skipping malformed batch record");
                    }
                }
            }
        }

        Ok((records, raw_records, malformed))
    }

    fn list_dump_files(&self) -> Result<Vec<PathBuf>> {
        let dir = &self.layout.raw_batch_dir;
        if !dir.exists() {
            debug!(dir = %dir.display(), "Raw batch directory absent, treating as empty");
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

/// Keep one record per `transaction_id`: the one with the maximum
/// timestamp. A null timestamp loses to any timestamped record; exact
/// ties keep the earliest record in scan order. Survivor order follows
/// the winning records' original positions.
fn dedupe_latest(records: Vec<TransactionRecord>) -> Vec<TransactionRecord> {
    let mut best: HashMap<String, usize> = HashMap::with_capacity(records.len());
    for (idx, rec) in records.iter().enumerate() {
        match best.entry(rec.transaction_id.clone()) {
            Entry::Vacant(slot) => {
                slot.insert(idx);
            }
            Entry::Occupied(mut slot) => {
                // Option<i64> orders None below any Some, so strictly
                // greater means a real, newer timestamp.
                if rec.timestamp > records[*slot.get()].timestamp {
                    slot.insert(idx);
                }
            }
        }
    }

    let chosen: HashSet<usize> = best.into_values().collect();
    records
        .into_iter()
        .enumerate()
        .filter(|(idx, _)| chosen.contains(idx))
        .map(|(_, rec)| rec)
        .collect()
}
