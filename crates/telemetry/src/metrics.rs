//! Internal metrics collection.
//!
//! Counters accumulate in-memory across compaction runs and commit
//! cycles; the binary logs a snapshot on shutdown. No external
//! metrics system is involved.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// A counter metric.
#[derive(Debug, Default)]
pub struct Counter(AtomicU64);

impl Counter {
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    pub fn inc(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_by(&self, n: u64) {
        self.0.fetch_add(n, Ordering::Relaxed);
    }

    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn reset(&self) -> u64 {
        self.0.swap(0, Ordering::Relaxed)
    }
}

/// Collected metrics for the lambda pipeline.
#[derive(Debug, Default)]
pub struct Metrics {
    // Batch layer
    pub raw_records_scanned: Counter,
    pub records_malformed: Counter,
    pub snapshot_rows_written: Counter,
    pub compaction_runs: Counter,

    // Speed layer
    pub commit_cycles: Counter,
    pub partitions_written: Counter,
    pub stream_records_committed: Counter,
    pub stream_files_failed: Counter,

    // Serving layer
    pub view_queries: Counter,
}

impl Metrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a snapshot of current metrics.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            timestamp: Utc::now(),
            raw_records_scanned: self.raw_records_scanned.get(),
            records_malformed: self.records_malformed.get(),
            snapshot_rows_written: self.snapshot_rows_written.get(),
            compaction_runs: self.compaction_runs.get(),
            commit_cycles: self.commit_cycles.get(),
            partitions_written: self.partitions_written.get(),
            stream_records_committed: self.stream_records_committed.get(),
            stream_files_failed: self.stream_files_failed.get(),
            view_queries: self.view_queries.get(),
        }
    }
}

/// A snapshot of metrics at a point in time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub timestamp: DateTime<Utc>,
    pub raw_records_scanned: u64,
    pub records_malformed: u64,
    pub snapshot_rows_written: u64,
    pub compaction_runs: u64,
    pub commit_cycles: u64,
    pub partitions_written: u64,
    pub stream_records_committed: u64,
    pub stream_files_failed: u64,
    pub view_queries: u64,
}

/// Global metrics registry.
pub static METRICS: std::sync::LazyLock<Metrics> = std::sync::LazyLock::new(Metrics::new);

/// Get the global metrics instance.
pub fn metrics() -> &'static Metrics {
    &METRICS
}
