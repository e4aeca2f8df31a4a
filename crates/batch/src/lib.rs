//! Batch layer for the lambda pipeline.
//!
//! Periodically rebuilds the corrected, enriched snapshot from the
//! full raw history.

pub mod compactor;

pub use compactor::{BatchCompactor, CompactionSummary, SNAPSHOT_FILE};
