//! Unified error types for the lambda pipeline.
//!
//! The taxonomy mirrors the failure semantics of the three layers:
//! - `Parse`: per-record, callers log and continue, never abort
//! - `DimensionUnavailable`: fatal for the batch compactor
//! - `CheckpointCorrupt`: loud failure, never silently reset
//! - `Io`/`Parquet`: store-level failures, propagate to the caller

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the lambda pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// A single raw record failed to parse. Recoverable: the record is
    /// skipped and the failure reported, the run continues.
    #[error("parse error in {file} line {line}: {reason}")]
    Parse {
        file: String,
        line: usize,
        reason: String,
    },

    /// The dimension table could not be read. Enrichment is mandatory,
    /// so this aborts the compaction run.
    #[error("dimension table unavailable at {path}: {reason}")]
    DimensionUnavailable { path: PathBuf, reason: String },

    /// The checkpoint artifact exists but cannot be decoded. Treating
    /// everything as new would violate exactly-once partition commit,
    /// so this surfaces instead of being swallowed.
    #[error("checkpoint corrupt at {path}: {reason}")]
    CheckpointCorrupt { path: PathBuf, reason: String },

    /// A columnar file did not match the expected schema.
    #[error("schema error: {0}")]
    Schema(String),

    /// Parquet encode/decode failure.
    #[error("parquet error: {0}")]
    Parquet(String),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a per-record parse error.
    pub fn parse(file: impl Into<String>, line: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            file: file.into(),
            line,
            reason: reason.into(),
        }
    }

    pub fn dimension(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DimensionUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn checkpoint(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::CheckpointCorrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }

    pub fn parquet(msg: impl Into<String>) -> Self {
        Self::Parquet(msg.into())
    }

    /// Whether the error is contained to a single record.
    ///
    /// Recoverable errors are logged and skipped; everything else
    /// propagates to the caller, which owns retry policy.
    pub fn is_record_level(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}
