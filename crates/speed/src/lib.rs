//! Speed layer for the lambda pipeline.
//!
//! Low-latency incremental commit of newly arrived raw stream files
//! into immutable partitions, tracked by a durable checkpoint.

pub mod committer;
pub mod scheduler;

pub use committer::{CycleSummary, StreamCommitter};
pub use scheduler::{run_committer, CommitterConfig};
