//! Columnar stores for the lambda pipeline.
//!
//! - Parquet snapshot/partition encode and decode
//! - write-to-temporary-then-rename publication
//! - the durable committed-set checkpoint

pub mod atomic;
pub mod checkpoint;
pub mod parquet;

pub use atomic::publish_bytes;
pub use checkpoint::CheckpointSet;
pub use parquet::{
    list_parquet_files, partition_schema, read_partition_dir, read_partition_file,
    read_snapshot_dir, read_snapshot_file, snapshot_schema, write_partition, write_snapshot,
};
