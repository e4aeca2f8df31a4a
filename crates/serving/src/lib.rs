//! Serving layer for the lambda pipeline.
//!
//! Query-time reconciliation of the batch snapshot and speed
//! partitions into one unified relation, plus derived aggregates.

pub mod composer;
pub mod view;

pub use composer::ViewComposer;
pub use view::{Kpis, UnifiedView};
