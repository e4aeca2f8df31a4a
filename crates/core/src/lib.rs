//! Core types, coercion, and configuration for the lambda pipeline.

pub mod coerce;
pub mod config;
pub mod dimension;
pub mod error;
pub mod record;

pub use config::StoreLayout;
pub use dimension::DimensionTable;
pub use error::{Error, Result};
pub use record::*;

/// Current wall-clock time as epoch milliseconds, for `processed_at`
/// stamping.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
