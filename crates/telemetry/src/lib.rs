//! Internal telemetry for the lambda pipeline.
//!
//! Structured tracing plus a small in-memory counter registry; no
//! external observability backends.

pub mod metrics;
pub mod tracing_setup;

pub use metrics::*;
pub use tracing_setup::*;
