//! Shared helpers for lambda pipeline integration tests.

pub mod fixtures;
