//! Record type definitions for the lambda pipeline.

use serde::{Deserialize, Serialize};

/// A raw transaction record after permissive coercion.
///
/// `transaction_id` is the only required field; every other field is
/// nulled when missing or unparseable so that one bad field never
/// drops a record, and one bad record never aborts a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub user_id: Option<i64>,
    pub product: Option<String>,
    pub amount: Option<f64>,
    /// Event timestamp, epoch milliseconds.
    pub timestamp: Option<i64>,
    pub status: Option<String>,
}

/// A row of the batch snapshot, and of the unified view.
///
/// Carries the full fixed column set of the serving layer. Speed rows
/// projected into the unified view leave `user_name`/`region` null:
/// enrichment is batch-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRecord {
    pub transaction_id: String,
    pub user_id: Option<i64>,
    pub product: Option<String>,
    pub amount: Option<f64>,
    /// Event timestamp, epoch milliseconds.
    pub timestamp: Option<i64>,
    pub status: Option<String>,
    pub user_name: Option<String>,
    pub region: Option<String>,
    /// Wall-clock time the row was produced, epoch milliseconds.
    pub processed_at: i64,
}

/// A row of a speed partition.
///
/// Same shape as the raw record with the event timestamp renamed to
/// `event_time`, distinct from the `processed_at` commit time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedRecord {
    pub transaction_id: String,
    pub user_id: Option<i64>,
    pub product: Option<String>,
    pub amount: Option<f64>,
    /// Event timestamp, epoch milliseconds.
    pub event_time: Option<i64>,
    pub status: Option<String>,
    /// Wall-clock time the row was committed, epoch milliseconds.
    pub processed_at: i64,
}

impl TransactionRecord {
    /// Enrich with an optional dimension match, stamping `processed_at`.
    pub fn enrich(self, dimension: Option<&UserDimension>, processed_at: i64) -> EnrichedRecord {
        EnrichedRecord {
            transaction_id: self.transaction_id,
            user_id: self.user_id,
            product: self.product,
            amount: self.amount,
            timestamp: self.timestamp,
            status: self.status,
            user_name: dimension.map(|d| d.name.clone()),
            region: dimension.map(|d| d.region.clone()),
            processed_at,
        }
    }

    /// Convert into a speed partition row, stamping `processed_at`.
    pub fn into_speed(self, processed_at: i64) -> SpeedRecord {
        SpeedRecord {
            transaction_id: self.transaction_id,
            user_id: self.user_id,
            product: self.product,
            amount: self.amount,
            event_time: self.timestamp,
            status: self.status,
            processed_at,
        }
    }
}

impl SpeedRecord {
    /// Project into the unified view column set.
    ///
    /// `event_time` maps back to `timestamp`; enrichment columns stay
    /// null because the speed path performs no dimension join.
    pub fn into_unified(self) -> EnrichedRecord {
        EnrichedRecord {
            transaction_id: self.transaction_id,
            user_id: self.user_id,
            product: self.product,
            amount: self.amount,
            timestamp: self.event_time,
            status: self.status,
            user_name: None,
            region: None,
            processed_at: self.processed_at,
        }
    }
}

/// A row of the reference user dimension table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDimension {
    pub user_id: i64,
    pub name: String,
    pub region: String,
    pub signup_date: String,
}
