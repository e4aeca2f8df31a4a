//! The unified relation and its derived aggregates.

use serde::{Deserialize, Serialize};

use pipeline_core::EnrichedRecord;

/// One logical relation over batch and speed rows.
///
/// The column set is fixed regardless of which sources were populated;
/// an all-speed view still carries (null) `user_name`/`region`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedView {
    rows: Vec<EnrichedRecord>,
}

/// Derived aggregates over the unified view.
///
/// All fields are defined zero-values on empty input: never NaN,
/// never an error.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    pub total_sales: f64,
    pub transaction_count: u64,
    pub avg_order_value: f64,
}

impl UnifiedView {
    /// The fixed serving-layer column set.
    pub const COLUMNS: [&'static str; 9] = [
        "transaction_id",
        "user_id",
        "product",
        "amount",
        "timestamp",
        "status",
        "user_name",
        "region",
        "processed_at",
    ];

    pub fn new(rows: Vec<EnrichedRecord>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[EnrichedRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Aggregate KPIs with SQL semantics: sum and mean ignore null
    /// amounts, count counts every row.
    pub fn kpis(&self) -> Kpis {
        let transaction_count = self.rows.len() as u64;
        let amounts: Vec<f64> = self.rows.iter().filter_map(|r| r.amount).collect();
        let total_sales: f64 = amounts.iter().sum();
        let avg_order_value = if amounts.is_empty() {
            0.0
        } else {
            total_sales / amounts.len() as f64
        };
        Kpis {
            total_sales,
            transaction_count,
            avg_order_value,
        }
    }

    /// The `limit` most recent rows by event timestamp, newest first.
    ///
    /// The sort is stable, so equal timestamps keep their view order;
    /// rows without a timestamp sort last.
    pub fn recent(&self, limit: usize) -> Vec<EnrichedRecord> {
        let mut rows = self.rows.clone();
        rows.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        rows.truncate(limit);
        rows
    }
}
