//! Unified view composer.
//!
//! Stateless, read-only reconciliation of the batch snapshot and the
//! speed partitions into one logical relation with a fixed column
//! set. The view is recomputed per query and never persisted. Batch
//! and speed rows are assumed disjoint by arrival-time partitioning;
//! no cross-source dedup is performed.

use tracing::debug;

use columnar_store::{list_parquet_files, read_partition_dir, read_snapshot_dir};
use pipeline_core::{EnrichedRecord, Result, StoreLayout};
use telemetry::metrics;

use crate::view::{Kpis, UnifiedView};

/// Query-time composer over the batch and speed stores.
pub struct ViewComposer {
    layout: StoreLayout,
}

impl ViewComposer {
    pub fn new(layout: StoreLayout) -> Self {
        Self { layout }
    }

    /// Compose the unified view from whichever sources are populated.
    ///
    /// Batch rows carry the full column set; speed rows are projected
    /// into it with `event_time` as `timestamp` and null enrichment.
    /// Returns `None` when neither store has any file.
    pub fn unified_view(&self) -> Result<Option<UnifiedView>> {
        metrics().view_queries.inc();

        let has_batch = !list_parquet_files(&self.layout.snapshot_dir)?.is_empty();
        let has_speed = !list_parquet_files(&self.layout.partition_dir)?.is_empty();

        if !has_batch && !has_speed {
            debug!("No batch snapshot and no speed partitions, view is absent");
            return Ok(None);
        }

        let mut rows: Vec<EnrichedRecord> = Vec::new();
        if has_batch {
            rows.extend(read_snapshot_dir(&self.layout.snapshot_dir)?);
        }
        if has_speed {
            let speed = read_partition_dir(&self.layout.partition_dir)?;
            rows.extend(speed.into_iter().map(|r| r.into_unified()));
        }

        debug!(
            rows = rows.len(),
            has_batch, has_speed, "Composed unified view"
        );
        Ok(Some(UnifiedView::new(rows)))
    }

    /// Derived KPIs over the unified view; all zeros when the view is
    /// absent or empty, never an error.
    pub fn kpis(&self) -> Result<Kpis> {
        Ok(match self.unified_view()? {
            Some(view) => view.kpis(),
            None => Kpis::default(),
        })
    }

    /// Most recent transactions by event timestamp, newest first.
    /// Size is `min(limit, available)`; empty when the view is absent.
    pub fn recent(&self, limit: usize) -> Result<Vec<EnrichedRecord>> {
        Ok(match self.unified_view()? {
            Some(view) => view.recent(limit),
            None => Vec::new(),
        })
    }
}
