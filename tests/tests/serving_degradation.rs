//! Serving layer degradation: the unified view keeps its contract
//! with zero, one, or two populated sources.

use batch_layer::BatchCompactor;
use integration_tests::fixtures::{self, TestPipeline};
use serving_layer::{UnifiedView, ViewComposer};
use speed_layer::StreamCommitter;

#[test]
fn test_no_sources_view_absent_kpis_zero() {
    let pipeline = TestPipeline::new();
    let composer = ViewComposer::new(pipeline.layout.clone());

    assert!(composer.unified_view().unwrap().is_none());

    let kpis = composer.kpis().unwrap();
    assert_eq!(kpis.total_sales, 0.0);
    assert_eq!(kpis.transaction_count, 0);
    assert_eq!(kpis.avg_order_value, 0.0);
    assert!(composer.recent(10).unwrap().is_empty());
}

#[test]
fn test_batch_only() {
    let pipeline = TestPipeline::new();
    pipeline.write_batch_file(
        "history.json",
        &[fixtures::batch_transaction("B1", 1, 10.0, "2024-01-01 10:00:00")],
    );
    BatchCompactor::new(pipeline.layout.clone()).run().unwrap();

    let composer = ViewComposer::new(pipeline.layout.clone());
    let view = composer.unified_view().unwrap().expect("batch-only view");
    assert_eq!(view.len(), 1);
    assert_eq!(view.rows()[0].user_name.as_deref(), Some("Alice"));
}

#[test]
fn test_speed_only() {
    let pipeline = TestPipeline::new();
    pipeline.write_stream_file(
        "events_0.json",
        &[fixtures::stream_transaction("S1", 2, 20.0, "2024-01-02 10:00:00")],
    );
    StreamCommitter::new(pipeline.layout.clone())
        .run_cycle()
        .unwrap();

    let composer = ViewComposer::new(pipeline.layout.clone());
    let view = composer.unified_view().unwrap().expect("speed-only view");
    assert_eq!(view.len(), 1);

    // Same column set as a batch-backed view; enrichment is just null.
    let row = &view.rows()[0];
    assert_eq!(row.user_name, None);
    assert_eq!(row.region, None);
    assert!(row.timestamp.is_some());
    assert_eq!(UnifiedView::COLUMNS.len(), 9);
}

#[test]
fn test_both_sources_union() {
    let pipeline = TestPipeline::new();
    pipeline.write_batch_file(
        "history.json",
        &[fixtures::batch_transaction("B1", 1, 10.0, "2024-01-01 10:00:00")],
    );
    pipeline.write_stream_file(
        "events_0.json",
        &[fixtures::stream_transaction("S1", 2, 20.0, "2024-01-02 10:00:00")],
    );
    BatchCompactor::new(pipeline.layout.clone()).run().unwrap();
    StreamCommitter::new(pipeline.layout.clone())
        .run_cycle()
        .unwrap();

    let composer = ViewComposer::new(pipeline.layout.clone());
    let view = composer.unified_view().unwrap().unwrap();
    assert_eq!(view.len(), 2);

    let kpis = composer.kpis().unwrap();
    assert_eq!(kpis.total_sales, 30.0);
    assert_eq!(kpis.transaction_count, 2);
    assert_eq!(kpis.avg_order_value, 15.0);

    // Speed always newer than the batch horizon, so it leads recent().
    let recent = composer.recent(1).unwrap();
    assert_eq!(recent[0].transaction_id, "S1");
}
