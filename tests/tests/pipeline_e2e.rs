//! End-to-end tests for the full batch + speed + serving flow over a
//! temporary data directory.

use batch_layer::{BatchCompactor, SNAPSHOT_FILE};
use columnar_store::{list_parquet_files, read_snapshot_file, CheckpointSet};
use integration_tests::fixtures::{self, TestPipeline};
use pipeline_core::coerce::parse_raw_timestamp;
use serving_layer::ViewComposer;
use speed_layer::StreamCommitter;

/// The canonical reconciliation example: a duplicated batch
/// transaction deduped to its latest version and enriched, plus a
/// stream transaction visible with null enrichment.
#[test]
fn test_full_pipeline_flow() {
    let pipeline = TestPipeline::new();

    pipeline.write_batch_file(
        "history.json",
        &[
            fixtures::batch_transaction("T1", 1, 100.0, "2024-01-01 10:00:00"),
            fixtures::batch_transaction("T1", 1, 120.0, "2024-01-01 11:00:00"),
            fixtures::batch_transaction("T2", 2, 50.0, "2024-01-02 09:00:00"),
        ],
    );
    pipeline.write_stream_file(
        "events_0.json",
        &[
            fixtures::stream_transaction("S1", 3, 30.0, "2024-01-03 08:00:00"),
            fixtures::stream_transaction("S2", 99, 70.0, "2024-01-03 08:01:00"),
        ],
    );

    // Batch layer
    let summary = BatchCompactor::new(pipeline.layout.clone()).run().unwrap();
    assert_eq!(summary.raw_records, 3);
    assert_eq!(summary.snapshot_rows, 2);

    // Speed layer
    let cycle = StreamCommitter::new(pipeline.layout.clone())
        .run_cycle()
        .unwrap();
    assert_eq!(cycle.committed, 1);
    assert_eq!(cycle.records, 2);

    // Serving layer
    let composer = ViewComposer::new(pipeline.layout.clone());
    let view = composer.unified_view().unwrap().expect("view present");
    assert_eq!(view.len(), 4);

    let t1 = view
        .rows()
        .iter()
        .find(|r| r.transaction_id == "T1")
        .unwrap();
    assert_eq!(t1.timestamp, parse_raw_timestamp("2024-01-01 11:00:00"));
    assert_eq!(t1.amount, Some(120.0));
    assert_eq!(t1.user_name.as_deref(), Some("Alice"));
    assert_eq!(t1.region.as_deref(), Some("US"));

    // Speed rows reach the view without enrichment, even for known users.
    let s1 = view
        .rows()
        .iter()
        .find(|r| r.transaction_id == "S1")
        .unwrap();
    assert_eq!(s1.user_name, None);
    assert_eq!(s1.status.as_deref(), Some("PENDING"));

    let kpis = composer.kpis().unwrap();
    assert_eq!(kpis.transaction_count, 4);
    assert_eq!(kpis.total_sales, 120.0 + 50.0 + 30.0 + 70.0);

    let recent = composer.recent(2).unwrap();
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].transaction_id, "S2");
    assert_eq!(recent[1].transaction_id, "S1");
}

/// Dedup contract: k records sharing one transaction_id collapse to
/// exactly one snapshot row carrying the maximum timestamp.
#[test]
fn test_batch_dedup_keeps_latest_of_k() {
    let pipeline = TestPipeline::new();
    pipeline.write_batch_file(
        "history.json",
        &[
            fixtures::batch_transaction("DUP", 1, 10.0, "2024-01-01 08:00:00"),
            fixtures::batch_transaction("DUP", 1, 20.0, "2024-01-01 12:00:00"),
            fixtures::batch_transaction("DUP", 1, 30.0, "2024-01-01 10:00:00"),
        ],
    );

    BatchCompactor::new(pipeline.layout.clone()).run().unwrap();

    let rows = read_snapshot_file(&pipeline.layout.snapshot_dir.join(SNAPSHOT_FILE)).unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].timestamp, parse_raw_timestamp("2024-01-01 12:00:00"));
    assert_eq!(rows[0].amount, Some(20.0));
}

/// Committer idempotence: a second cycle with no new files writes
/// zero partitions and leaves the checkpoint byte-identical.
#[test]
fn test_committer_idempotent_across_cycles() {
    let pipeline = TestPipeline::new();
    pipeline.write_stream_file(
        "events_f1.json",
        &[
            fixtures::stream_transaction("A", 1, 1.0, "2024-01-05 10:00:00"),
            fixtures::stream_transaction("B", 2, 2.0, "2024-01-05 10:00:05"),
        ],
    );

    let committer = StreamCommitter::new(pipeline.layout.clone());

    let first = committer.run_cycle().unwrap();
    assert_eq!(first.committed, 1);
    let checkpoint = CheckpointSet::load(&pipeline.layout.checkpoint_path).unwrap();
    assert!(checkpoint.contains("events_f1.json"));
    assert_eq!(checkpoint.len(), 1);

    let second = committer.run_cycle().unwrap();
    assert!(second.is_noop());
    assert_eq!(
        list_parquet_files(&pipeline.layout.partition_dir)
            .unwrap()
            .len(),
        1
    );
    assert_eq!(
        CheckpointSet::load(&pipeline.layout.checkpoint_path)
            .unwrap()
            .len(),
        1
    );
}

/// Compaction re-runs replace the snapshot wholesale; stale rows from
/// the previous run never leak through the serving layer.
#[test]
fn test_snapshot_replacement_visible_in_view() {
    let pipeline = TestPipeline::new();
    pipeline.write_batch_file(
        "history.json",
        &[fixtures::batch_transaction("OLD", 1, 1.0, "2024-01-01 10:00:00")],
    );
    BatchCompactor::new(pipeline.layout.clone()).run().unwrap();

    pipeline.write_batch_file(
        "history.json",
        &[fixtures::batch_transaction("NEW", 2, 2.0, "2024-01-02 10:00:00")],
    );
    BatchCompactor::new(pipeline.layout.clone()).run().unwrap();

    let composer = ViewComposer::new(pipeline.layout.clone());
    let view = composer.unified_view().unwrap().unwrap();
    assert_eq!(view.len(), 1);
    assert_eq!(view.rows()[0].transaction_id, "NEW");
}

/// Null-heavy records survive the whole pipeline without erroring.
#[test]
fn test_null_values_flow_through() {
    let pipeline = TestPipeline::new();
    pipeline.write_batch_file(
        "nulls.json",
        &[r#"{"transaction_id":"NULL_VAL","user_id":1,"product":null,"amount":null,"timestamp":"2024-01-01 10:00:00","status":"C"}"#.to_string()],
    );

    BatchCompactor::new(pipeline.layout.clone()).run().unwrap();

    let composer = ViewComposer::new(pipeline.layout.clone());
    let view = composer.unified_view().unwrap().unwrap();
    let row = view
        .rows()
        .iter()
        .find(|r| r.transaction_id == "NULL_VAL")
        .unwrap();
    assert_eq!(row.product, None);
    assert_eq!(row.amount, None);
    // Enrichment still applies: user_id 1 is Alice.
    assert_eq!(row.user_name.as_deref(), Some("Alice"));

    let kpis = composer.kpis().unwrap();
    assert_eq!(kpis.transaction_count, 1);
    assert_eq!(kpis.total_sales, 0.0);
    assert_eq!(kpis.avg_order_value, 0.0);
}
