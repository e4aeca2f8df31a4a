//! Parquet encoding and decoding for the batch snapshot and speed
//! partition stores.
//!
//! The schemas here are the serving-layer contract: the snapshot
//! carries the full unified column set, partitions carry the raw
//! fields with `timestamp` renamed `event_time`. Timestamps are
//! stored as `Int64` epoch milliseconds.

use std::fs::{self, File};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Array, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;

use pipeline_core::{EnrichedRecord, Error, Result, SpeedRecord};

use crate::atomic::publish_bytes;

/// Schema of `batch_data.parquet` snapshot files.
pub fn snapshot_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("transaction_id", DataType::Utf8, false),
        Field::new("user_id", DataType::Int64, true),
        Field::new("product", DataType::Utf8, true),
        Field::new("amount", DataType::Float64, true),
        Field::new("timestamp", DataType::Int64, true),
        Field::new("status", DataType::Utf8, true),
        Field::new("user_name", DataType::Utf8, true),
        Field::new("region", DataType::Utf8, true),
        Field::new("processed_at", DataType::Int64, false),
    ]))
}

/// Schema of `speed_*.parquet` partition files.
pub fn partition_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("transaction_id", DataType::Utf8, false),
        Field::new("user_id", DataType::Int64, true),
        Field::new("product", DataType::Utf8, true),
        Field::new("amount", DataType::Float64, true),
        Field::new("event_time", DataType::Int64, true),
        Field::new("status", DataType::Utf8, true),
        Field::new("processed_at", DataType::Int64, false),
    ]))
}

fn writer_properties() -> WriterProperties {
    WriterProperties::builder().build()
}

fn encode_single_batch(schema: Arc<Schema>, batch: &RecordBatch) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::<u8>::new());
    let mut writer = ArrowWriter::try_new(&mut cursor, schema, Some(writer_properties()))
        .map_err(|e| Error::parquet(format!("writer init failed: {e}")))?;
    writer
        .write(batch)
        .map_err(|e| Error::parquet(format!("write failed: {e}")))?;
    writer
        .close()
        .map_err(|e| Error::parquet(format!("close failed: {e}")))?;
    Ok(cursor.into_inner())
}

fn snapshot_batch(rows: &[EnrichedRecord]) -> Result<RecordBatch> {
    let schema = snapshot_schema();
    let transaction_ids = StringArray::from(
        rows.iter()
            .map(|r| Some(r.transaction_id.as_str()))
            .collect::<Vec<_>>(),
    );
    let user_ids = Int64Array::from(rows.iter().map(|r| r.user_id).collect::<Vec<_>>());
    let products = StringArray::from(rows.iter().map(|r| r.product.as_deref()).collect::<Vec<_>>());
    let amounts = Float64Array::from(rows.iter().map(|r| r.amount).collect::<Vec<_>>());
    let timestamps = Int64Array::from(rows.iter().map(|r| r.timestamp).collect::<Vec<_>>());
    let statuses = StringArray::from(rows.iter().map(|r| r.status.as_deref()).collect::<Vec<_>>());
    let user_names = StringArray::from(
        rows.iter()
            .map(|r| r.user_name.as_deref())
            .collect::<Vec<_>>(),
    );
    let regions = StringArray::from(rows.iter().map(|r| r.region.as_deref()).collect::<Vec<_>>());
    let processed_ats = Int64Array::from(rows.iter().map(|r| r.processed_at).collect::<Vec<_>>());

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(transaction_ids),
            Arc::new(user_ids),
            Arc::new(products),
            Arc::new(amounts),
            Arc::new(timestamps),
            Arc::new(statuses),
            Arc::new(user_names),
            Arc::new(regions),
            Arc::new(processed_ats),
        ],
    )
    .map_err(|e| Error::parquet(format!("snapshot batch build failed: {e}")))
}

fn partition_batch(rows: &[SpeedRecord]) -> Result<RecordBatch> {
    let schema = partition_schema();
    let transaction_ids = StringArray::from(
        rows.iter()
            .map(|r| Some(r.transaction_id.as_str()))
            .collect::<Vec<_>>(),
    );
    let user_ids = Int64Array::from(rows.iter().map(|r| r.user_id).collect::<Vec<_>>());
    let products = StringArray::from(rows.iter().map(|r| r.product.as_deref()).collect::<Vec<_>>());
    let amounts = Float64Array::from(rows.iter().map(|r| r.amount).collect::<Vec<_>>());
    let event_times = Int64Array::from(rows.iter().map(|r| r.event_time).collect::<Vec<_>>());
    let statuses = StringArray::from(rows.iter().map(|r| r.status.as_deref()).collect::<Vec<_>>());
    let processed_ats = Int64Array::from(rows.iter().map(|r| r.processed_at).collect::<Vec<_>>());

    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(transaction_ids),
            Arc::new(user_ids),
            Arc::new(products),
            Arc::new(amounts),
            Arc::new(event_times),
            Arc::new(statuses),
            Arc::new(processed_ats),
        ],
    )
    .map_err(|e| Error::parquet(format!("partition batch build failed: {e}")))
}

/// Write a batch snapshot file atomically, replacing any previous one.
pub fn write_snapshot(path: &Path, rows: &[EnrichedRecord]) -> Result<()> {
    let batch = snapshot_batch(rows)?;
    let bytes = encode_single_batch(snapshot_schema(), &batch)?;
    publish_bytes(path, &bytes)
}

/// Write a speed partition file atomically. Overwrite-by-name keeps
/// reprocessing idempotent.
pub fn write_partition(path: &Path, rows: &[SpeedRecord]) -> Result<()> {
    let batch = partition_batch(rows)?;
    let bytes = encode_single_batch(partition_schema(), &batch)?;
    publish_bytes(path, &bytes)
}

fn utf8_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a StringArray> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<StringArray>())
        .ok_or_else(|| Error::schema(format!("missing or mistyped column `{name}`")))
}

fn i64_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Int64Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Int64Array>())
        .ok_or_else(|| Error::schema(format!("missing or mistyped column `{name}`")))
}

fn f64_col<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<Float64Array>())
        .ok_or_else(|| Error::schema(format!("missing or mistyped column `{name}`")))
}

fn opt_utf8(arr: &StringArray, i: usize) -> Option<String> {
    (!arr.is_null(i)).then(|| arr.value(i).to_string())
}

fn opt_i64(arr: &Int64Array, i: usize) -> Option<i64> {
    (!arr.is_null(i)).then(|| arr.value(i))
}

fn opt_f64(arr: &Float64Array, i: usize) -> Option<f64> {
    (!arr.is_null(i)).then(|| arr.value(i))
}

fn read_batches(path: &Path) -> Result<Vec<RecordBatch>> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .map_err(|e| Error::parquet(format!("{}: reader init failed: {e}", path.display())))?
        .build()
        .map_err(|e| Error::parquet(format!("{}: reader build failed: {e}", path.display())))?;

    let mut batches = Vec::new();
    for maybe_batch in reader {
        batches.push(
            maybe_batch
                .map_err(|e| Error::parquet(format!("{}: read failed: {e}", path.display())))?,
        );
    }
    Ok(batches)
}

/// Read one snapshot file into rows.
pub fn read_snapshot_file(path: &Path) -> Result<Vec<EnrichedRecord>> {
    let mut rows = Vec::new();
    for batch in read_batches(path)? {
        let transaction_ids = utf8_col(&batch, "transaction_id")?;
        let user_ids = i64_col(&batch, "user_id")?;
        let products = utf8_col(&batch, "product")?;
        let amounts = f64_col(&batch, "amount")?;
        let timestamps = i64_col(&batch, "timestamp")?;
        let statuses = utf8_col(&batch, "status")?;
        let user_names = utf8_col(&batch, "user_name")?;
        let regions = utf8_col(&batch, "region")?;
        let processed_ats = i64_col(&batch, "processed_at")?;

        for i in 0..batch.num_rows() {
            rows.push(EnrichedRecord {
                transaction_id: transaction_ids.value(i).to_string(),
                user_id: opt_i64(user_ids, i),
                product: opt_utf8(products, i),
                amount: opt_f64(amounts, i),
                timestamp: opt_i64(timestamps, i),
                status: opt_utf8(statuses, i),
                user_name: opt_utf8(user_names, i),
                region: opt_utf8(regions, i),
                processed_at: processed_ats.value(i),
            });
        }
    }
    Ok(rows)
}

/// Read one partition file into rows.
pub fn read_partition_file(path: &Path) -> Result<Vec<SpeedRecord>> {
    let mut rows = Vec::new();
    for batch in read_batches(path)? {
        let transaction_ids = utf8_col(&batch, "transaction_id")?;
        let user_ids = i64_col(&batch, "user_id")?;
        let products = utf8_col(&batch, "product")?;
        let amounts = f64_col(&batch, "amount")?;
        let event_times = i64_col(&batch, "event_time")?;
        let statuses = utf8_col(&batch, "status")?;
        let processed_ats = i64_col(&batch, "processed_at")?;

        for i in 0..batch.num_rows() {
            rows.push(SpeedRecord {
                transaction_id: transaction_ids.value(i).to_string(),
                user_id: opt_i64(user_ids, i),
                product: opt_utf8(products, i),
                amount: opt_f64(amounts, i),
                event_time: opt_i64(event_times, i),
                status: opt_utf8(statuses, i),
                processed_at: processed_ats.value(i),
            });
        }
    }
    Ok(rows)
}

/// List `*.parquet` files under `dir`, sorted by name.
///
/// An absent directory is an empty store, not an error.
pub fn list_parquet_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "parquet") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read every snapshot file under `dir`.
pub fn read_snapshot_dir(dir: &Path) -> Result<Vec<EnrichedRecord>> {
    let mut rows = Vec::new();
    for path in list_parquet_files(dir)? {
        rows.extend(read_snapshot_file(&path)?);
    }
    Ok(rows)
}

/// Read every partition file under `dir`.
pub fn read_partition_dir(dir: &Path) -> Result<Vec<SpeedRecord>> {
    let mut rows = Vec::new();
    for path in list_parquet_files(dir)? {
        rows.extend(read_partition_file(&path)?);
    }
    Ok(rows)
}
