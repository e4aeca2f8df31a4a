//! Permissive coercion adapter for schema-on-read inputs.
//!
//! Raw producers dump newline-delimited JSON with loosely typed
//! fields: amounts arrive as numbers or numeric strings, user ids as
//! integers or strings, timestamps as `"YYYY-MM-DD HH:MM:SS"`.
//! Coercion nulls any field that fails to parse instead of rejecting
//! the record; only a missing record key is a parse error.

use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::record::TransactionRecord;

/// Timestamp format produced by the raw ingest stores.
pub const RAW_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Coerce a JSON value into a string. Numbers are stringified to
/// tolerate producers that emit unquoted ids.
pub fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Coerce a JSON value into an i64, accepting numeric strings.
pub fn coerce_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Coerce a JSON value into an f64, accepting numeric strings.
pub fn coerce_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Parse a raw timestamp string into epoch milliseconds.
///
/// Accepts the canonical `YYYY-MM-DD HH:MM:SS` wall-clock format
/// (interpreted as UTC) with an RFC 3339 fallback.
pub fn parse_raw_timestamp(s: &str) -> Option<i64> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s.trim(), RAW_TIMESTAMP_FORMAT) {
        return Some(dt.and_utc().timestamp_millis());
    }
    DateTime::parse_from_rfc3339(s.trim())
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Coerce a JSON value into an epoch-millisecond timestamp.
pub fn coerce_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::String(s) => parse_raw_timestamp(s),
        // Already epoch millis from an upstream normalizer.
        Value::Number(n) => n.as_i64(),
        _ => None,
    }
}

/// Coerce one parsed JSON object into a [`TransactionRecord`].
///
/// Returns `Error::Parse` only when the record key is missing or not
/// coercible to a string; every other field degrades to null.
pub fn coerce_record(value: &Value, file: &str, line: usize) -> Result<TransactionRecord> {
    let obj = value
        .as_object()
        .ok_or_else(|| Error::parse(file, line, "record is not a JSON object"))?;

    let transaction_id = obj
        .get("transaction_id")
        .and_then(coerce_string)
        .ok_or_else(|| Error::parse(file, line, "missing transaction_id"))?;

    Ok(TransactionRecord {
        transaction_id,
        user_id: obj.get("user_id").and_then(coerce_i64),
        product: obj.get("product").and_then(coerce_string),
        amount: obj.get("amount").and_then(coerce_f64),
        timestamp: obj.get("timestamp").and_then(coerce_timestamp),
        status: obj.get("status").and_then(coerce_string),
    })
}

/// Parse one line of a newline-delimited JSON file.
pub fn parse_record_line(raw: &str, file: &str, line: usize) -> Result<TransactionRecord> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| Error::parse(file, line, format!("invalid JSON: {e}")))?;
    coerce_record(&value, file, line)
}
