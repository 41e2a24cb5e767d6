//! Payload-parsing helpers shared by more than one normalizer.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

/// OCSF schema version this system normalizes against.
pub(crate) const OCSF_SCHEMA_VERSION: &str = "1.1.0";

/// If `payload` is an HEC wrapper (carries an `event` key whose value is an
/// object), return that inner object; otherwise treat `payload` itself as
/// the object to read fields from (§4.F.1).
pub(crate) fn unwrap_hec_wrapper(payload: &Value) -> Option<&Map<String, Value>> {
    let object = payload.as_object()?;
    match object.get("event").and_then(Value::as_object) {
        Some(inner) => Some(inner),
        None => Some(object),
    }
}

pub(crate) fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

pub(crate) fn u32_field(object: &Map<String, Value>, key: &str) -> Option<u32> {
    object.get(key).and_then(Value::as_u64).map(|value| value as u32)
}

/// Parse a numeric `time` field as seconds-with-fraction since the epoch,
/// the convention used throughout the HEC wire format (§6).
pub(crate) fn numeric_time(object: &Map<String, Value>) -> Option<DateTime<Utc>> {
    let seconds = object.get("time")?.as_f64()?;
    let secs = seconds.trunc() as i64;
    let nanos = (seconds.fract() * 1_000_000_000.0).round() as u32;
    DateTime::from_timestamp(secs, nanos)
}

pub(crate) fn product_name(object: &Map<String, Value>) -> String {
    object
        .get("metadata")
        .and_then(|m| m.get("product"))
        .and_then(|p| p.get("name"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

pub(crate) fn schema_version(object: &Map<String, Value>) -> String {
    object
        .get("metadata")
        .and_then(|m| m.get("version"))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
