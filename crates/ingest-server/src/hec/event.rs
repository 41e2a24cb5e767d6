//! HEC event-body parsing and conversion to [`RawEnvelope`] (§4.C steps 8-10,
//! §6 wire format).

use chrono::{DateTime, Utc};
use ingest_types::RawEnvelope;
use serde_json::Value;

/// Parse a `/services/collector/event` body: a single JSON object, or
/// (on failure) newline-delimited JSON objects. A line that fails to parse
/// fails the whole request (§4.C step 8).
pub fn parse_event_body(body: &[u8]) -> Result<Vec<Value>, ()> {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        return Ok(vec![value]);
    }
    let text = std::str::from_utf8(body).map_err(|_| ())?;
    let mut events = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        events.push(serde_json::from_str::<Value>(line).map_err(|_| ())?);
    }
    if events.is_empty() {
        return Err(());
    }
    Ok(events)
}

/// Derive `time` from a HEC wrapper's numeric `event.time` (seconds with
/// fractional milliseconds); absent or unparseable means "now" (§6).
pub fn derive_time(wrapper: &Value) -> DateTime<Utc> {
    wrapper
        .get("time")
        .and_then(Value::as_f64)
        .and_then(|seconds| {
            let secs = seconds.trunc() as i64;
            let nanos = (seconds.fract() * 1_000_000_000.0).round() as u32;
            DateTime::from_timestamp(secs, nanos)
        })
        .unwrap_or_else(Utc::now)
}

fn wrapper_string(wrapper: &Value, key: &str) -> String {
    wrapper.get(key).and_then(Value::as_str).unwrap_or_default().to_string()
}

/// Build a [`RawEnvelope`] from one parsed HEC event wrapper. `payload` is
/// the wrapper value itself (possibly carrying a nested `event` key) — the
/// normalizers unwrap it as needed, the same way for every source.
pub fn envelope_from_wrapper(wrapper: Value) -> RawEnvelope {
    let host = wrapper_string(&wrapper, "host");
    let source = wrapper_string(&wrapper, "source");
    let source_type = wrapper_string(&wrapper, "sourcetype");
    let received_at = derive_time(&wrapper);

    let mut envelope = RawEnvelope::new("json", source_type, wrapper);
    envelope.host = host;
    envelope.source = source;
    envelope.received_at = received_at;
    envelope
}

/// Build a [`RawEnvelope`] for `/services/collector/raw`: the body is an
/// opaque single event; metadata comes from query params first, then
/// `X-Splunk-Request-*` headers (§4.C step 9).
pub fn envelope_from_raw(body: &[u8], source: String, source_type: String, host: String) -> RawEnvelope {
    let text = String::from_utf8_lossy(body).into_owned();
    let mut envelope = RawEnvelope::new("json", source_type, Value::String(text));
    envelope.host = host;
    envelope.source = source;
    envelope.received_at = Utc::now();
    envelope
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_object_parses_as_one_event() {
        let body = br#"{"event":{"a":1}}"#;
        let events = parse_event_body(body).unwrap();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn ndjson_falls_back_on_whole_body_parse_failure() {
        let body = b"{\"event\":{\"a\":1}}\n{\"event\":{\"a\":2}}\n";
        let events = parse_event_body(body).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn blank_lines_are_skipped() {
        let body = b"{\"event\":{\"a\":1}}\n\n{\"event\":{\"a\":2}}\n";
        let events = parse_event_body(body).unwrap();
        assert_eq!(events.len(), 2);
    }

    #[test]
    fn a_bad_line_fails_the_whole_request() {
        let body = b"{\"event\":{\"a\":1}}\nnot json\n";
        assert!(parse_event_body(body).is_err());
    }

    #[test]
    fn empty_body_fails() {
        assert!(parse_event_body(b"").is_err());
    }

    #[test]
    fn missing_time_defaults_to_now() {
        let wrapper = json!({"event": {"a": 1}});
        let before = Utc::now();
        let time = derive_time(&wrapper);
        assert!(time >= before);
    }

    #[test]
    fn numeric_time_is_converted() {
        let wrapper = json!({"time": 1699999999.5});
        let time = derive_time(&wrapper);
        assert_eq!(time.timestamp(), 1699999999);
    }

    #[test]
    fn envelope_carries_metadata_and_payload() {
        let wrapper = json!({"host": "h", "source": "s", "sourcetype": "ocsf:authentication", "event": {"a": 1}});
        let envelope = envelope_from_wrapper(wrapper);
        assert_eq!(envelope.host, "h");
        assert_eq!(envelope.source, "s");
        assert_eq!(envelope.source_type, "ocsf:authentication");
        assert_eq!(envelope.format, "json");
    }
}
