//! Wire-level HEC types (§6): the event payload shape and the response envelope.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One HEC event as received on `/services/collector/event` or `/raw`.
///
/// `time` is seconds since the Unix epoch with fractional milliseconds; absent
/// means "now" (§6). `event` may be any JSON value, not just an object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HecEvent {
    /// Seconds-since-epoch event time, fractional.
    #[serde(default)]
    pub time: Option<f64>,
    /// Submitter-provided host label.
    #[serde(default)]
    pub host: Option<String>,
    /// Submitter-provided source label.
    #[serde(default)]
    pub source: Option<String>,
    /// Submitter-provided sourcetype label; used for normalizer dispatch.
    #[serde(default)]
    pub sourcetype: Option<String>,
    /// Destination index hint (observational only; the core does not route by index).
    #[serde(default)]
    pub index: Option<String>,
    /// The event body itself; may be a string, object, or array.
    pub event: serde_json::Value,
    /// Arbitrary indexed fields, passed through into `properties`.
    #[serde(default)]
    pub fields: HashMap<String, serde_json::Value>,
}

/// The response envelope returned by every HEC-surface endpoint (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorResponse {
    /// Human-readable status text, e.g. `"Success"`.
    pub text: String,
    /// HEC numeric status code (0 success, 4 auth, 5 no data, 6 format, 9 busy).
    pub code: u32,
    /// Ack id, present only when the request both requested one and succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ack_id: Option<String>,
}

impl CollectorResponse {
    /// `{"text":"Success","code":0}`, optionally carrying an ack id.
    pub fn success(ack_id: Option<String>) -> Self {
        Self { text: "Success".to_string(), code: 0, ack_id }
    }

    /// A HEC error response with the given code and text.
    pub fn error(code: u32, text: impl Into<String>) -> Self {
        Self { text: text.into(), code, ack_id: None }
    }
}

/// Body of `POST /services/collector/ack`.
#[derive(Debug, Clone, Deserialize)]
pub struct AckQuery {
    /// Ack ids to query.
    pub acks: Vec<String>,
}

/// Body of the ack query response: `{"acks":{"<id>":true|false,...}}`.
#[derive(Debug, Clone, Serialize)]
pub struct AckQueryResponse {
    /// Per-ack-id resolution; only ids whose status is `success` map to `true`.
    pub acks: HashMap<String, bool>,
}
