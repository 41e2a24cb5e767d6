//! The raw event envelope: the internal representation of a received, unparsed
//! event plus the context needed to route and normalize it.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A received event, prior to normalization into a canonical OCSF record.
///
/// Created once at admission (§3 I1: `id` is generated here and never changes),
/// mutated only to attach `tenant_id`/`ack_id`, consumed exactly once by a
/// pipeline worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEnvelope {
    /// Stable identifier generated on admission; flows unchanged to the
    /// canonical event and any DLQ record.
    pub id: Uuid,
    /// Wire format of `payload` (currently always `json`).
    pub format: String,
    /// Tenant-provided hint used for normalizer dispatch, e.g. `ocsf:authentication`.
    pub source_type: String,
    /// Submitter-provided source label (e.g. application or integration name).
    pub source: String,
    /// Submitter-provided host label.
    pub host: String,
    /// Observed source IP of the submitting client, if known.
    pub source_ip: Option<String>,
    /// Opaque bytes of the original event body (already split out of any
    /// NDJSON/batch wrapper by the time this is constructed).
    pub payload: serde_json::Value,
    /// UTC timestamp at which this envelope was admitted.
    pub received_at: DateTime<Utc>,
    /// Small string-keyed attribute bag; always carries at least `host` and
    /// `token_id` once authentication has run.
    pub attributes: HashMap<String, String>,
    /// Opaque id of the HEC token that authenticated this submission.
    pub hec_token_id: Option<String>,
    /// Tenant the token resolved to; required for downstream isolation once set.
    pub tenant_id: Option<String>,
}

impl RawEnvelope {
    /// Construct a fresh envelope with a freshly generated `id`.
    pub fn new(format: impl Into<String>, source_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            format: format.into(),
            source_type: source_type.into(),
            source: String::new(),
            host: String::new(),
            source_ip: None,
            payload,
            received_at: Utc::now(),
            attributes: HashMap::new(),
            hec_token_id: None,
            tenant_id: None,
        }
    }

    /// Attach the token id and tenant id resolved by the Credential Validator.
    pub fn with_auth(mut self, token_id: impl Into<String>, tenant_id: impl Into<String>) -> Self {
        let token_id = token_id.into();
        self.attributes.insert("token_id".to_string(), token_id.clone());
        self.hec_token_id = Some(token_id);
        self.tenant_id = Some(tenant_id.into());
        self
    }
}
