//! The OCSF passthrough normalizer (§4.F.1): the highest-priority entry,
//! for tenants that already emit OCSF-shaped JSON and just need admission,
//! envelope metadata, and the ATT&CK hoist applied.

use chrono::Utc;
use ingest_types::canonical::{Metadata, ProductMetadata};
use ingest_types::{CanonicalEvent, RawEnvelope};
use serde_json::{Map, Value};

use super::support::{numeric_time, product_name, schema_version, string_field, u32_field, unwrap_hec_wrapper};
use crate::error::NormalizeError;
use crate::normalizer::Normalizer;

/// Matches `source_type` beginning with `ocsf:` (case-insensitive), `format=json`.
pub struct OcsfPassthroughNormalizer;

impl Normalizer for OcsfPassthroughNormalizer {
    fn name(&self) -> &'static str {
        "ocsf_passthrough"
    }

    fn supports(&self, format: &str, source_type: &str) -> bool {
        format.eq_ignore_ascii_case("json") && source_type.to_ascii_lowercase().starts_with("ocsf:")
    }

    fn normalize(&self, envelope: &RawEnvelope) -> Result<CanonicalEvent, NormalizeError> {
        let object = unwrap_hec_wrapper(&envelope.payload)
            .ok_or_else(|| NormalizeError::Malformed("payload is not a JSON object".to_string()))?;

        let mut properties: Map<String, Value> =
            object.get("properties").and_then(Value::as_object).cloned().unwrap_or_default();
        properties.insert("source".to_string(), Value::String(envelope.source.clone()));
        properties.insert("source_type".to_string(), Value::String(envelope.source_type.clone()));

        let mut event = CanonicalEvent {
            class: string_field(object, "class").unwrap_or_default(),
            class_uid: u32_field(object, "class_uid").unwrap_or(0),
            category_uid: u32_field(object, "category_uid").unwrap_or(0),
            category: string_field(object, "category").unwrap_or_default(),
            activity_id: u32_field(object, "activity_id").unwrap_or(0),
            type_uid: 0,
            time: numeric_time(object).unwrap_or_else(Utc::now),
            severity_id: u32_field(object, "severity_id").unwrap_or(0),
            metadata: Metadata {
                product: ProductMetadata { name: product_name(object) },
                version: schema_version(object),
                log_name: None,
                log_provider: None,
            },
            attack_tactic: None,
            attack_tactic_uid: None,
            attack_technique: None,
            attack_technique_uid: None,
            attributes: Map::new(),
            properties,
        };
        event.recompute_type_uid();
        if let Some(attacks) = object.get("attacks").and_then(Value::as_array) {
            event.hoist_attack(attacks);
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(source_type: &str, payload: Value) -> RawEnvelope {
        let mut e = RawEnvelope::new("json", source_type, payload);
        e.source = "fw-01".to_string();
        e
    }

    #[test]
    fn unwraps_hec_envelope_and_hoists_attack() {
        let payload = json!({
            "event": {
                "class": "authentication",
                "class_uid": 3002,
                "category_uid": 3,
                "category": "iam",
                "activity_id": 1,
                "time": 1_700_000_000.5,
                "metadata": {"product": {"name": "acme-idp"}, "version": "1.1.0"},
                "attacks": [{"tactic": {"name": "Initial Access", "uid": "TA0001"}}]
            }
        });
        let event = OcsfPassthroughNormalizer.normalize(&envelope("ocsf:authentication", payload)).unwrap();
        assert_eq!(event.class, "authentication");
        assert_eq!(event.type_uid, 3 * 100_000 + 3002 * 100 + 1);
        assert_eq!(event.attack_tactic.as_deref(), Some("Initial Access"));
        assert_eq!(event.properties.get("source").and_then(Value::as_str), Some("fw-01"));
    }

    #[test]
    fn rejects_non_object_payload() {
        let err = OcsfPassthroughNormalizer.normalize(&envelope("ocsf:authentication", json!("oops"))).unwrap_err();
        assert!(matches!(err, NormalizeError::Malformed(_)));
    }
}
