//! The HEC fallback normalizer (§4.F.3): the last entry in the registry,
//! catching any JSON payload none of the OCSF-aware normalizers claimed.

use ingest_types::canonical::{Metadata, ProductMetadata};
use ingest_types::{CanonicalEvent, RawEnvelope};
use serde_json::{Map, Value};

use super::support::{numeric_time, OCSF_SCHEMA_VERSION};
use crate::error::NormalizeError;
use crate::normalizer::Normalizer;

/// Matches any envelope with `format=json`; must be registered last.
pub struct HecFallbackNormalizer;

impl Normalizer for HecFallbackNormalizer {
    fn name(&self) -> &'static str {
        "hec_fallback"
    }

    fn supports(&self, format: &str, _source_type: &str) -> bool {
        format.eq_ignore_ascii_case("json")
    }

    fn normalize(&self, envelope: &RawEnvelope) -> Result<CanonicalEvent, NormalizeError> {
        let time = envelope
            .payload
            .as_object()
            .and_then(numeric_time)
            .unwrap_or(envelope.received_at);

        let mut properties = Map::new();
        properties.insert("payload".to_string(), envelope.payload.clone());
        properties.insert("source".to_string(), Value::String(envelope.source.clone()));
        properties.insert("source_type".to_string(), Value::String(envelope.source_type.clone()));

        let product_name = if envelope.source.is_empty() { "unknown".to_string() } else { envelope.source.clone() };

        let mut event = CanonicalEvent {
            class: "base_event".to_string(),
            class_uid: 0,
            category_uid: 0,
            category: "uncategorized".to_string(),
            activity_id: 0,
            type_uid: 0,
            time,
            severity_id: 0,
            metadata: Metadata {
                product: ProductMetadata { name: product_name },
                version: OCSF_SCHEMA_VERSION.to_string(),
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
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn carries_unparsed_payload_into_properties() {
        let mut envelope = RawEnvelope::new("json", "myapp:custom", json!({"msg": "hello"}));
        envelope.source = "myapp".to_string();
        let event = HecFallbackNormalizer.normalize(&envelope).unwrap();
        assert_eq!(event.class, "base_event");
        assert_eq!(event.class_uid, 0);
        assert_eq!(event.properties.get("payload"), Some(&json!({"msg": "hello"})));
        assert_eq!(event.metadata.product.name, "myapp");
    }
}
