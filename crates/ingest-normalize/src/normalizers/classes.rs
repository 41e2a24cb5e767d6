//! The five representative class-specific normalizers (§4.F.2).
//!
//! The full registry has one entry per OCSF class (77), generated from the
//! schema with a uniform contract: claim a fixed set of source-type
//! patterns, read the fields that class defines, and emit a fully-populated
//! canonical event. These five stand in for that generated set, each
//! following the same shape so adding the remaining 72 is mechanical.

use ingest_types::canonical::{Metadata, ProductMetadata};
use ingest_types::{CanonicalEvent, RawEnvelope};
use serde_json::{Map, Value};

use super::support::{numeric_time, product_name, schema_version, string_field, u32_field, OCSF_SCHEMA_VERSION};
use crate::error::NormalizeError;
use crate::normalizer::Normalizer;

fn base_event(
    object: &Map<String, Value>,
    envelope: &RawEnvelope,
    class: &str,
    class_uid: u32,
    category: &str,
    category_uid: u32,
    default_activity_id: u32,
) -> CanonicalEvent {
    let mut properties: Map<String, Value> =
        object.get("properties").and_then(Value::as_object).cloned().unwrap_or_default();
    properties.insert("source".to_string(), Value::String(envelope.source.clone()));
    properties.insert("source_type".to_string(), Value::String(envelope.source_type.clone()));

    let name = product_name(object);
    let version = schema_version(object);

    let mut event = CanonicalEvent {
        class: class.to_string(),
        class_uid,
        category_uid,
        category: category.to_string(),
        activity_id: u32_field(object, "activity_id").unwrap_or(default_activity_id),
        type_uid: 0,
        time: numeric_time(object).unwrap_or(envelope.received_at),
        severity_id: u32_field(object, "severity_id").unwrap_or(0),
        metadata: Metadata {
            product: ProductMetadata {
                name: if name.is_empty() { envelope.source.clone() } else { name },
            },
            version: if version.is_empty() { OCSF_SCHEMA_VERSION.to_string() } else { version },
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
    event
}

/// OCSF Authentication (class_uid 3002, category IAM).
pub struct AuthenticationNormalizer;

impl Normalizer for AuthenticationNormalizer {
    fn name(&self) -> &'static str {
        "authentication"
    }

    fn supports(&self, format: &str, source_type: &str) -> bool {
        format.eq_ignore_ascii_case("json") && source_type.to_ascii_lowercase().starts_with("auth:")
    }

    fn normalize(&self, envelope: &RawEnvelope) -> Result<CanonicalEvent, NormalizeError> {
        let object = envelope
            .payload
            .as_object()
            .ok_or_else(|| NormalizeError::Malformed("payload is not a JSON object".to_string()))?;
        let user_name = object.get("user").and_then(|u| u.get("name")).and_then(Value::as_str);
        if user_name.is_none() {
            return Err(NormalizeError::MissingField("user.name"));
        }
        let status = string_field(object, "status").ok_or(NormalizeError::MissingField("status"))?;

        let mut event = base_event(object, envelope, "authentication", 3002, "iam", 3, 1);
        event.attributes.insert("user_name".to_string(), Value::String(user_name.unwrap().to_string()));
        event.attributes.insert("status".to_string(), Value::String(status));
        Ok(event)
    }
}

/// OCSF Network Activity (class_uid 4001, category Network Activity).
pub struct NetworkActivityNormalizer;

impl Normalizer for NetworkActivityNormalizer {
    fn name(&self) -> &'static str {
        "network_activity"
    }

    fn supports(&self, format: &str, source_type: &str) -> bool {
        format.eq_ignore_ascii_case("json") && source_type.to_ascii_lowercase().starts_with("network:")
    }

    fn normalize(&self, envelope: &RawEnvelope) -> Result<CanonicalEvent, NormalizeError> {
        let object = envelope
            .payload
            .as_object()
            .ok_or_else(|| NormalizeError::Malformed("payload is not a JSON object".to_string()))?;
        let src_ip = object.get("src_endpoint").and_then(|e| e.get("ip")).and_then(Value::as_str);
        let dst_ip = object.get("dst_endpoint").and_then(|e| e.get("ip")).and_then(Value::as_str);
        let src_ip = src_ip.ok_or(NormalizeError::MissingField("src_endpoint.ip"))?;
        let dst_ip = dst_ip.ok_or(NormalizeError::MissingField("dst_endpoint.ip"))?;

        let mut event = base_event(object, envelope, "network_activity", 4001, "network", 4, 6);
        event.attributes.insert("src_endpoint_ip".to_string(), Value::String(src_ip.to_string()));
        event.attributes.insert("dst_endpoint_ip".to_string(), Value::String(dst_ip.to_string()));
        Ok(event)
    }
}

/// OCSF DNS Activity (class_uid 4003, category Network Activity).
pub struct DnsActivityNormalizer;

impl Normalizer for DnsActivityNormalizer {
    fn name(&self) -> &'static str {
        "dns_activity"
    }

    fn supports(&self, format: &str, source_type: &str) -> bool {
        format.eq_ignore_ascii_case("json") && source_type.to_ascii_lowercase().starts_with("dns:")
    }

    fn normalize(&self, envelope: &RawEnvelope) -> Result<CanonicalEvent, NormalizeError> {
        let object = envelope
            .payload
            .as_object()
            .ok_or_else(|| NormalizeError::Malformed("payload is not a JSON object".to_string()))?;
        let hostname = object
            .get("query")
            .and_then(|q| q.get("hostname"))
            .and_then(Value::as_str)
            .ok_or(NormalizeError::MissingField("query.hostname"))?;

        let mut event = base_event(object, envelope, "dns_activity", 4003, "network", 4, 1);
        event.attributes.insert("query_hostname".to_string(), Value::String(hostname.to_string()));
        Ok(event)
    }
}

/// OCSF File Activity (class_uid 1001, category System Activity).
pub struct FileActivityNormalizer;

impl Normalizer for FileActivityNormalizer {
    fn name(&self) -> &'static str {
        "file_activity"
    }

    fn supports(&self, format: &str, source_type: &str) -> bool {
        format.eq_ignore_ascii_case("json") && source_type.to_ascii_lowercase().starts_with("file:")
    }

    fn normalize(&self, envelope: &RawEnvelope) -> Result<CanonicalEvent, NormalizeError> {
        let object = envelope
            .payload
            .as_object()
            .ok_or_else(|| NormalizeError::Malformed("payload is not a JSON object".to_string()))?;
        let path = object
            .get("file")
            .and_then(|f| f.get("path"))
            .and_then(Value::as_str)
            .ok_or(NormalizeError::MissingField("file.path"))?;

        let mut event = base_event(object, envelope, "file_activity", 1001, "system", 1, 1);
        event.attributes.insert("file_path".to_string(), Value::String(path.to_string()));
        Ok(event)
    }
}

/// OCSF Process Activity (class_uid 1007, category System Activity).
pub struct ProcessActivityNormalizer;

impl Normalizer for ProcessActivityNormalizer {
    fn name(&self) -> &'static str {
        "process_activity"
    }

    fn supports(&self, format: &str, source_type: &str) -> bool {
        format.eq_ignore_ascii_case("json") && source_type.to_ascii_lowercase().starts_with("process:")
    }

    fn normalize(&self, envelope: &RawEnvelope) -> Result<CanonicalEvent, NormalizeError> {
        let object = envelope
            .payload
            .as_object()
            .ok_or_else(|| NormalizeError::Malformed("payload is not a JSON object".to_string()))?;
        let process_name = object
            .get("process")
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .ok_or(NormalizeError::MissingField("process.name"))?;

        let mut event = base_event(object, envelope, "process_activity", 1007, "system", 1, 1);
        event.attributes.insert("process_name".to_string(), Value::String(process_name.to_string()));
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn authentication_requires_user_name() {
        let envelope = RawEnvelope::new("json", "auth:okta", json!({"status": "success"}));
        let err = AuthenticationNormalizer.normalize(&envelope).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingField("user.name")));
    }

    #[test]
    fn authentication_populates_attributes() {
        let envelope =
            RawEnvelope::new("json", "auth:okta", json!({"user": {"name": "alice"}, "status": "success"}));
        let event = AuthenticationNormalizer.normalize(&envelope).unwrap();
        assert_eq!(event.class_uid, 3002);
        assert_eq!(event.attributes.get("user_name"), Some(&json!("alice")));
    }

    #[test]
    fn network_activity_requires_both_endpoints() {
        let envelope = RawEnvelope::new(
            "json",
            "network:firewall",
            json!({"src_endpoint": {"ip": "10.0.0.1"}}),
        );
        let err = NetworkActivityNormalizer.normalize(&envelope).unwrap_err();
        assert!(matches!(err, NormalizeError::MissingField("dst_endpoint.ip")));
    }

    #[test]
    fn dns_activity_requires_hostname() {
        let envelope = RawEnvelope::new("json", "dns:resolver", json!({}));
        assert!(DnsActivityNormalizer.normalize(&envelope).is_err());
    }

    #[test]
    fn file_activity_requires_path() {
        let envelope = RawEnvelope::new("json", "file:edr", json!({"file": {"path": "/etc/passwd"}}));
        let event = FileActivityNormalizer.normalize(&envelope).unwrap();
        assert_eq!(event.class, "file_activity");
    }

    #[test]
    fn process_activity_requires_process_name() {
        let envelope = RawEnvelope::new("json", "process:edr", json!({"process": {"name": "bash"}}));
        let event = ProcessActivityNormalizer.normalize(&envelope).unwrap();
        assert_eq!(event.class, "process_activity");
    }
}
