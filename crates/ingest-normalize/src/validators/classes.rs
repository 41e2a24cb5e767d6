//! Per-class validators for the five representative classes, enforcing the
//! class-specific required fields the matching normalizer is contracted to
//! populate (§4.F.2, §4.G).

use ingest_types::CanonicalEvent;

use crate::error::ValidationError;
use crate::validator::Validator;

fn require_attribute(event: &CanonicalEvent, key: &'static str) -> Result<(), ValidationError> {
    match event.attributes.get(key) {
        Some(value) if value.as_str().map(|s| !s.is_empty()).unwrap_or(true) => Ok(()),
        _ => Err(ValidationError::Required(key)),
    }
}

/// Requires `user_name` and `status` on `authentication` events.
pub struct AuthenticationValidator;

impl Validator for AuthenticationValidator {
    fn supports(&self, class: &str) -> bool {
        class == "authentication"
    }

    fn validate(&self, event: &CanonicalEvent) -> Result<(), ValidationError> {
        require_attribute(event, "user_name")?;
        require_attribute(event, "status")
    }
}

/// Requires both endpoint ips on `network_activity` events.
pub struct NetworkActivityValidator;

impl Validator for NetworkActivityValidator {
    fn supports(&self, class: &str) -> bool {
        class == "network_activity"
    }

    fn validate(&self, event: &CanonicalEvent) -> Result<(), ValidationError> {
        require_attribute(event, "src_endpoint_ip")?;
        require_attribute(event, "dst_endpoint_ip")
    }
}

/// Requires the queried hostname on `dns_activity` events.
pub struct DnsActivityValidator;

impl Validator for DnsActivityValidator {
    fn supports(&self, class: &str) -> bool {
        class == "dns_activity"
    }

    fn validate(&self, event: &CanonicalEvent) -> Result<(), ValidationError> {
        require_attribute(event, "query_hostname")
    }
}

/// Requires the file path on `file_activity` events.
pub struct FileActivityValidator;

impl Validator for FileActivityValidator {
    fn supports(&self, class: &str) -> bool {
        class == "file_activity"
    }

    fn validate(&self, event: &CanonicalEvent) -> Result<(), ValidationError> {
        require_attribute(event, "file_path")
    }
}

/// Requires the process name on `process_activity` events.
pub struct ProcessActivityValidator;

impl Validator for ProcessActivityValidator {
    fn supports(&self, class: &str) -> bool {
        class == "process_activity"
    }

    fn validate(&self, event: &CanonicalEvent) -> Result<(), ValidationError> {
        require_attribute(event, "process_name")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ingest_types::canonical::{Metadata, ProductMetadata};
    use serde_json::{json, Map};

    fn event(class: &str, attributes: Map<String, serde_json::Value>) -> CanonicalEvent {
        let mut event = CanonicalEvent {
            class: class.to_string(),
            class_uid: 1,
            category_uid: 1,
            category: "system".to_string(),
            activity_id: 1,
            type_uid: 0,
            time: Utc::now(),
            severity_id: 0,
            metadata: Metadata {
                product: ProductMetadata { name: "acme".to_string() },
                version: "1.1.0".to_string(),
                log_name: None,
                log_provider: None,
            },
            attack_tactic: None,
            attack_tactic_uid: None,
            attack_technique: None,
            attack_technique_uid: None,
            attributes,
            properties: Map::new(),
        };
        event.recompute_type_uid();
        event
    }

    #[test]
    fn authentication_validator_requires_status() {
        let mut attrs = Map::new();
        attrs.insert("user_name".to_string(), json!("alice"));
        let err = AuthenticationValidator.validate(&event("authentication", attrs)).unwrap_err();
        assert!(matches!(err, ValidationError::Required("status")));
    }

    #[test]
    fn file_activity_validator_accepts_populated_path() {
        let mut attrs = Map::new();
        attrs.insert("file_path".to_string(), json!("/etc/shadow"));
        assert!(FileActivityValidator.validate(&event("file_activity", attrs)).is_ok());
    }
}
