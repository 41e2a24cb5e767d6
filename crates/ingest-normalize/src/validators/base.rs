//! The basic validator: always applies, checks the fields every canonical
//! event must carry regardless of class (§4.G).

use ingest_types::CanonicalEvent;

use crate::error::ValidationError;
use crate::validator::Validator;

/// Required on every canonical event: non-empty `class`, non-zero
/// `class_uid` (unless `class == "base_event"`), non-empty `category`,
/// non-zero `time`, non-empty `metadata.product.name`, non-empty
/// `metadata.version`.
pub struct BaseValidator;

impl Validator for BaseValidator {
    fn supports(&self, _class: &str) -> bool {
        true
    }

    fn validate(&self, event: &CanonicalEvent) -> Result<(), ValidationError> {
        if event.class.is_empty() {
            return Err(ValidationError::Required("class"));
        }
        if event.class_uid == 0 && event.class != "base_event" {
            return Err(ValidationError::Required("class_uid"));
        }
        if event.category.is_empty() {
            return Err(ValidationError::Required("category"));
        }
        if event.time.timestamp() == 0 {
            return Err(ValidationError::Required("time"));
        }
        if event.metadata.product.name.is_empty() {
            return Err(ValidationError::Required("metadata.product.name"));
        }
        if event.metadata.version.is_empty() {
            return Err(ValidationError::Required("metadata.version"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use ingest_types::canonical::{Metadata, ProductMetadata};
    use serde_json::Map;

    fn valid_event() -> CanonicalEvent {
        let mut event = CanonicalEvent {
            class: "authentication".to_string(),
            class_uid: 3002,
            category_uid: 3,
            category: "iam".to_string(),
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
            attributes: Map::new(),
            properties: Map::new(),
        };
        event.recompute_type_uid();
        event
    }

    #[test]
    fn accepts_well_formed_event() {
        assert!(BaseValidator.validate(&valid_event()).is_ok());
    }

    #[test]
    fn base_event_class_uid_zero_is_allowed() {
        let mut event = valid_event();
        event.class = "base_event".to_string();
        event.class_uid = 0;
        assert!(BaseValidator.validate(&event).is_ok());
    }

    #[test]
    fn rejects_missing_product_name() {
        let mut event = valid_event();
        event.metadata.product.name = String::new();
        assert!(matches!(BaseValidator.validate(&event), Err(ValidationError::Required("metadata.product.name"))));
    }
}
