//! The canonical (OCSF) event: the post-normalization record ready for indexing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Product/version/log-provenance metadata block required on every canonical event.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metadata {
    /// Product name and version block (`metadata.product.name` is required, §4.G).
    pub product: ProductMetadata,
    /// OCSF schema version this event was normalized against.
    pub version: String,
    /// Original envelope `source`, copied in by the Pipeline enrichment step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_name: Option<String>,
    /// Fixed provider string stamped by the Pipeline enrichment step.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_provider: Option<String>,
}

/// Product identity nested under `metadata`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductMetadata {
    /// Product name; required non-empty by the base validator.
    pub name: String,
}

/// A fully-normalized OCSF event, either class-specific or the HEC fallback shape.
///
/// `type_uid` is always recomputed as `category_uid*100000 + class_uid*100 +
/// activity_id` (§3 I2) rather than trusted from input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalEvent {
    /// OCSF class name, e.g. `authentication`.
    pub class: String,
    /// OCSF numeric class identifier.
    pub class_uid: u32,
    /// OCSF numeric category identifier.
    pub category_uid: u32,
    /// OCSF category name, e.g. `iam`.
    pub category: String,
    /// OCSF activity identifier within the class.
    pub activity_id: u32,
    /// Derived `category_uid*100000 + class_uid*100 + activity_id`.
    pub type_uid: u64,
    /// Event time, UTC.
    pub time: DateTime<Utc>,
    /// OCSF severity identifier (0 = Unknown).
    pub severity_id: u32,
    /// Product/version metadata.
    pub metadata: Metadata,
    /// MITRE ATT&CK tactic name, hoisted from `attacks[0]` if present (§3, P5).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_tactic: Option<String>,
    /// MITRE ATT&CK tactic numeric id, hoisted from `attacks[0]` if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_tactic_uid: Option<String>,
    /// MITRE ATT&CK technique name, hoisted from `attacks[0]` if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_technique: Option<String>,
    /// MITRE ATT&CK technique numeric id, hoisted from `attacks[0]` if present.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attack_technique_uid: Option<String>,
    /// Class-specific attributes, flattened at serialization time (see `to_document`).
    #[serde(skip)]
    pub attributes: Map<String, Value>,
    /// Unknown/pass-through fields, nested under `properties` in the emitted document.
    pub properties: Map<String, Value>,
}

impl CanonicalEvent {
    /// Recompute and assign `type_uid` from the class/category/activity triple (I2).
    pub fn recompute_type_uid(&mut self) {
        self.type_uid = (self.category_uid as u64) * 100_000
            + (self.class_uid as u64) * 100
            + (self.activity_id as u64);
    }

    /// Hoist `attacks[0]` tactic/technique fields to root per §3 and P5.
    pub fn hoist_attack(&mut self, attacks: &[Value]) {
        let Some(first) = attacks.first() else { return };
        if let Some(tactic) = first.get("tactic") {
            self.attack_tactic = tactic.get("name").and_then(Value::as_str).map(str::to_string);
            self.attack_tactic_uid = tactic
                .get("uid")
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()));
        }
        if let Some(technique) = first.get("technique") {
            self.attack_technique = technique.get("name").and_then(Value::as_str).map(str::to_string);
            self.attack_technique_uid = technique
                .get("uid")
                .map(|v| v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string()));
        }
    }

    /// Serialize this event into the flat JSON document submitted to the bulk indexer,
    /// merging `attributes` at the top level alongside the fixed OCSF fields.
    pub fn to_document(&self) -> Value {
        let mut doc = serde_json::to_value(self).expect("CanonicalEvent always serializes");
        if let (Value::Object(map), attrs) = (&mut doc, &self.attributes) {
            for (k, v) in attrs {
                map.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }
        doc
    }
}
