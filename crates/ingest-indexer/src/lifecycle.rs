//! Index Lifecycle (§4.K): idempotent startup setup of the index template,
//! retention policy, and write alias against the downstream store.

use chrono::Utc;
use serde_json::{json, Value};

use crate::error::IndexerError;

/// Retention/rollover configuration (§4.K defaults).
#[derive(Debug, Clone)]
pub struct RetentionConfig {
    /// Roll over the hot index once it reaches this size, in bytes (default 50 GB).
    pub rollover_max_size_bytes: u64,
    /// Roll over the hot index once it reaches this age (default 24h).
    pub rollover_max_age: chrono::Duration,
    /// Delete indices once this many days old (default 30).
    pub retention_days: u32,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            rollover_max_size_bytes: 50 * 1024 * 1024 * 1024,
            rollover_max_age: chrono::Duration::hours(24),
            retention_days: 30,
        }
    }
}

/// Manages the template, retention policy, and write alias for one index prefix.
pub struct IndexLifecycle {
    client: reqwest::Client,
    base_url: String,
    prefix: String,
    retention: RetentionConfig,
}

impl IndexLifecycle {
    /// `prefix` names the index family, e.g. `telhawk-events`.
    pub fn new(client: reqwest::Client, base_url: &str, prefix: &str, retention: RetentionConfig) -> Self {
        Self { client, base_url: base_url.trim_end_matches('/').to_string(), prefix: prefix.to_string(), retention }
    }

    /// The write alias name, e.g. `telhawk-events-write`.
    pub fn write_alias(&self) -> String {
        format!("{}-write", self.prefix)
    }

    /// Create/update the OCSF-aware index template (§4.K).
    pub async fn ensure_template(&self) -> Result<(), IndexerError> {
        let template_name = format!("{}-template", self.prefix);
        let body = json!({
            "index_patterns": [format!("{}-*", self.prefix)],
            "template": {
                "mappings": {
                    "properties": {
                        "time": {"type": "date"},
                        "@timestamp": {"type": "date"},
                        "class_uid": {"type": "integer"},
                        "category_uid": {"type": "integer"},
                        "type_uid": {"type": "long"},
                        "activity_id": {"type": "integer"},
                        "severity_id": {"type": "integer"},
                        "raw": {"type": "object", "enabled": false},
                        "attacks": {"type": "nested"},
                        "answers": {"type": "nested"},
                        "resources": {"type": "nested"},
                        "src_endpoint": {"properties": {"ip": {"type": "ip"}}},
                        "dst_endpoint": {"properties": {"ip": {"type": "ip"}}}
                    },
                    "dynamic_templates": [{
                        "strings_as_text_with_keyword": {
                            "match_mapping_type": "string",
                            "mapping": {
                                "type": "text",
                                "fields": {"keyword": {"type": "keyword", "ignore_above": 256}}
                            }
                        }
                    }]
                }
            }
        });
        self.put(&format!("_index_template/{template_name}"), &body).await
    }

    /// Create/update the hot/delete retention policy (§4.K).
    pub async fn ensure_retention_policy(&self) -> Result<(), IndexerError> {
        let policy_name = format!("{}-retention", self.prefix);
        let body = json!({
            "policy": {
                "phases": {
                    "hot": {
                        "actions": {
                            "rollover": {
                                "max_size": format!("{}gb", self.retention.rollover_max_size_bytes / (1024 * 1024 * 1024)),
                                "max_age": format!("{}h", self.retention.rollover_max_age.num_hours())
                            }
                        }
                    },
                    "delete": {
                        "min_age": format!("{}d", self.retention.retention_days),
                        "actions": {"delete": {}}
                    }
                }
            }
        });
        self.put(&format!("_ilm/policy/{policy_name}"), &body).await
    }

    /// Ensure the write alias points at exactly one index with
    /// `is_write_index: true`, creating the initial index if the alias has
    /// no members yet (§4.K).
    pub async fn ensure_write_alias(&self) -> Result<(), IndexerError> {
        let alias = self.write_alias();
        let exists = self
            .client
            .head(format!("{}/{}", self.base_url, alias))
            .send()
            .await
            .map_err(|err| IndexerError::Retryable(err.to_string()))?
            .status()
            .is_success();
        if exists {
            return Ok(());
        }

        let initial_index = format!("{}-{}-000001", self.prefix, Utc::now().format("%Y.%m.%d"));
        let body = json!({"aliases": {alias.clone(): {"is_write_index": true}}});
        self.put(&initial_index, &body).await
    }

    /// Roll over the write alias to a freshly created index, atomically
    /// reassigning `is_write_index` (§4.K).
    pub async fn rollover(&self, current_index: &str, next_index: &str) -> Result<(), IndexerError> {
        let alias = self.write_alias();
        let body = json!({
            "actions": [
                {"remove": {"index": current_index, "alias": alias, "is_write_index": true}},
                {"add": {"index": next_index, "alias": alias, "is_write_index": true}}
            ]
        });
        self.post("_aliases", &body).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<(), IndexerError> {
        let response = self
            .client
            .put(format!("{}/{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|err| IndexerError::Retryable(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(IndexerError::from_status(status.as_u16(), text))
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<(), IndexerError> {
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|err| IndexerError::Retryable(err.to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(IndexerError::from_status(status.as_u16(), text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_alias_is_suffixed() {
        let lifecycle = IndexLifecycle::new(reqwest::Client::new(), "http://localhost:9200", "telhawk-events", RetentionConfig::default());
        assert_eq!(lifecycle.write_alias(), "telhawk-events-write");
    }

    #[test]
    fn default_retention_matches_spec_defaults() {
        let retention = RetentionConfig::default();
        assert_eq!(retention.rollover_max_size_bytes, 50 * 1024 * 1024 * 1024);
        assert_eq!(retention.rollover_max_age.num_hours(), 24);
        assert_eq!(retention.retention_days, 30);
    }
}
