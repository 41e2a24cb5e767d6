//! The Bulk Indexer (§4.I): batches canonical events, submits them to the
//! downstream store's write alias, and classifies failures as
//! retryable-with-backoff or terminal.

use serde_json::Value;
use uuid::Uuid;

use crate::error::IndexerError;
use crate::retry::retry_with_backoff;

const DEBUG_DUMP_ENV: &str = "INGEST_INDEXER_DEBUG_DUMP";

/// Outcome for a single document within a submitted batch.
#[derive(Debug, Clone)]
pub struct DocumentOutcome {
    /// The canonical event's stable id.
    pub event_id: Uuid,
    /// `None` on success; the store's per-document error otherwise.
    pub error: Option<String>,
}

/// Result of one successful (transport-level) bulk submission. Per-document
/// failures are carried here rather than as an `Err` — a batch with some
/// failed documents still returns `Ok` (§4.I).
#[derive(Debug, Default)]
pub struct BulkIndexResult {
    /// One entry per submitted document, in submission order.
    pub outcomes: Vec<DocumentOutcome>,
}

impl BulkIndexResult {
    /// Documents that the store accepted.
    pub fn succeeded(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_none())
    }

    /// Documents the store rejected individually.
    pub fn failed(&self) -> impl Iterator<Item = &DocumentOutcome> {
        self.outcomes.iter().filter(|o| o.error.is_some())
    }
}

/// Submits batches of canonical-event documents to the downstream store's
/// `_bulk` endpoint, routed through its write alias.
pub struct BulkIndexer {
    client: reqwest::Client,
    bulk_url: String,
    debug_dump: bool,
}

impl BulkIndexer {
    /// `base_url` is the store's root (e.g. `http://search:9200`);
    /// `write_alias` is the alias ensured by [`crate::IndexLifecycle`].
    pub fn new(client: reqwest::Client, base_url: &str, write_alias: &str) -> Self {
        let bulk_url = format!("{}/{}/_bulk", base_url.trim_end_matches('/'), write_alias);
        let debug_dump = std::env::var(DEBUG_DUMP_ENV).is_ok();
        Self { client, bulk_url, debug_dump }
    }

    /// Submit one batch, retrying transport-level failures with backoff
    /// (§4.I). `documents` pairs each canonical event's id with its
    /// serialized document body.
    pub async fn submit(&self, documents: &[(Uuid, Value)]) -> Result<BulkIndexResult, IndexerError> {
        if documents.is_empty() {
            return Ok(BulkIndexResult::default());
        }

        let body = self.build_ndjson(documents);
        if self.debug_dump {
            tracing::info!(target: "ingest_indexer::debug_dump", body = %body, "bulk request body");
        }

        let response_body = retry_with_backoff(|| {
            let body = body.clone();
            async move {
                let response = self
                    .client
                    .post(&self.bulk_url)
                    .header("content-type", "application/x-ndjson")
                    .body(body)
                    .send()
                    .await
                    .map_err(|err| IndexerError::Retryable(err.to_string()))?;

                let status = response.status();
                let text = response.text().await.map_err(|err| IndexerError::Retryable(err.to_string()))?;
                if !status.is_success() {
                    return Err(IndexerError::from_status(status.as_u16(), text));
                }
                Ok(text)
            }
        })
        .await?;

        parse_bulk_response(documents, &response_body)
    }

    fn build_ndjson(&self, documents: &[(Uuid, Value)]) -> String {
        let mut body = String::new();
        for (id, doc) in documents {
            body.push_str(&serde_json::json!({"index": {"_id": id.to_string()}}).to_string());
            body.push('\n');
            body.push_str(&doc.to_string());
            body.push('\n');
        }
        body
    }
}

/// Parse an Elasticsearch-shaped `_bulk` response into per-document outcomes.
/// Malformed responses are treated as every document failing with the raw
/// body as the error, rather than surfaced as a transport error — the HTTP
/// call itself already succeeded.
fn parse_bulk_response(documents: &[(Uuid, Value)], body: &str) -> Result<BulkIndexResult, IndexerError> {
    let parsed: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            return Ok(BulkIndexResult {
                outcomes: documents
                    .iter()
                    .map(|(id, _)| DocumentOutcome { event_id: *id, error: Some(body.to_string()) })
                    .collect(),
            })
        }
    };

    let items = parsed.get("items").and_then(Value::as_array);
    let outcomes = documents
        .iter()
        .enumerate()
        .map(|(index, (id, _))| {
            let error = items
                .and_then(|items| items.get(index))
                .and_then(|item| item.get("index"))
                .and_then(|action| action.get("error"))
                .map(|err| err.to_string());
            DocumentOutcome { event_id: *id, error }
        })
        .collect();

    Ok(BulkIndexResult { outcomes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_per_document_errors_from_bulk_response() {
        let id_ok = Uuid::new_v4();
        let id_bad = Uuid::new_v4();
        let documents = vec![(id_ok, serde_json::json!({})), (id_bad, serde_json::json!({}))];
        let body = serde_json::json!({
            "errors": true,
            "items": [
                {"index": {"_id": id_ok.to_string(), "status": 201}},
                {"index": {"_id": id_bad.to_string(), "status": 400, "error": {"type": "mapper_parsing_exception"}}}
            ]
        })
        .to_string();

        let result = parse_bulk_response(&documents, &body).unwrap();
        assert_eq!(result.succeeded().count(), 1);
        assert_eq!(result.failed().count(), 1);
    }

    #[test]
    fn malformed_response_fails_every_document() {
        let documents = vec![(Uuid::new_v4(), serde_json::json!({}))];
        let result = parse_bulk_response(&documents, "not json").unwrap();
        assert_eq!(result.failed().count(), 1);
    }

    #[test]
    fn empty_batch_is_a_noop() {
        let result = parse_bulk_response(&[], "{}").unwrap();
        assert!(result.outcomes.is_empty());
    }
}
