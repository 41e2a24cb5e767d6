//! The HEC HTTP surface (§4.C, §6): `/services/collector/{event,raw,health,ack}`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Query, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Json, Response};
use ingest_ratelimit::{allow_or_fail_open, RateLimitKey};
use ingest_types::RawEnvelope;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::hec::auth::extract_token;
use crate::hec::event::{envelope_from_raw, envelope_from_wrapper, parse_event_body};
use crate::hec::ip::source_ip;
use crate::hec::response::HecResponse;
use crate::state::AppState;
use crate::worker::QueuedEnvelope;

const CHANNEL_HEADER: &str = "x-splunk-request-channel";

/// Outcome of the shared admission checks (§4.C steps 2-6), common to both
/// `/event` and `/raw`.
struct Admitted {
    source_ip: std::net::IpAddr,
    token_id: String,
    tenant_id: String,
}

/// Rate-limit (IP), authenticate, then rate-limit (token). Returns the
/// HEC error response to send immediately on any rejection.
async fn admit(state: &AppState, headers: &HeaderMap, addr: SocketAddr) -> Result<Admitted, Response> {
    let ip = source_ip(headers, addr.ip());

    let ip_decision = allow_or_fail_open(state.ip_limiter.as_ref(), &RateLimitKey::Ip(ip)).await;
    if !ip_decision.is_allowed() {
        state.metrics.rate_limit_hits_total.with_label_values(&["ip"]).inc();
        return Err(HecResponse::rate_limited());
    }

    let Some(token) = extract_token(headers) else {
        return Err(HecResponse::unauthorized());
    };

    let validated = match ingest_auth::validate(state.credential_validator.as_deref(), &token).await {
        Ok(entry) => entry,
        Err(_) => return Err(HecResponse::unauthorized()),
    };

    let token_decision =
        allow_or_fail_open(state.token_limiter.as_ref(), &RateLimitKey::Token(validated.token_id.clone())).await;
    if !token_decision.is_allowed() {
        state.metrics.rate_limit_hits_total.with_label_values(&[&validated.token_id]).inc();
        return Err(HecResponse::rate_limited());
    }

    Ok(Admitted { source_ip: ip, token_id: validated.token_id, tenant_id: validated.tenant_id })
}

/// Enqueue every envelope for this request, reserving an ack if requested
/// (§4.C steps 7/11). Returns the success response, or the failure response
/// if any envelope could not be admitted.
async fn enqueue_and_respond(
    state: &AppState,
    endpoint: &'static str,
    headers: &HeaderMap,
    admitted: Admitted,
    envelopes: Vec<RawEnvelope>,
    body_len: usize,
) -> Response {
    let envelopes: Vec<RawEnvelope> = envelopes
        .into_iter()
        .map(|mut e| {
            e.source_ip = Some(admitted.source_ip.to_string());
            e.with_auth(admitted.token_id.clone(), admitted.tenant_id.clone())
        })
        .collect();

    let ack_requested = headers.contains_key(CHANNEL_HEADER) && state.config.ack.enabled;
    let ack_id = ack_requested.then(|| state.ack.create(envelopes.iter().map(|e| e.id).collect()));

    for envelope in envelopes {
        let event_id = envelope.id;
        if let Err(_err) = state.queue.try_enqueue(QueuedEnvelope { envelope, ack_id }) {
            state.metrics.events_total.with_label_values(&[endpoint, "queue_full"]).inc();
            if let Some(ack_id) = ack_id {
                state.ack.fail_event(ack_id, event_id);
            }
            return HecResponse::queue_full();
        }
        state.metrics.events_total.with_label_values(&[endpoint, "accepted"]).inc();
    }

    state.metrics.event_bytes_total.inc_by(body_len as f64);
    state.stats.record(&admitted.token_id, admitted.source_ip);

    HecResponse::success(ack_id).into_response()
}

/// `POST /services/collector/event`.
pub async fn collector_event(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let admitted = match admit(&state, &headers, addr).await {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    if body.is_empty() {
        return HecResponse::no_data();
    }

    let Ok(events) = parse_event_body(&body) else {
        return HecResponse::invalid_format();
    };

    let envelopes = events.into_iter().map(envelope_from_wrapper).collect();
    enqueue_and_respond(&state, "event", &headers, admitted, envelopes, body.len()).await
}

/// Query parameters accepted by `/services/collector/raw` (§4.C step 9).
#[derive(Debug, Deserialize, Default)]
pub struct RawQuery {
    source: Option<String>,
    sourcetype: Option<String>,
    host: Option<String>,
}

fn header_or(headers: &HeaderMap, name: &str, fallback: Option<String>) -> String {
    fallback
        .or_else(|| headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string))
        .unwrap_or_default()
}

/// `POST /services/collector/raw`.
pub async fn collector_raw(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(query): Query<RawQuery>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Response {
    let admitted = match admit(&state, &headers, addr).await {
        Ok(a) => a,
        Err(resp) => return resp,
    };

    if body.is_empty() {
        return HecResponse::no_data();
    }

    let source = header_or(&headers, "x-splunk-request-source", query.source);
    let sourcetype = header_or(&headers, "x-splunk-request-sourcetype", query.sourcetype);
    let host = header_or(&headers, "x-splunk-request-host", query.host);

    let envelope = envelope_from_raw(&body, source, sourcetype, host);
    enqueue_and_respond(&state, "raw", &headers, admitted, vec![envelope], body.len()).await
}

/// `GET /services/collector/health`.
pub async fn collector_health() -> Response {
    Json(json!({"status": "healthy"})).into_response()
}

#[derive(Debug, Deserialize)]
pub(crate) struct AckQuery {
    acks: Vec<Uuid>,
}

/// `POST /services/collector/ack`: body `{"acks":[...]}` (§6).
pub async fn collector_ack(State(state): State<Arc<AppState>>, Json(query): Json<AckQuery>) -> Response {
    let result = state.ack.query(&query.acks);
    let acks: serde_json::Map<String, serde_json::Value> =
        query.acks.iter().map(|id| (id.to_string(), json!(result.get(id).copied().unwrap_or(false)))).collect();
    Json(json!({ "acks": acks })).into_response()
}
