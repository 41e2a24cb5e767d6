//! The HEC response envelope and error codes (§6: exact wire shapes).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;

/// `{"text":<string>,"code":<int>,"ackId":<string?>}` (§6).
#[derive(Debug, Serialize)]
pub struct HecResponse {
    text: &'static str,
    code: u8,
    #[serde(rename = "ackId", skip_serializing_if = "Option::is_none")]
    ack_id: Option<String>,
}

impl HecResponse {
    /// `{text:"Success", code:0, ackId?:…}` on full success.
    pub fn success(ack_id: Option<uuid::Uuid>) -> Self {
        Self { text: "Success", code: 0, ack_id: ack_id.map(|id| id.to_string()) }
    }

    fn error(status: StatusCode, text: &'static str, code: u8) -> Response {
        (status, Json(Self { text, code, ack_id: None })).into_response()
    }

    /// Non-POST method at the endpoint. §6 names only codes 0/4/5/6/9; a
    /// malformed request line is treated as the same class as an
    /// unparseable body (code 6), distinguished by its HTTP status.
    pub fn invalid_method() -> Response {
        Self::error(StatusCode::METHOD_NOT_ALLOWED, "Invalid method", 6)
    }

    /// HEC code 4: missing or invalid bearer token.
    pub fn unauthorized() -> Response {
        Self::error(StatusCode::UNAUTHORIZED, "Invalid authorization", 4)
    }

    /// HEC code 5: empty request body.
    pub fn no_data() -> Response {
        Self::error(StatusCode::BAD_REQUEST, "No data", 5)
    }

    /// HEC code 6: body did not parse as JSON/NDJSON.
    pub fn invalid_format() -> Response {
        Self::error(StatusCode::BAD_REQUEST, "Invalid data format", 6)
    }

    /// HEC code 9, HTTP 429: IP or token rate limit exceeded (§4.C step 3).
    pub fn rate_limited() -> Response {
        Self::error(StatusCode::TOO_MANY_REQUESTS, "Server is busy", 9)
    }

    /// HEC code 9, HTTP 503: admission queue full, or the ack reserved for
    /// this request failed before any event enqueued (§4.C step 11).
    pub fn queue_full() -> Response {
        Self::error(StatusCode::SERVICE_UNAVAILABLE, "Server is busy", 9)
    }
}

impl IntoResponse for HecResponse {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
