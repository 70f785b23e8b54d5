//! Request handling: request IDs and body extraction.
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - JSON bodies are read regardless of the declared content-type
//! - Extraction failures answer 400 with a `{ok, description}` body

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::HeaderValue,
    response::Response,
};
use serde_json::{Map, Value};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::response::bad_request;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Generates UUID v4 request IDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuid;

impl MakeRequestId for MakeRequestUuid {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Request ID of an inbound request, or `"unknown"`.
pub fn request_id<B>(request: &axum::http::Request<B>) -> &str {
    request
        .headers()
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// A request body parsed as a JSON object. An empty body is `{}`.
#[derive(Debug, Clone, Default)]
pub struct JsonObject(pub Map<String, Value>);

impl<S> FromRequest<S> for JsonObject
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| bad_request(e.body_text()))?;
        parse_json_object(&bytes).map(JsonObject).map_err(bad_request)
    }
}

pub fn parse_json_object(bytes: &[u8]) -> Result<Map<String, Value>, String> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Map::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err("Request body must be a JSON object.".to_string()),
        Err(e) => Err(format!("Malformed JSON body: {}", e)),
    }
}

/// `{chat_id}` followed by the caller's fields; a caller-supplied `chat_id`
/// wins.
pub fn with_chat_id(chat_id: &str, fields: Map<String, Value>) -> Value {
    let mut merged = Map::with_capacity(fields.len() + 1);
    merged.insert("chat_id".to_string(), Value::String(chat_id.to_string()));
    merged.extend(fields);
    Value::Object(merged)
}
