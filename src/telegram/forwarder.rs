//! Forwarding of relay calls to Bot API methods.
//!
//! Every call resolves to a [`ForwardResult`]; the forwarder never returns an
//! error to its caller and never retries.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::Form;
use reqwest::{Client, Method, StatusCode};
use serde_json::{json, Value};

use crate::config::TelegramConfig;
use crate::observability::metrics;
use crate::telegram::describe_error;

/// Body of an outbound call.
pub enum ForwardPayload {
    /// No body; sent as `GET` (the polling read).
    Empty,
    /// JSON object body; sent as `POST` with `application/json`.
    Json(Value),
    /// Multipart body; reqwest sets the boundary content-type.
    Multipart(Form),
}

/// A single outbound call. Constructed per request and consumed by
/// [`Forwarder::forward`].
pub struct ForwardRequest {
    endpoint: String,
    payload: ForwardPayload,
    headers: HeaderMap,
}

impl ForwardRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self::new(endpoint, ForwardPayload::Empty)
    }

    pub fn json(endpoint: impl Into<String>, body: Value) -> Self {
        Self::new(endpoint, ForwardPayload::Json(body))
    }

    pub fn multipart(endpoint: impl Into<String>, form: Form) -> Self {
        Self::new(endpoint, ForwardPayload::Multipart(form))
    }

    fn new(endpoint: impl Into<String>, payload: ForwardPayload) -> Self {
        Self {
            endpoint: endpoint.into(),
            payload,
            headers: HeaderMap::new(),
        }
    }

    /// Add a header to the outbound call.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Endpoint including any query string.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Bot API method name, without the query string.
    pub fn method_name(&self) -> &str {
        self.endpoint
            .split_once('?')
            .map_or(self.endpoint.as_str(), |(name, _)| name)
    }

    fn http_method(&self) -> Method {
        match self.payload {
            ForwardPayload::Empty => Method::GET,
            _ => Method::POST,
        }
    }
}

impl fmt::Debug for ForwardRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload = match &self.payload {
            ForwardPayload::Empty => "empty",
            ForwardPayload::Json(_) => "json",
            ForwardPayload::Multipart(_) => "multipart",
        };
        f.debug_struct("ForwardRequest")
            .field("endpoint", &self.endpoint)
            .field("payload", &payload)
            .field("headers", &self.headers)
            .finish()
    }
}

/// Outcome of a forwarded call.
#[derive(Debug, Clone, PartialEq)]
pub enum ForwardResult {
    /// The remote's JSON response, verbatim.
    Success(Value),
    /// The remote's own error payload, or `{ok: false, description}` when
    /// the remote produced none.
    Failure(Value),
}

impl ForwardResult {
    /// A failure carrying a locally produced description.
    pub fn failure(description: impl fmt::Display) -> Self {
        Self::Failure(json!({
            "ok": false,
            "description": description.to_string(),
        }))
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Apply `f` to the success body; failures pass through untouched.
    pub fn map_success<F>(self, f: F) -> Self
    where
        F: FnOnce(Value) -> Value,
    {
        match self {
            Self::Success(body) => Self::Success(f(body)),
            failure => failure,
        }
    }
}

/// Issues Bot API calls against `{api_url}/bot{token}`.
#[derive(Clone)]
pub struct Forwarder {
    client: Client,
    api_base: Arc<str>,
}

impl Forwarder {
    pub fn new(client: Client, config: &TelegramConfig) -> Self {
        Self {
            client,
            api_base: config.api_base().into(),
        }
    }

    /// Issue exactly one outbound call and normalize its outcome.
    pub async fn forward(&self, request: ForwardRequest) -> ForwardResult {
        let start = Instant::now();
        let method_name = request.method_name().to_string();

        let result = self.dispatch(request).await;

        if let ForwardResult::Failure(error) = &result {
            tracing::error!(
                endpoint = %method_name,
                error = %error,
                "Error forwarding to Telegram endpoint"
            );
        } else {
            tracing::debug!(endpoint = %method_name, "Forwarded to Telegram");
        }
        metrics::record_forward(&method_name, result.is_success(), start);

        result
    }

    async fn dispatch(&self, request: ForwardRequest) -> ForwardResult {
        let url = format!("{}/{}", self.api_base, request.endpoint);
        let builder = self
            .client
            .request(request.http_method(), url)
            .headers(request.headers);

        let builder = match request.payload {
            ForwardPayload::Empty => builder,
            ForwardPayload::Json(body) => builder.json(&body),
            ForwardPayload::Multipart(form) => builder.multipart(form),
        };

        let response = match builder.send().await {
            Ok(response) => response,
            Err(e) => return ForwardResult::failure(describe_error(e)),
        };

        let status = response.status();
        match response.bytes().await {
            Ok(body) => interpret_response(status, &body),
            Err(e) => ForwardResult::failure(describe_error(e)),
        }
    }
}

/// Classify a completed remote response.
///
/// A 2xx JSON body is a success unless it carries `"ok": false`. Any JSON
/// error body is passed through verbatim.
pub(crate) fn interpret_response(status: StatusCode, body: &[u8]) -> ForwardResult {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => {
            let rejected = value.get("ok") == Some(&Value::Bool(false));
            if status.is_success() && !rejected {
                ForwardResult::Success(value)
            } else {
                ForwardResult::Failure(value)
            }
        }
        Err(e) if status.is_success() => {
            ForwardResult::failure(format!("Invalid JSON in Telegram response: {}", e))
        }
        Err(_) => ForwardResult::failure(format!("Request failed with status {}", status)),
    }
}
