//! Route handlers for the relay's REST surface.
//!
//! Each handler makes at most one Telegram call and returns exactly one
//! response: 200 on success, 500 with the failure body, 400 for local
//! validation errors.

use std::collections::HashMap;

use axum::{
    extract::{multipart::MultipartRejection, rejection::PathRejection, Multipart, Path, Query, State},
    response::{IntoResponse, Json, Response},
};
use serde_json::{json, Map, Value};
use url::form_urlencoded;

use crate::config::TelegramConfig;
use crate::http::request::{with_chat_id, JsonObject};
use crate::http::response::{bad_request, file_error, stream_file, NO_FILE_UPLOADED};
use crate::http::server::AppState;
use crate::telegram::{
    rewrite_file_path, FileProxyError, FileUpload, ForwardRequest, ForwardResult, RemoteFilePath,
};

/// `GET /api/getUpdates?offset=&timeout=`
pub async fn get_updates(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> ForwardResult {
    let endpoint = updates_endpoint(&state.config.telegram, &params);
    state.forwarder.forward(ForwardRequest::get(endpoint)).await
}

/// `getUpdates?offset=..&timeout=..&allowed_updates=[..]`; offset only when
/// the caller sent one.
fn updates_endpoint(telegram: &TelegramConfig, params: &HashMap<String, String>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    if let Some(offset) = params.get("offset") {
        query.append_pair("offset", offset);
    }
    match params.get("timeout") {
        Some(timeout) => query.append_pair("timeout", timeout),
        None => query.append_pair("timeout", &telegram.default_poll_timeout.to_string()),
    };
    if !telegram.allowed_updates.is_empty() {
        query.append_pair("allowed_updates", &json!(telegram.allowed_updates).to_string());
    }
    format!("getUpdates?{}", query.finish())
}

/// `POST /api/sendMessage`
pub async fn send_message(State(state): State<AppState>, JsonObject(body): JsonObject) -> ForwardResult {
    let payload = with_chat_id(&state.config.telegram.chat_id, body);
    state
        .forwarder
        .forward(ForwardRequest::json("sendMessage", payload))
        .await
}

/// `POST /api/sendFile` (multipart: file, caption?, reply_parameters?)
pub async fn send_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    // A body that is not multipart at all carries no file either.
    let Ok(mut multipart) = multipart else {
        return bad_request(NO_FILE_UPLOADED);
    };

    let mut upload = FileUpload::default();
    let mut has_file = false;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return bad_request(e.body_text()),
        };

        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            // Only a part carrying a filename counts as an uploaded file.
            "file" if field.file_name().is_some() => {
                upload.file_name = field.file_name().map(str::to_string);
                upload.content_type = field.content_type().map(str::to_string);
                match field.bytes().await {
                    Ok(data) => upload.data = data,
                    Err(e) => return bad_request(e.body_text()),
                }
                has_file = true;
            }
            "caption" | "reply_parameters" => {
                let text = match field.text().await {
                    Ok(text) => text,
                    Err(e) => return bad_request(e.body_text()),
                };
                if name == "caption" {
                    upload.caption = Some(text);
                } else {
                    upload.reply_parameters = Some(text);
                }
            }
            _ => {}
        }
    }

    if !has_file {
        return bad_request(NO_FILE_UPLOADED);
    }

    tracing::debug!(
        file_name = ?upload.file_name,
        content_type = ?upload.content_type,
        size = upload.data.len(),
        kind = ?upload.media_kind(),
        "Relaying upload"
    );

    let request = upload.into_request(&state.config.telegram.chat_id);
    state.forwarder.forward(request).await.into_response()
}

/// `POST /api/getFile`; the returned `file_path` points at this relay.
pub async fn get_file(State(state): State<AppState>, JsonObject(body): JsonObject) -> ForwardResult {
    let public_base_url = &state.config.files.public_base_url;
    state
        .forwarder
        .forward(ForwardRequest::json("getFile", Value::Object(body)))
        .await
        .map_success(|body| rewrite_file_path(body, public_base_url))
}

/// `GET /api/file/{*path}`
pub async fn download_file(
    State(state): State<AppState>,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    let path = match path {
        Ok(Path(raw)) => RemoteFilePath::parse(&raw),
        Err(_) => Err(FileProxyError::InvalidPath),
    };
    let path = match path {
        Ok(path) => path,
        Err(e) => {
            tracing::warn!("Rejected file download with invalid path");
            crate::observability::metrics::record_download("rejected", 0);
            return file_error(&e);
        }
    };

    match state.files.open(&path).await {
        Ok(file) => stream_file(file),
        Err(e) => file_error(&e),
    }
}

/// `POST /api/deleteMessage`
///
/// Sends `notificationText` as a new message to the configured chat;
/// `message_id` is accepted but not used and nothing is deleted.
pub async fn delete_message(State(state): State<AppState>, JsonObject(body): JsonObject) -> ForwardResult {
    tracing::debug!(message_id = ?body.get("message_id"), "deleteMessage relays notificationText");

    let mut fields = Map::new();
    if let Some(text) = body.get("notificationText") {
        fields.insert("text".to_string(), text.clone());
    }
    let payload = with_chat_id(&state.config.telegram.chat_id, fields);
    state
        .forwarder
        .forward(ForwardRequest::json("sendMessage", payload))
        .await
}

/// `POST /api/setReaction`
pub async fn set_reaction(State(state): State<AppState>, JsonObject(body): JsonObject) -> ForwardResult {
    let payload = with_chat_id(&state.config.telegram.chat_id, body);
    state
        .forwarder
        .forward(ForwardRequest::json("setMessageReaction", payload))
        .await
}

/// `GET /api/file/` with nothing to fetch.
pub async fn download_without_path() -> Response {
    crate::observability::metrics::record_download("rejected", 0);
    file_error(&FileProxyError::InvalidPath)
}

/// `GET /healthz`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
