//! Response mapping.
//!
//! # Design Decisions
//! - Forward results map to 200 (success) or 500 (failure) with JSON bodies
//! - Local validation failures are 400 with `{ok: false, description}`
//! - File downloads stream the upstream body; their failures are plain text

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde_json::json;

use crate::telegram::{FileProxyError, ForwardResult, StreamedFile};

pub const NO_FILE_UPLOADED: &str = "No file uploaded.";
pub const FILE_FETCH_FAILED: &str = "Failed to fetch file.";
pub const INVALID_FILE_PATH: &str = "Invalid file path.";

impl IntoResponse for ForwardResult {
    fn into_response(self) -> Response {
        match self {
            ForwardResult::Success(body) => (StatusCode::OK, Json(body)).into_response(),
            ForwardResult::Failure(body) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
            }
        }
    }
}

pub fn bad_request(description: impl Into<String>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({ "ok": false, "description": description.into() })),
    )
        .into_response()
}

pub fn file_error(err: &FileProxyError) -> Response {
    match err {
        FileProxyError::InvalidPath => (StatusCode::BAD_REQUEST, INVALID_FILE_PATH).into_response(),
        FileProxyError::Transport(_) | FileProxyError::UpstreamStatus(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, FILE_FETCH_FAILED).into_response()
        }
    }
}

/// Stream an open download to the client with its content-type.
pub fn stream_file(file: StreamedFile) -> Response {
    let mut builder = Response::builder().status(StatusCode::OK);
    if let Some(content_type) = file.content_type() {
        builder = builder.header(header::CONTENT_TYPE, content_type.clone());
    }
    if let Some(length) = file.content_length() {
        builder = builder.header(header::CONTENT_LENGTH, length);
    }

    match builder.body(Body::from_stream(file.into_stream())) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(error = %e, "Failed to build file response");
            (StatusCode::INTERNAL_SERVER_ERROR, FILE_FETCH_FAILED).into_response()
        }
    }
}
