//! Streaming relay for Telegram file downloads.
//!
//! # Path rewriting
//! ```text
//! getFile result.file_path   "docs/file_1.pdf"          (remote-relative)
//!     → to_relay_path        "/api/file/docs/file_1.pdf" (handed to clients)
//!     → GET /api/file/{*path}
//!     → FileProxy::open      {api_url}/file/bot{token}/docs/file_1.pdf
//! ```
//!
//! The token-bearing URL only ever exists inside [`FileProxy::open`].

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::body::Bytes;
use futures_util::stream::{BoxStream, Stream, StreamExt};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use thiserror::Error;

use crate::config::TelegramConfig;
use crate::observability::metrics;
use crate::telegram::describe_error;

/// Route prefix under which the relay serves proxied files.
pub const FILE_ROUTE_PREFIX: &str = "/api/file";

#[derive(Debug, Error)]
pub enum FileProxyError {
    #[error("invalid file path")]
    InvalidPath,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("upstream responded with status {0}")]
    UpstreamStatus(StatusCode),
}

/// A file path relative to the Bot API file endpoint, e.g. `docs/file_1.pdf`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFilePath(String);

impl RemoteFilePath {
    /// Accept only plain relative paths: no empty, `.` or `..` segments,
    /// no backslashes, query or fragment delimiters.
    pub fn parse(raw: &str) -> Result<Self, FileProxyError> {
        if raw.is_empty() || raw.starts_with('/') {
            return Err(FileProxyError::InvalidPath);
        }
        if raw.contains(['\\', '?', '#']) || raw.chars().any(char::is_control) {
            return Err(FileProxyError::InvalidPath);
        }
        if raw
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..")
        {
            return Err(FileProxyError::InvalidPath);
        }
        Ok(Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path under this relay's file route, optionally prefixed with the
    /// relay's public origin.
    pub fn to_relay_path(&self, public_base_url: &str) -> String {
        format!(
            "{}{}/{}",
            public_base_url.trim_end_matches('/'),
            FILE_ROUTE_PREFIX,
            self.0
        )
    }
}

/// Rewrite `result.file_path` of a `getFile` response to its relay-relative
/// form. Bodies without a usable path are left as they are.
pub fn rewrite_file_path(mut body: Value, public_base_url: &str) -> Value {
    let Some(raw) = body.pointer("/result/file_path").and_then(Value::as_str) else {
        return body;
    };

    match RemoteFilePath::parse(raw) {
        Ok(path) => {
            let relay_path = path.to_relay_path(public_base_url);
            if let Some(slot) = body.pointer_mut("/result/file_path") {
                *slot = Value::String(relay_path);
            }
        }
        Err(_) => tracing::warn!(file_path = %raw, "Telegram returned an unexpected file path"),
    }
    body
}

/// Opens streaming downloads against `{api_url}/file/bot{token}`.
#[derive(Clone)]
pub struct FileProxy {
    client: Client,
    file_base: Arc<str>,
}

impl FileProxy {
    pub fn new(client: Client, config: &TelegramConfig) -> Self {
        Self {
            client,
            file_base: config.file_base().into(),
        }
    }

    /// Open the upstream download. Only response headers are awaited; the
    /// body is pulled as the returned stream is polled.
    pub async fn open(&self, path: &RemoteFilePath) -> Result<StreamedFile, FileProxyError> {
        let url = format!("{}/{}", self.file_base, path.as_str());

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                let message = describe_error(e);
                tracing::error!(path = %path.as_str(), error = %message, "File download failed");
                metrics::record_download("upstream_error", 0);
                return Err(FileProxyError::Transport(message));
            }
        };

        let status = response.status();
        if !status.is_success() {
            tracing::error!(path = %path.as_str(), status = %status, "File download rejected by Telegram");
            metrics::record_download("upstream_error", 0);
            return Err(FileProxyError::UpstreamStatus(status));
        }

        Ok(StreamedFile {
            content_type: response.headers().get(CONTENT_TYPE).cloned(),
            content_length: response.content_length(),
            path: path.clone(),
            response,
        })
    }
}

/// An open upstream download. Dropping it closes the upstream connection.
pub struct StreamedFile {
    content_type: Option<HeaderValue>,
    content_length: Option<u64>,
    path: RemoteFilePath,
    response: reqwest::Response,
}

impl StreamedFile {
    pub fn content_type(&self) -> Option<&HeaderValue> {
        self.content_type.as_ref()
    }

    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Hand the body over as a byte stream.
    pub fn into_stream(self) -> RelayStream {
        RelayStream {
            inner: self.response.bytes_stream().boxed(),
            path: self.path,
            relayed: 0,
            finished: false,
        }
    }
}

/// Upstream body relayed chunk by chunk.
///
/// The upstream response is owned here, so it is released when the stream
/// ends, fails, or is dropped because the client went away.
pub struct RelayStream {
    inner: BoxStream<'static, reqwest::Result<Bytes>>,
    path: RemoteFilePath,
    relayed: u64,
    finished: bool,
}

impl Stream for RelayStream {
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = &mut *self;
        if this.finished {
            return Poll::Ready(None);
        }

        match this.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(chunk))) => {
                this.relayed += chunk.len() as u64;
                Poll::Ready(Some(Ok(chunk)))
            }
            Poll::Ready(Some(Err(e))) => {
                this.finished = true;
                let message = describe_error(e);
                tracing::error!(
                    path = %this.path.as_str(),
                    relayed_bytes = this.relayed,
                    error = %message,
                    "Upstream failed mid-download; response truncated"
                );
                metrics::record_download("upstream_error", this.relayed);
                Poll::Ready(Some(Err(std::io::Error::other(message))))
            }
            Poll::Ready(None) => {
                this.finished = true;
                metrics::record_download("completed", this.relayed);
                Poll::Ready(None)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for RelayStream {
    fn drop(&mut self) {
        if !self.finished {
            tracing::debug!(
                path = %self.path.as_str(),
                relayed_bytes = self.relayed,
                "Client went away; closing upstream download"
            );
            metrics::record_download("aborted", self.relayed);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::stream;
    use serde_json::json;

    #[test]
    fn parses_plain_paths() {
        assert_eq!(
            RemoteFilePath::parse("docs/file_1.pdf").unwrap().as_str(),
            "docs/file_1.pdf"
        );
        assert!(RemoteFilePath::parse("photos/file_0.jpg").is_ok());
    }

    #[test]
    fn rejects_suspicious_paths() {
        for raw in [
            "",
            "/etc/passwd",
            "../bot123/getMe",
            "docs/../../x",
            "docs/./x",
            "docs//x",
            "docs\\x",
            "docs/x?token=1",
            "docs/x#frag",
            "docs/\nx",
        ] {
            assert!(
                matches!(RemoteFilePath::parse(raw), Err(FileProxyError::InvalidPath)),
                "{:?} should be rejected",
                raw
            );
        }
    }

    #[test]
    fn relay_path_uses_file_route() {
        let path = RemoteFilePath::parse("docs/file_1.pdf").unwrap();
        assert_eq!(path.to_relay_path(""), "/api/file/docs/file_1.pdf");
        assert_eq!(
            path.to_relay_path("https://relay.example.com/"),
            "https://relay.example.com/api/file/docs/file_1.pdf"
        );
    }

    #[test]
    fn rewrites_get_file_result() {
        let body = json!({
            "ok": true,
            "result": {"file_id": "abc", "file_size": 10, "file_path": "docs/file_1.pdf"}
        });
        let rewritten = rewrite_file_path(body, "");
        assert_eq!(rewritten["result"]["file_path"], "/api/file/docs/file_1.pdf");
        assert_eq!(rewritten["result"]["file_id"], "abc");
        assert_eq!(rewritten["result"]["file_size"], 10);
    }

    #[test]
    fn leaves_bodies_without_path_alone() {
        let body = json!({"ok": true, "result": {"file_id": "abc"}});
        assert_eq!(rewrite_file_path(body.clone(), ""), body);

        let odd = json!({"ok": true, "result": {"file_path": "../x"}});
        assert_eq!(rewrite_file_path(odd.clone(), ""), odd);
    }

    #[tokio::test]
    async fn relay_stream_counts_bytes_and_stops_after_end() {
        let chunks: Vec<reqwest::Result<Bytes>> =
            vec![Ok(Bytes::from_static(b"abc")), Ok(Bytes::from_static(b"de"))];
        let mut relay = RelayStream {
            inner: stream::iter(chunks).boxed(),
            path: RemoteFilePath::parse("a/b").unwrap(),
            relayed: 0,
            finished: false,
        };

        let mut collected = Vec::new();
        while let Some(chunk) = relay.next().await {
            collected.extend_from_slice(&chunk.unwrap());
        }

        assert_eq!(collected, b"abcde");
        assert_eq!(relay.relayed, 5);
        assert!(relay.next().await.is_none());
    }
}
