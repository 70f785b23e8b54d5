//! Upload assembly for `sendFile`.

use axum::body::Bytes;
use reqwest::multipart::{Form, Part};

use crate::telegram::forwarder::ForwardRequest;

/// Bot API send method chosen from the uploaded file's MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Document,
}

impl MediaKind {
    /// `image/*` → photo, `video/*` → video, anything else → document.
    pub fn from_mime(mime: Option<&str>) -> Self {
        let mime = mime.unwrap_or_default().trim().to_ascii_lowercase();
        if mime.starts_with("image/") {
            Self::Photo
        } else if mime.starts_with("video/") {
            Self::Video
        } else {
            Self::Document
        }
    }

    pub fn endpoint(self) -> &'static str {
        match self {
            Self::Photo => "sendPhoto",
            Self::Video => "sendVideo",
            Self::Document => "sendDocument",
        }
    }

    /// Multipart field name the send method expects the file under.
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Photo => "photo",
            Self::Video => "video",
            Self::Document => "document",
        }
    }
}

/// A file received on `POST /api/sendFile`, plus its optional fields.
#[derive(Debug, Clone, Default)]
pub struct FileUpload {
    pub data: Bytes,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub caption: Option<String>,
    pub reply_parameters: Option<String>,
}

impl FileUpload {
    pub fn media_kind(&self) -> MediaKind {
        MediaKind::from_mime(self.content_type.as_deref())
    }

    /// Build the outbound multipart call for `chat_id`.
    /// Empty caption and reply parameters are omitted.
    pub fn into_request(self, chat_id: &str) -> ForwardRequest {
        let kind = self.media_kind();

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part(kind.field_name(), self.file_part());

        if let Some(caption) = self.caption.filter(|c| !c.is_empty()) {
            form = form.text("caption", caption);
        }
        if let Some(reply) = self.reply_parameters.filter(|r| !r.is_empty()) {
            form = form.text("reply_parameters", reply);
        }

        ForwardRequest::multipart(kind.endpoint(), form)
    }

    fn file_part(&self) -> Part {
        let file_name = self
            .file_name
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "file".to_string());
        let part = || {
            Part::stream_with_length(reqwest::Body::from(self.data.clone()), self.data.len() as u64)
                .file_name(file_name.clone())
        };

        match &self.content_type {
            // An unparseable MIME type falls back to reqwest's default.
            Some(mime) => part().mime_str(mime).unwrap_or_else(|_| part()),
            None => part(),
        }
    }
}
