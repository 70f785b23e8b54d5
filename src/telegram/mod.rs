//! Telegram Bot API relay primitives.
//!
//! # Data Flow
//! ```text
//! route handler
//!     → forwarder.rs (one call to {api_url}/bot{token}/{endpoint})
//!     → ForwardResult::Success | ForwardResult::Failure
//!
//! GET /api/file/{path}
//!     → file_proxy.rs (streaming GET to {api_url}/file/bot{token}/{path})
//!     → StreamedFile → response body
//! ```
//!
//! # Security Constraints
//! - The bot token lives only inside the base URLs held here
//! - Transport errors are rendered without their request URL
//! - File paths handed to clients are relay-relative

pub mod file_proxy;
pub mod forwarder;
pub mod media;

pub use file_proxy::{rewrite_file_path, FileProxy, FileProxyError, RemoteFilePath, StreamedFile};
pub use forwarder::{ForwardPayload, ForwardRequest, ForwardResult, Forwarder};
pub use media::{FileUpload, MediaKind};

/// Render a reqwest error and its sources without the request URL.
pub(crate) fn describe_error(err: reqwest::Error) -> String {
    use std::error::Error as _;

    let err = err.without_url();
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
