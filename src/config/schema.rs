//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the relay.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A credential that must never reach logs or client responses.
///
/// `Debug` and `Display` are redacted; use [`Secret::expose`] only where the
/// value is placed into an outbound request.
#[derive(Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Secret(<empty>)")
        } else {
            f.write_str("Secret(***)")
        }
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("***")
    }
}

/// Root configuration for the relay.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RelayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Telegram Bot API credentials and endpoints.
    pub telegram: TelegramConfig,

    /// File download rewriting.
    pub files: FilesConfig,

    /// Inbound HTTP surface settings.
    pub http: HttpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot access token. Embedded in every outbound URL.
    pub token: Secret,

    /// Destination chat injected into every outbound message.
    pub chat_id: String,

    /// Bot API origin, without the `/bot<token>` suffix.
    pub api_url: String,

    /// Update kinds requested by `getUpdates`.
    pub allowed_updates: Vec<String>,

    /// Long-poll timeout used when the caller does not pass one.
    pub default_poll_timeout: u64,

    /// Optional outbound connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,

    /// User-Agent sent to Telegram.
    pub user_agent: String,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            token: Secret::default(),
            chat_id: String::new(),
            api_url: "https://api.telegram.org".to_string(),
            allowed_updates: vec!["message".to_string(), "message_reaction".to_string()],
            default_poll_timeout: 25,
            connect_timeout_secs: None,
            user_agent: concat!("telegram-relay/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl TelegramConfig {
    /// Base URL for Bot API methods: `{api_url}/bot{token}`.
    pub fn api_base(&self) -> String {
        format!(
            "{}/bot{}",
            self.api_url.trim_end_matches('/'),
            self.token.expose()
        )
    }

    /// Base URL for file downloads: `{api_url}/file/bot{token}`.
    pub fn file_base(&self) -> String {
        format!(
            "{}/file/bot{}",
            self.api_url.trim_end_matches('/'),
            self.token.expose()
        )
    }
}

/// File path rewriting.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct FilesConfig {
    /// Public origin of this relay (e.g., "https://relay.example.com").
    /// Empty keeps rewritten paths host-relative.
    pub public_base_url: String,
}

/// Inbound HTTP settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Maximum request body size in bytes (uploads included).
    pub max_body_size: usize,

    /// Allow cross-origin requests from any origin.
    pub cors_enabled: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            max_body_size: 50 * 1024 * 1024, // Bot API upload ceiling
            cors_enabled: true,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
