//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! relay.toml (optional)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (TELEGRAM_TOKEN, TELEGRAM_CHAT_ID, ...)
//!     → validation.rs (semantic checks)
//!     → RelayConfig (validated, immutable)
//!     → shared via Arc with the forwarder, file proxy and handlers
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup and never reloaded
//! - All fields have defaults so the relay can run from environment alone
//! - Missing credentials are reported, not rejected: the relay still starts

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::{
    FilesConfig, HttpConfig, ListenerConfig, LogFormat, ObservabilityConfig, RelayConfig, Secret,
    TelegramConfig,
};
pub use validation::{missing_credentials, validate_config, ValidationError};
