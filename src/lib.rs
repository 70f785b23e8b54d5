//! Telegram Bot API relay library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod telegram;

pub use config::schema::RelayConfig;
pub use http::RelayServer;
pub use lifecycle::Shutdown;
