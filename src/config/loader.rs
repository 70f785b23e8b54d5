//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{RelayConfig, Secret};
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply environment
/// overrides and validate the result.
pub fn load_config(path: Option<&Path>) -> Result<RelayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => parse_config(&fs::read_to_string(path)?)?,
        None => RelayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Parse a TOML document into a config. Missing sections take defaults.
pub fn parse_config(content: &str) -> Result<RelayConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

/// Overlay environment variables onto `config`.
///
/// Empty values are ignored. `RELAY_BIND_ADDRESS` wins over `PORT`.
pub fn apply_env_overrides<F>(config: &mut RelayConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

    if let Some(token) = get("TELEGRAM_TOKEN") {
        config.telegram.token = Secret::new(token.trim());
    }
    if let Some(chat_id) = get("TELEGRAM_CHAT_ID") {
        config.telegram.chat_id = chat_id.trim().to_string();
    }
    if let Some(api_url) = get("TELEGRAM_API_URL") {
        config.telegram.api_url = api_url;
    }

    if let Some(bind) = get("RELAY_BIND_ADDRESS") {
        config.listener.bind_address = bind;
    } else if let Some(port) = get("PORT") {
        config.listener.bind_address = format!("0.0.0.0:{}", port.trim());
    }
}
