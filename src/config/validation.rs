//! Configuration validation.
//!
//! Returns all validation errors, not just the first. Missing Telegram
//! credentials are deliberately not errors: [`missing_credentials`] reports
//! them so startup can log a critical warning and keep serving.

use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::RelayConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not host:port")]
    InvalidBindAddress(String),

    #[error("telegram.api_url '{url}' is invalid: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("files.public_base_url '{url}' is invalid: {reason}")]
    InvalidPublicBaseUrl { url: String, reason: String },

    #[error("http.max_body_size must be greater than zero")]
    ZeroBodyLimit,

    #[error("observability.metrics_address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if !is_host_port(&config.listener.bind_address) {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if let Err(reason) = check_http_url(&config.telegram.api_url) {
        errors.push(ValidationError::InvalidApiUrl {
            url: config.telegram.api_url.clone(),
            reason,
        });
    }

    let public = &config.files.public_base_url;
    if !public.is_empty() {
        if let Err(reason) = check_http_url(public) {
            errors.push(ValidationError::InvalidPublicBaseUrl {
                url: public.clone(),
                reason,
            });
        }
    }

    if config.http.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Names of the required Telegram settings that are not set.
pub fn missing_credentials(config: &RelayConfig) -> Vec<&'static str> {
    let mut missing = Vec::new();
    if config.telegram.token.is_empty() {
        missing.push("TELEGRAM_TOKEN");
    }
    if config.telegram.chat_id.is_empty() {
        missing.push("TELEGRAM_CHAT_ID");
    }
    missing
}

fn is_host_port(addr: &str) -> bool {
    match addr.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok(),
        None => false,
    }
}

fn check_http_url(raw: &str) -> Result<(), String> {
    let url = Url::parse(raw).map_err(|e| e.to_string())?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(format!("unsupported scheme '{}'", other)),
    }
    if url.query().is_some() || url.fragment().is_some() {
        return Err("query and fragment are not allowed".to_string());
    }
    Ok(())
}
