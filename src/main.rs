//! Telegram Bot API relay.
//!
//! Exposes a small REST surface under `/api` and forwards each call to the
//! Telegram Bot API with a fixed bot token and destination chat. File
//! downloads are streamed through the relay so the token never reaches the
//! client.
//!
//! ```text
//!   client ──▶ /api/sendMessage ──▶ Forwarder ──▶ api.telegram.org/bot<token>/sendMessage
//!   client ──▶ /api/file/{path} ──▶ FileProxy ──▶ api.telegram.org/file/bot<token>/{path}
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use telegram_relay::config::{load_config, missing_credentials};
use telegram_relay::lifecycle::{wait_for_signal, Shutdown};
use telegram_relay::observability::{logging, metrics};
use telegram_relay::RelayServer;

#[derive(Parser)]
#[command(name = "telegram-relay")]
#[command(about = "Stateless relay in front of the Telegram Bot API", long_about = None)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }

    logging::init_logging(&config.observability);

    tracing::info!("telegram-relay v{} starting", env!("CARGO_PKG_VERSION"));

    for variable in missing_credentials(&config) {
        tracing::error!(
            variable,
            "CRITICAL: required setting is not set; every relayed call will fail at Telegram"
        );
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = RelayServer::new(config)?;
    let loaded = server.config();
    tracing::info!(
        bind_address = %loaded.listener.bind_address,
        api_url = %loaded.telegram.api_url,
        public_base_url = %loaded.files.public_base_url,
        cors_enabled = loaded.http.cors_enabled,
        "Configuration loaded"
    );
    let server_shutdown = shutdown.subscribe();

    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
