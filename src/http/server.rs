//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with all relay handlers
//! - Wire up middleware (request ID, tracing, CORS, body limit)
//! - Build the shared outbound client, forwarder and file proxy
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::DefaultBodyLimit,
    http::Request,
    routing::{get, post},
    Router,
};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::config::{RelayConfig, TelegramConfig};
use crate::http::handlers;
use crate::http::request::{request_id, MakeRequestUuid};
use crate::telegram::{FileProxy, Forwarder};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RelayConfig>,
    pub forwarder: Forwarder,
    pub files: FileProxy,
}

impl AppState {
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let client = build_client(&config.telegram)?;
        Ok(Self {
            forwarder: Forwarder::new(client.clone(), &config.telegram),
            files: FileProxy::new(client, &config.telegram),
            config: Arc::new(config),
        })
    }
}

/// One pooled client shared by the forwarder and the file proxy.
fn build_client(config: &TelegramConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder().user_agent(config.user_agent.clone());
    if let Some(secs) = config.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    builder.build()
}

/// HTTP server for the relay.
pub struct RelayServer {
    router: Router,
    config: Arc<RelayConfig>,
}

impl RelayServer {
    /// Create a new relay server with the given configuration.
    pub fn new(config: RelayConfig) -> Result<Self, ServerError> {
        let state = AppState::new(config)?;
        let config = state.config.clone();
        let router = Self::build_router(&config, state);
        Ok(Self { router, config })
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let router = Router::new()
            .route("/api/getUpdates", get(handlers::get_updates))
            .route("/api/sendMessage", post(handlers::send_message))
            .route("/api/sendFile", post(handlers::send_file))
            .route("/api/getFile", post(handlers::get_file))
            .route("/api/file/{*path}", get(handlers::download_file))
            .route("/api/file/", get(handlers::download_without_path))
            .route("/api/deleteMessage", post(handlers::delete_message))
            .route("/api/setReaction", post(handlers::set_reaction))
            .route("/healthz", get(handlers::health))
            .layer(DefaultBodyLimit::max(config.http.max_body_size))
            .with_state(state);

        let router = if config.http.cors_enabled {
            router.layer(CorsLayer::permissive())
        } else {
            router
        };

        router.layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = %request_id(request),
                    )
                }))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
    }

    /// The fully layered router, for embedding or in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server on `listener` until `shutdown` fires, then drain
    /// in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use axum::http::StatusCode;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn server() -> RelayServer {
        let mut config = RelayConfig::default();
        // Nothing listens here; no test below reaches the remote.
        config.telegram.api_url = "http://127.0.0.1:9".to_string();
        config.telegram.chat_id = "42".to_string();
        RelayServer::new(config).unwrap()
    }

    async fn json_body(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_ok_with_request_id() {
        let response = server()
            .router()
            .oneshot(Request::get("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key("x-request-id"));
        assert_eq!(json_body(response).await, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let response = server()
            .router()
            .oneshot(
                Request::post("/api/sendMessage")
                    .header("content-type", "application/json")
                    .body(Body::from("{\"text\":"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json_body(response).await;
        assert_eq!(body["ok"], json!(false));
        assert!(body["description"].as_str().unwrap().starts_with("Malformed JSON body"));
    }

    #[tokio::test]
    async fn send_file_without_multipart_is_no_file() {
        let response = server()
            .router()
            .oneshot(
                Request::post("/api/sendFile")
                    .header("content-type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({"ok": false, "description": "No file uploaded."})
        );
    }

    #[test]
    fn server_keeps_loaded_config() {
        let server = server();
        assert_eq!(server.config().telegram.chat_id, "42");
        assert_eq!(server.config().telegram.api_url, "http://127.0.0.1:9");
    }

    #[tokio::test]
    async fn empty_file_path_is_bad_request() {
        let response = server()
            .router()
            .oneshot(Request::get("/api/file/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"Invalid file path.");
    }

    #[tokio::test]
    async fn cors_preflight_is_allowed() {
        let response = server()
            .router()
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/sendMessage")
                    .header("origin", "https://app.example.com")
                    .header("access-control-request-method", "POST")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response
            .headers()
            .contains_key("access-control-allow-origin"));
    }
}
