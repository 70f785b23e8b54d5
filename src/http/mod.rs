//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, JSON body extraction)
//!     → handlers.rs (one Telegram call per route)
//!     → response.rs (ForwardResult / file stream → HTTP response)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::{JsonObject, MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, RelayServer, ServerError};
