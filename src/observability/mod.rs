//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! forwarder / file proxy / handlers produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows from the inbound request into the request span
//! - Token-bearing URLs are never logged; only endpoint names are

pub mod logging;
pub mod metrics;
