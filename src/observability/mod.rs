//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration, dispatch and reloads produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging via tracing, filter from RUST_LOG or config
//! - Request ID flows through dispatch logs
//! - Lookup misses are not logged by the routing core

pub mod logging;
pub mod metrics;
