//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatch and service facades produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - Request ID flows through every dispatch log line
//! - Metrics are cheap (atomic increments)

pub mod logging;
pub mod metrics;
