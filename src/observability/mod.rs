//! Observability subsystem.
//!
//! # Data Flow
//!
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters + gauge, Prometheus scrape endpoint)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, config-gated)
//! ```
//!
//! # Design Decisions
//! - Structured fields (client, port, step) over free-text messages
//! - Metric updates are cheap atomic increments; exposition is optional

pub mod logging;
pub mod metrics;
