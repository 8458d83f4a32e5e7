//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! ingress, queue, workers, pipeline stages
//!     → logging.rs (structured tracing events, one span per job)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID is recorded on the job span, so every event inside the
//!   pipeline carries it
//! - Metric updates go through the `metrics` facade; they are no-ops until
//!   an exporter is installed

pub mod logging;
pub mod metrics;
