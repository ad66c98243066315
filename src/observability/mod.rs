//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → structured log events (tracing, initialized in main)
//!     → metrics.rs (counters, gauges)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all log events via the tracing span
//! - Metrics are cheap (atomic increments), recorded at domain
//!   boundaries rather than per middleware layer
//! - The exporter is optional and disabled by default so tests never
//!   contend for the scrape port

pub mod metrics;
