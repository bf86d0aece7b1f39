//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Guard and middleware produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters and gauges via the metrics facade)
//!
//! Consumers:
//!     → stdout log aggregation
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through every log line via the trace span
//! - Security rejections log at warn with client and path fields

pub mod logging;
pub mod metrics;
