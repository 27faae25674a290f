//! # Observability Module
//!
//! - `logging`: `tracing-subscriber` setup (JSON or text) and request ids
//! - `metrics`: Prometheus recorder and HTTP request metrics
//!
//! Application code logs with the `tracing` macros and records with the `metrics`
//! macros directly; this module only wires the exporters.

pub mod logging;
pub mod metrics;

pub use logging::CorrelationId;
pub use metrics::MetricsHandle;
