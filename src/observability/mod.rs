//! Observability support for the resilience layer.
//!
//! [`LoggingConfig`] installs a `tracing` subscriber for embedders that do
//! not bring their own, and [`CircuitMetrics`] counts trips, heals, and
//! rejections across all breakers it is wired to.

mod logging;
mod metrics;

pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use metrics::{CircuitMetrics, MetricsHook, MetricsSnapshot};
