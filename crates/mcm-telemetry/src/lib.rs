//! Prometheus metrics and structured logging for the market contract maker.
//!
//! - Prometheus metrics for requests, pricing rejections, oracle latency and signing
//! - Structured logging with tracing (JSON in production)

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
