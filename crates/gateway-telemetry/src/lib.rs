//! # Gateway Telemetry
//!
//! Observability for the Nexus chat gateway:
//! - Structured logging through `tracing-subscriber`
//! - Prometheus metrics

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod logging;
pub mod metrics;

// Re-export main types
pub use error::TelemetryError;
pub use logging::{init_logging, LoggingConfig};
pub use metrics::{Metrics, OUTCOME_SUCCESS};
