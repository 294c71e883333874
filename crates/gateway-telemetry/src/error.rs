//! Telemetry errors.

use thiserror::Error;

/// Failure setting up logging or metrics
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The log filter could not be parsed
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),

    /// The global subscriber could not be installed
    #[error("failed to initialize logging: {0}")]
    Init(String),

    /// A metric could not be created or registered
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}
