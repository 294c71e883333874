//! # Gateway Server
//!
//! HTTP server for the Nexus chat gateway.
//!
//! This crate provides:
//! - The `POST /api/chat` endpoint with per-caller admission control
//! - Health, readiness and Prometheus metrics endpoints
//! - Provider adapter wiring from configuration
//! - Graceful shutdown on Ctrl+C / SIGTERM

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod providers;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod state;

// Re-export main types
pub use error::{ApiError, ServerError};
pub use providers::build_provider_router;
pub use routes::create_router;
pub use server::{Server, ServerConfig};
pub use shutdown::shutdown_signal;
pub use state::{AppState, AppStateBuilder};
