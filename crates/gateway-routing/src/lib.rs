//! # Gateway Routing
//!
//! Provider routing for the Nexus chat gateway.
//!
//! The router is a pure dispatch table keyed by provider type. It holds no
//! per-request state and performs no retries or cross-provider fallback.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod router;

// Re-export main types
pub use router::ProviderRouter;
