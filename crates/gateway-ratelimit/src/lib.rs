//! # Gateway Rate Limit
//!
//! Per-caller admission control for the Nexus chat gateway.
//!
//! Each caller gets a sliding-window budget (10 requests per 60 seconds by
//! default) tracked in a [`CounterStore`]. Redis shares the budget across
//! instances; the in-memory store serves single instances and tests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod controller;
pub mod error;
pub mod store;
pub mod window;

#[cfg(feature = "redis")]
pub mod redis_store;

// Re-export main types
pub use controller::{AdmissionController, AdmissionDecision};
pub use error::{StoreError, StoreResult};
pub use store::{CounterStore, MemoryCounterStore};
pub use window::{CounterOutcome, RateLimitKey, WindowSlot};

#[cfg(feature = "redis")]
pub use redis_store::RedisCounterStore;
