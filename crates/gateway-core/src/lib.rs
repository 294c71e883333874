//! # Gateway Core
//!
//! Core types, traits, and error handling for the Nexus chat gateway.
//!
//! This crate provides the foundational types used throughout the gateway:
//! - The client request shape and the normalized [`EffectiveMessage`]
//! - The [`ChatProvider`] trait implemented by every upstream adapter
//! - The error taxonomy ([`ErrorKind`], [`GatewayError`])

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod provider;
pub mod request;

// Re-export commonly used types
pub use error::{ErrorKind, GatewayError, GatewayResult};
pub use provider::{ChatPrompt, ChatProvider, ChatReply, ProviderType, UpstreamResult};
pub use request::{normalize, ChatTurn, ClientRequest, EffectiveMessage};
