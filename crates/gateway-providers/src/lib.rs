//! # Gateway Providers
//!
//! Upstream AI provider adapters for the Nexus chat gateway:
//! - Google Gemini, with a rotating key pool
//! - OpenRouter (OpenAI-compatible chat completions)
//!
//! Each adapter owns its wire format and credential handling and implements
//! [`gateway_core::ChatProvider`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod keys;

#[cfg(feature = "gemini")]
pub mod gemini;

#[cfg(feature = "openrouter")]
pub mod openrouter;

// Re-export main types
pub use keys::KeyPool;

#[cfg(feature = "gemini")]
pub use gemini::{GeminiConfig, GeminiProvider, MOCK_RESPONSE};

#[cfg(feature = "openrouter")]
pub use openrouter::{OpenRouterConfig, OpenRouterProvider};
