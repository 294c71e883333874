//! Provider abstraction.
//!
//! Each upstream AI service is reached through a [`ChatProvider`]. The router
//! only knows this trait, which lets tests swap in fakes without network
//! access.

use crate::error::{GatewayError, GatewayResult};
use crate::request::EffectiveMessage;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Upstream provider selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderType {
    /// Google Gemini (generativelanguage API)
    Gemini,
    /// OpenRouter (OpenAI-compatible chat completions)
    OpenRouter,
}

impl ProviderType {
    /// Configuration name of the provider
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gemini => "gemini",
            Self::OpenRouter => "openrouter",
        }
    }
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gemini => write!(f, "Gemini"),
            Self::OpenRouter => write!(f, "OpenRouter"),
        }
    }
}

impl FromStr for ProviderType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "openrouter" => Ok(Self::OpenRouter),
            _ => Err(GatewayError::configuration("Invalid AI_PROVIDER")),
        }
    }
}

/// Everything an adapter needs to issue one upstream call
#[derive(Debug, Clone, Copy)]
pub struct ChatPrompt<'a> {
    /// Upstream model identifier
    pub model: &'a str,
    /// System prompt prepended to the conversation
    pub system_prompt: &'a str,
    /// The user's message
    pub message: &'a EffectiveMessage,
}

/// Successful upstream reply.
///
/// `text` may be empty when the upstream answered with a well-formed but
/// contentless body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Assistant text
    pub text: String,
}

impl ChatReply {
    /// Create a reply
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

/// Outcome of one adapter call
pub type UpstreamResult = GatewayResult<ChatReply>;

/// Capability implemented by every upstream adapter
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Which provider this adapter talks to
    fn provider_type(&self) -> ProviderType;

    /// Whether credentials are present.
    ///
    /// Used by readiness reporting; `complete` still enforces it.
    fn has_credentials(&self) -> bool;

    /// Send a single-turn prompt upstream
    async fn complete(&self, prompt: &ChatPrompt<'_>) -> UpstreamResult;
}
