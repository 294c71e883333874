//! Request types for the gateway.
//!
//! Clients send either a flat `message` or a `messages` conversation. Only one
//! piece of text is forwarded upstream: the [`EffectiveMessage`].

use crate::error::{GatewayError, GatewayResult};
use serde::Serialize;
use serde_json::Value;

/// One entry of a client-side conversation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatTurn {
    /// Speaker role (`user`, `assistant`, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Turn text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

impl ChatTurn {
    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Some("user".to_string()),
            content: Some(content.into()),
        }
    }

    fn from_value(value: &Value) -> Self {
        Self {
            role: value.get("role").and_then(Value::as_str).map(String::from),
            content: value.get("content").and_then(Value::as_str).map(String::from),
        }
    }
}

/// Chat request body as sent by the browser.
///
/// Fields of an unexpected JSON type are read as absent rather than rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClientRequest {
    /// Single user message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Full conversation; only the last turn is used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<ChatTurn>>,
}

impl ClientRequest {
    /// Request with a conversation
    #[must_use]
    pub fn with_messages(messages: Vec<ChatTurn>) -> Self {
        Self {
            message: None,
            messages: Some(messages),
        }
    }

    /// Parse a raw request body.
    ///
    /// # Errors
    /// Returns [`GatewayError::MalformedInput`] if the body is not JSON.
    pub fn from_slice(body: &[u8]) -> GatewayResult<Self> {
        let value: Value =
            serde_json::from_slice(body).map_err(|e| GatewayError::malformed(e.to_string()))?;
        Ok(Self::from_value(&value))
    }

    /// Read the recognised fields out of an arbitrary JSON value
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let message = value.get("message").and_then(Value::as_str).map(String::from);
        let messages = value
            .get("messages")
            .and_then(Value::as_array)
            .map(|turns| turns.iter().map(ChatTurn::from_value).collect());

        Self { message, messages }
    }

    /// Derive the text forwarded upstream.
    ///
    /// A non-blank `message` wins over `messages`; otherwise the content of the
    /// last conversation turn is used.
    ///
    /// # Errors
    /// Returns [`GatewayError::NoMessage`] if neither yields non-blank text.
    pub fn normalize(&self) -> GatewayResult<EffectiveMessage> {
        if let Some(message) = self.message.as_deref().and_then(EffectiveMessage::new) {
            return Ok(message);
        }

        self.messages
            .as_deref()
            .and_then(<[ChatTurn]>::last)
            .and_then(|turn| turn.content.as_deref())
            .and_then(EffectiveMessage::new)
            .ok_or(GatewayError::NoMessage)
    }
}

/// Parse and normalize a raw body in one step
///
/// # Errors
/// `MalformedInput` for non-JSON bodies, `NoMessage` when no text is found.
pub fn normalize(body: &[u8]) -> GatewayResult<EffectiveMessage> {
    ClientRequest::from_slice(body)?.normalize()
}

/// Trimmed, non-empty user text.
///
/// Only constructible through [`EffectiveMessage::new`], so an empty message
/// can never reach an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EffectiveMessage(String);

impl EffectiveMessage {
    /// Trim `text`; `None` if nothing is left
    #[must_use]
    pub fn new(text: &str) -> Option<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    /// Borrow the text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; present for API symmetry
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<str> for EffectiveMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EffectiveMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
