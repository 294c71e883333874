//! Error types for the gateway.
//!
//! Every failure a chat request can run into collapses into one of the five
//! [`ErrorKind`]s. The HTTP layer maps kinds to status codes; adapters only
//! ever produce [`GatewayError`] values.

use crate::provider::ProviderType;
use thiserror::Error;

/// Result alias used across the gateway crates
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Coarse classification of a gateway failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Request body could not be parsed as JSON
    MalformedInput,
    /// No non-blank user message could be derived from the request
    NoMessage,
    /// Provider selection or credentials are missing or invalid
    InvalidConfiguration,
    /// Admission control rejected the caller
    RateLimited,
    /// The upstream provider call failed
    UpstreamError,
}

impl ErrorKind {
    /// Stable label for logs and metrics
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MalformedInput => "malformed_input",
            Self::NoMessage => "no_message",
            Self::InvalidConfiguration => "invalid_configuration",
            Self::RateLimited => "rate_limited",
            Self::UpstreamError => "upstream_error",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Gateway error
#[derive(Debug, Error)]
pub enum GatewayError {
    /// Request body is not valid JSON
    #[error("Invalid JSON in request body: {detail}")]
    MalformedInput {
        /// Parser diagnostic
        detail: String,
    },

    /// Neither `message` nor the last `messages` entry carried text
    #[error("No user message provided")]
    NoMessage,

    /// Deployment defect: unknown provider or missing credentials
    #[error("{message}")]
    InvalidConfiguration {
        /// Diagnostic shown to the caller
        message: String,
    },

    /// Caller exceeded its request budget
    #[error("Rate limit exceeded")]
    RateLimited {
        /// Requests allowed per window
        limit: u32,
        /// Requests left in the current window
        remaining: u32,
    },

    /// Upstream provider failure (network, non-2xx, unparseable body)
    #[error("{provider} API error: {summary}")]
    Upstream {
        /// Provider that failed
        provider: ProviderType,
        /// HTTP status returned by the provider, if one was received
        status: Option<u16>,
        /// Short description safe to show to the caller
        summary: String,
        /// Raw upstream body or transport error, for server-side logs only
        detail: String,
    },
}

impl GatewayError {
    /// Create a malformed input error
    pub fn malformed(detail: impl Into<String>) -> Self {
        Self::MalformedInput {
            detail: detail.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            message: message.into(),
        }
    }

    /// Create a rate limit error
    #[must_use]
    pub fn rate_limited(limit: u32, remaining: u32) -> Self {
        Self::RateLimited { limit, remaining }
    }

    /// Create an error for a non-success upstream HTTP status
    pub fn upstream_status(provider: ProviderType, status: u16, body: impl Into<String>) -> Self {
        Self::Upstream {
            provider,
            status: Some(status),
            summary: status.to_string(),
            detail: body.into(),
        }
    }

    /// Create an error for a transport or decoding failure with no usable status
    pub fn upstream(
        provider: ProviderType,
        summary: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self::Upstream {
            provider,
            status: None,
            summary: summary.into(),
            detail: detail.into(),
        }
    }

    /// Classify this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedInput { .. } => ErrorKind::MalformedInput,
            Self::NoMessage => ErrorKind::NoMessage,
            Self::InvalidConfiguration { .. } => ErrorKind::InvalidConfiguration,
            Self::RateLimited { .. } => ErrorKind::RateLimited,
            Self::Upstream { .. } => ErrorKind::UpstreamError,
        }
    }

    /// HTTP status code the ingress answers with
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self.kind() {
            ErrorKind::MalformedInput | ErrorKind::NoMessage => 400,
            ErrorKind::RateLimited => 429,
            ErrorKind::InvalidConfiguration | ErrorKind::UpstreamError => 500,
        }
    }

    /// Message returned to the caller.
    ///
    /// Parser diagnostics and upstream bodies are kept out of it.
    #[must_use]
    pub fn client_message(&self) -> String {
        match self {
            Self::MalformedInput { .. } => "Invalid JSON in request body".to_string(),
            other => other.to_string(),
        }
    }
}
