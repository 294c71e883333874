//! Google Gemini provider implementation.
//!
//! Talks to the Google AI Studio `generateContent` endpoint:
//! `https://generativelanguage.googleapis.com/v1beta/models/{MODEL}:generateContent?key={KEY}`
//!
//! The system prompt and the user message are sent as one text part; the
//! endpoint is not addressed with separate roles.

use crate::keys::KeyPool;
use async_trait::async_trait;
use gateway_core::{
    ChatPrompt, ChatProvider, ChatReply, GatewayError, ProviderType, UpstreamResult,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, trace};

/// Reply returned instead of an upstream call when no key is configured in
/// development mode
pub const MOCK_RESPONSE: &str = "Mock response: Configure GOOGLE_GEMINI_API_KEY for real AI.";

/// Gemini provider configuration
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    /// Key pool
    pub api_keys: Vec<SecretString>,
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Request timeout
    pub timeout: Duration,
    /// Answer with [`MOCK_RESPONSE`] when the key pool is empty
    pub allow_mock_response: bool,
}

impl GeminiConfig {
    /// Create a configuration for the public API
    #[must_use]
    pub fn new(api_keys: Vec<SecretString>) -> Self {
        Self {
            api_keys,
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout: Duration::from_secs(60),
            allow_mock_response: false,
        }
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable the development mock reply
    #[must_use]
    pub fn with_mock_response(mut self, allow: bool) -> Self {
        self.allow_mock_response = allow;
        self
    }
}

/// Gemini provider
pub struct GeminiProvider {
    keys: KeyPool,
    client: Client,
    base_url: String,
    allow_mock_response: bool,
}

impl GeminiProvider {
    /// Create a new Gemini provider.
    ///
    /// An empty key pool is accepted here; it is reported per request.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: GeminiConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            keys: KeyPool::new(config.api_keys),
            client,
            base_url: config.base_url,
            allow_mock_response: config.allow_mock_response,
        })
    }

    /// Number of configured keys
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    fn endpoint_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.base_url, model)
    }

    fn build_request(prompt: &ChatPrompt<'_>) -> GeminiRequest {
        GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: format!("{}\n\nUser: {}", prompt.system_prompt, prompt.message),
                }],
            }],
        }
    }

    fn parse_response(status: u16, body: &str) -> UpstreamResult {
        let response: GeminiResponse = serde_json::from_str(body).map_err(|e| {
            GatewayError::upstream(ProviderType::Gemini, "invalid response body", format!("{e}: {body}"))
        })?;

        if let Some(err) = response.error {
            let summary = err
                .code
                .map_or_else(|| status.to_string(), |code| code.to_string());
            return Err(GatewayError::Upstream {
                provider: ProviderType::Gemini,
                status: Some(status),
                summary,
                detail: body.to_string(),
            });
        }

        // any null along the path reads as "no text"
        let text = response
            .candidates
            .and_then(|candidates| candidates.into_iter().next().flatten())
            .and_then(|candidate| candidate.content)
            .and_then(|content| content.parts)
            .and_then(|parts| parts.into_iter().next().flatten())
            .and_then(|part| part.text)
            .unwrap_or_default();

        Ok(ChatReply::new(text))
    }
}

#[async_trait]
impl ChatProvider for GeminiProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Gemini
    }

    fn has_credentials(&self) -> bool {
        !self.keys.is_empty()
    }

    async fn complete(&self, prompt: &ChatPrompt<'_>) -> UpstreamResult {
        let Some(key) = self.keys.choose() else {
            if self.allow_mock_response {
                info!(provider = "gemini", "No API key configured, returning mock response");
                return Ok(ChatReply::new(MOCK_RESPONSE));
            }
            return Err(GatewayError::configuration(
                "GOOGLE_GEMINI_API_KEY is not configured",
            ));
        };

        let request = Self::build_request(prompt);

        debug!(
            provider = "gemini",
            model = %prompt.model,
            pool_size = self.keys.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(self.endpoint_url(prompt.model))
            .query(&[("key", key.expose_secret().as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                // the key travels in the query string
                let e = e.without_url();
                error!(provider = "gemini", error = %e, "Gemini API request failed");
                GatewayError::upstream(ProviderType::Gemini, "request failed", e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            GatewayError::upstream(
                ProviderType::Gemini,
                "failed to read response",
                e.without_url().to_string(),
            )
        })?;

        trace!(status = %status, body = %body, "Received Gemini response");

        if !status.is_success() {
            return Err(GatewayError::upstream_status(
                ProviderType::Gemini,
                status.as_u16(),
                body,
            ));
        }

        Self::parse_response(status.as_u16(), &body)
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Debug, Serialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Option<Vec<Option<GeminiCandidate>>>,
    #[serde(default)]
    error: Option<GeminiErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiResponseContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponseContent {
    #[serde(default)]
    parts: Option<Vec<Option<GeminiResponsePart>>>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    code: Option<i64>,
}
