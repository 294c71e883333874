//! OpenRouter provider implementation.
//!
//! OpenRouter speaks the OpenAI chat completions format at
//! `https://openrouter.ai/api/v1/chat/completions` and asks callers to
//! identify themselves through the `HTTP-Referer` and `X-Title` headers.

use async_trait::async_trait;
use gateway_core::{
    ChatPrompt, ChatProvider, ChatReply, GatewayError, ProviderType, UpstreamResult,
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, trace};

/// OpenRouter provider configuration
#[derive(Debug, Clone)]
pub struct OpenRouterConfig {
    /// API key
    pub api_key: Option<SecretString>,
    /// API base URL, without trailing slash
    pub base_url: String,
    /// `HTTP-Referer` attribution header
    pub referer: String,
    /// `X-Title` attribution header
    pub title: String,
    /// Request timeout
    pub timeout: Duration,
}

impl OpenRouterConfig {
    /// Create a configuration for the public API
    #[must_use]
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self {
            api_key,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            referer: "https://nexus-dashboard.com".to_string(),
            title: "Nexus Dashboard".to_string(),
            timeout: Duration::from_secs(60),
        }
    }

    /// Set the base URL
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the attribution headers
    #[must_use]
    pub fn with_attribution(mut self, referer: impl Into<String>, title: impl Into<String>) -> Self {
        self.referer = referer.into();
        self.title = title.into();
        self
    }

    /// Set the timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// OpenRouter provider
pub struct OpenRouterProvider {
    config: OpenRouterConfig,
    client: Client,
}

impl OpenRouterProvider {
    /// Create a new OpenRouter provider.
    ///
    /// A missing key is accepted here; it is reported per request.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be created
    pub fn new(config: OpenRouterConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayError::configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    fn endpoint_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn build_request<'a>(prompt: &ChatPrompt<'a>) -> OpenRouterRequest<'a> {
        OpenRouterRequest {
            model: prompt.model,
            messages: vec![
                OpenRouterMessage {
                    role: "system",
                    content: prompt.system_prompt,
                },
                OpenRouterMessage {
                    role: "user",
                    content: prompt.message.as_str(),
                },
            ],
        }
    }

    fn parse_response(status: u16, body: &str) -> UpstreamResult {
        let response: OpenRouterResponse = serde_json::from_str(body).map_err(|e| {
            GatewayError::upstream(
                ProviderType::OpenRouter,
                "invalid response body",
                format!("{e}: {body}"),
            )
        })?;

        // 200 with an error object and nothing else
        if response.choices.is_none() && response.error.is_some() {
            return Err(GatewayError::Upstream {
                provider: ProviderType::OpenRouter,
                status: Some(status),
                summary: "error response".to_string(),
                detail: body.to_string(),
            });
        }

        let text = response
            .choices
            .and_then(|choices| choices.into_iter().next().flatten())
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default();

        Ok(ChatReply::new(text))
    }
}

#[async_trait]
impl ChatProvider for OpenRouterProvider {
    fn provider_type(&self) -> ProviderType {
        ProviderType::OpenRouter
    }

    fn has_credentials(&self) -> bool {
        self.config
            .api_key
            .as_ref()
            .is_some_and(|key| !key.expose_secret().is_empty())
    }

    async fn complete(&self, prompt: &ChatPrompt<'_>) -> UpstreamResult {
        let api_key = self
            .config
            .api_key
            .as_ref()
            .filter(|key| !key.expose_secret().is_empty())
            .ok_or_else(|| GatewayError::configuration("OPENROUTER_API_KEY is not configured"))?;

        let request = Self::build_request(prompt);

        debug!(
            provider = "openrouter",
            model = %prompt.model,
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.endpoint_url())
            .bearer_auth(api_key.expose_secret())
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "openrouter", error = %e, "OpenRouter API request failed");
                GatewayError::upstream(ProviderType::OpenRouter, "request failed", e.to_string())
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            GatewayError::upstream(ProviderType::OpenRouter, "failed to read response", e.to_string())
        })?;

        trace!(status = %status, body = %body, "Received OpenRouter response");

        if !status.is_success() {
            return Err(GatewayError::upstream_status(
                ProviderType::OpenRouter,
                status.as_u16(),
                body,
            ));
        }

        Self::parse_response(status.as_u16(), &body)
    }
}

// OpenRouter API types

#[derive(Debug, Serialize)]
struct OpenRouterRequest<'a> {
    model: &'a str,
    messages: Vec<OpenRouterMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct OpenRouterMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenRouterResponse {
    #[serde(default)]
    choices: Option<Vec<Option<OpenRouterChoice>>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterChoice {
    #[serde(default)]
    message: Option<OpenRouterResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct OpenRouterResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_core::{EffectiveMessage, ErrorKind};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const MODEL: &str = "google/gemini-2.0-flash-001";

    fn provider(server: &MockServer, key: Option<&str>) -> OpenRouterProvider {
        let config = OpenRouterConfig::new(key.map(|k| SecretString::new(k.to_string())))
            .with_base_url(format!("{}/api/v1", server.uri()));
        OpenRouterProvider::new(config).unwrap()
    }

    async fn complete(provider: &OpenRouterProvider, text: &str) -> UpstreamResult {
        let message = EffectiveMessage::new(text).unwrap();
        provider
            .complete(&ChatPrompt {
                model: MODEL,
                system_prompt: "You are helpful.",
                message: &message,
            })
            .await
    }

    fn completion_body(content: serde_json::Value) -> serde_json::Value {
        json!({
            "id": "gen-123",
            "model": MODEL,
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })
    }

    #[tokio::test]
    async fn test_sends_role_tagged_messages_with_attribution() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/chat/completions"))
            .and(header("authorization", "Bearer sk-or-test"))
            .and(header("http-referer", "https://nexus-dashboard.com"))
            .and(header("x-title", "Nexus Dashboard"))
            .and(body_json(json!({
                "model": MODEL,
                "messages": [
                    {"role": "system", "content": "You are helpful."},
                    {"role": "user", "content": "hello"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!("Hi!"))))
            .expect(1)
            .mount(&server)
            .await;

        let reply = complete(&provider(&server, Some("sk-or-test")), "  hello ")
            .await
            .unwrap();
        assert_eq!(reply.text, "Hi!");
    }

    #[tokio::test]
    async fn test_custom_attribution_headers() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("http-referer", "https://example.test"))
            .and(header("x-title", "Example"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!("ok"))))
            .expect(1)
            .mount(&server)
            .await;

        let config = OpenRouterConfig::new(Some(SecretString::new("k".to_string())))
            .with_base_url(server.uri())
            .with_attribution("https://example.test", "Example");
        let openrouter = OpenRouterProvider::new(config).unwrap();

        assert_eq!(complete(&openrouter, "hello").await.unwrap().text, "ok");
    }

    #[tokio::test]
    async fn test_null_content_is_empty_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion_body(json!(null))))
            .mount(&server)
            .await;

        let reply = complete(&provider(&server, Some("k")), "hello").await.unwrap();
        assert_eq!(reply.text, "");
    }

    #[tokio::test]
    async fn test_empty_choices_is_empty_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
            .mount(&server)
            .await;

        let reply = complete(&provider(&server, Some("k")), "hello").await.unwrap();
        assert!(reply.text.is_empty());
    }

    #[test]
    fn test_null_choices_are_empty_success() {
        for body in [
            r#"{"choices":null}"#,
            r#"{"choices":[null]}"#,
            r#"{"choices":[{"message":null}]}"#,
            r#"{"choices":null,"error":null}"#,
        ] {
            let reply = OpenRouterProvider::parse_response(200, body)
                .unwrap_or_else(|e| panic!("{body}: {e}"));
            assert_eq!(reply.text, "", "{body}");
        }
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(402).set_body_json(json!({
                "error": {"code": 402, "message": "Insufficient credits"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let err = complete(&provider(&server, Some("k")), "hello")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
        assert_eq!(err.client_message(), "OpenRouter API error: 402");
        assert!(!err.client_message().contains("credits"));
    }

    #[tokio::test]
    async fn test_error_body_with_ok_status_is_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "error": {"code": 502, "message": "Provider returned error"}
            })))
            .mount(&server)
            .await;

        let err = complete(&provider(&server, Some("k")), "hello")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
    }

    #[tokio::test]
    async fn test_missing_key_fails_without_network_call() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        for key in [None, Some("")] {
            let openrouter = provider(&server, key);
            assert!(!openrouter.has_credentials());

            let err = complete(&openrouter, "hello").await.unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidConfiguration);
            assert_eq!(err.client_message(), "OPENROUTER_API_KEY is not configured");
        }
    }

    #[tokio::test]
    async fn test_unreachable_upstream_is_upstream_error() {
        // nothing listens on the discard port
        let config = OpenRouterConfig::new(Some(SecretString::new("k".to_string())))
            .with_base_url("http://127.0.0.1:9")
            .with_timeout(Duration::from_secs(2));
        let openrouter = OpenRouterProvider::new(config).unwrap();

        let err = complete(&openrouter, "hello").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UpstreamError);
        assert_eq!(err.client_message(), "OpenRouter API error: request failed");
    }
}
