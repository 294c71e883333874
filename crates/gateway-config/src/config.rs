//! Gateway configuration types.
//!
//! The whole configuration is resolved once at startup and shared read-only
//! by every request. Changing it requires a restart.

use gateway_core::ProviderType;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;
use validator::Validate;

/// Default system prompt sent with every chat message
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant integrated into a weather and productivity dashboard.
You help users with:
- Weather insights and recommendations
- Task organization and productivity tips
- Daily planning and scheduling advice
- General questions about their day
- Provide concise, friendly, and actionable responses
- list relevant sources of information

Be concise, friendly, and actionable in your responses.";

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development; enables the credential-less Gemini mock reply
    Development,
    /// Anything else
    #[default]
    Production,
}

impl Environment {
    /// Parse an environment name; anything but `development`/`dev` is production
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Self::Development,
            _ => Self::Production,
        }
    }

    /// Whether development fallbacks are allowed
    #[must_use]
    pub fn is_development(self) -> bool {
        self == Self::Development
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human readable
    #[default]
    Pretty,
    /// One JSON object per line
    Json,
}

/// Top-level configuration
#[derive(Debug, Clone, Default)]
pub struct GatewayConfig {
    /// Listener settings
    pub server: ServerSettings,
    /// Deployment environment
    pub environment: Environment,
    /// Provider selection and credentials
    pub providers: ProviderSettings,
    /// Admission control
    pub rate_limit: RateLimitSettings,
    /// Logging
    pub logging: LoggingSettings,
}

/// HTTP listener settings
#[derive(Debug, Clone, Validate)]
pub struct ServerSettings {
    /// Bind host
    pub host: String,
    /// Bind port
    #[validate(range(min = 1))]
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

/// Provider selection, models, prompt and credentials
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Raw provider name as configured (`AI_PROVIDER`).
    ///
    /// Kept unparsed so an unknown value is reported per request instead of
    /// preventing startup.
    pub provider: String,
    /// System prompt
    pub system_prompt: String,
    /// Timeout applied to every upstream HTTP call
    pub upstream_timeout: Duration,
    /// Gemini settings
    pub gemini: GeminiSettings,
    /// OpenRouter settings
    pub openrouter: OpenRouterSettings,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            provider: ProviderType::Gemini.as_str().to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            upstream_timeout: Duration::from_secs(60),
            gemini: GeminiSettings::default(),
            openrouter: OpenRouterSettings::default(),
        }
    }
}

impl ProviderSettings {
    /// Parsed provider selection
    ///
    /// # Errors
    /// `InvalidConfiguration` for anything other than `gemini` / `openrouter`.
    pub fn selected(&self) -> gateway_core::GatewayResult<ProviderType> {
        self.provider.parse()
    }

    /// Model configured for `provider`
    #[must_use]
    pub fn model_for(&self, provider: ProviderType) -> &str {
        match provider {
            ProviderType::Gemini => &self.gemini.model,
            ProviderType::OpenRouter => &self.openrouter.model,
        }
    }

    /// Resolve the per-request provider configuration
    #[must_use]
    pub fn resolve(&self) -> ProviderConfig {
        let model_id = self
            .selected()
            .map(|provider| self.model_for(provider).to_string())
            .unwrap_or_default();

        ProviderConfig {
            provider_name: self.provider.clone(),
            model_id,
            system_prompt: self.system_prompt.clone(),
        }
    }
}

/// Gemini adapter settings
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    /// Model id
    pub model: String,
    /// Key pool; one is picked at random per call
    pub api_keys: Vec<SecretString>,
    /// API base URL
    pub base_url: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            model: "gemini-1.5-flash".to_string(),
            api_keys: Vec::new(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
        }
    }
}

/// OpenRouter adapter settings
#[derive(Debug, Clone)]
pub struct OpenRouterSettings {
    /// Model id
    pub model: String,
    /// API key
    pub api_key: Option<SecretString>,
    /// API base URL
    pub base_url: String,
    /// Value of the `HTTP-Referer` attribution header
    pub referer: String,
    /// Value of the `X-Title` attribution header
    pub title: String,
}

impl Default for OpenRouterSettings {
    fn default() -> Self {
        Self {
            model: "google/gemini-2.0-flash-001".to_string(),
            api_key: None,
            base_url: "https://openrouter.ai/api/v1".to_string(),
            referer: "https://nexus-dashboard.com".to_string(),
            title: "Nexus Dashboard".to_string(),
        }
    }
}

/// Admission control settings
#[derive(Debug, Clone, Validate)]
pub struct RateLimitSettings {
    /// Counter store URL; `None` disables admission control
    pub redis_url: Option<SecretString>,
    /// Admitted requests per window
    #[validate(range(min = 1))]
    pub max_requests: u32,
    /// Window length in seconds
    #[validate(range(min = 1))]
    pub window_secs: u64,
    /// Namespace for counter keys
    #[validate(length(min = 1))]
    pub key_prefix: String,
    /// Upper bound for one counter store round trip, in milliseconds
    #[validate(range(min = 1))]
    pub operation_timeout_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            redis_url: None,
            max_requests: 10,
            window_secs: 60,
            key_prefix: "nexus-chat".to_string(),
            operation_timeout_ms: 2_000,
        }
    }
}

impl RateLimitSettings {
    /// Whether a counter store is configured
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.redis_url
            .as_ref()
            .is_some_and(|url| !url.expose_secret().is_empty())
    }

    /// Window length
    #[must_use]
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }

    /// Store operation timeout
    #[must_use]
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

/// Logging settings
#[derive(Debug, Clone)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

/// Provider configuration resolved for a single request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    /// Configured provider name, unparsed
    pub provider_name: String,
    /// Model id for that provider; empty if the provider is unknown
    pub model_id: String,
    /// System prompt
    pub system_prompt: String,
}

impl ProviderConfig {
    /// Create a provider configuration
    pub fn new(
        provider_name: impl Into<String>,
        model_id: impl Into<String>,
        system_prompt: impl Into<String>,
    ) -> Self {
        Self {
            provider_name: provider_name.into(),
            model_id: model_id.into(),
            system_prompt: system_prompt.into(),
        }
    }
}
