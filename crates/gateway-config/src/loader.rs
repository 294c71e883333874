//! Environment-backed configuration loading.

use crate::config::{Environment, GatewayConfig, LogFormat};
use crate::error::{ConfigError, ConfigResult};
use secrecy::SecretString;
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;
use validator::Validate;

/// Load configuration from the process environment
///
/// # Errors
/// Returns an error if a variable is set to an unparseable or invalid value.
pub fn load_config() -> ConfigResult<GatewayConfig> {
    load_from_lookup(|key| std::env::var(key).ok())
}

/// Load configuration through an arbitrary variable lookup.
///
/// Empty values are treated as unset.
///
/// # Errors
/// Returns an error if a variable is set to an unparseable or invalid value.
pub fn load_from_lookup<F>(lookup: F) -> ConfigResult<GatewayConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
    let mut config = GatewayConfig::default();

    // Server
    if let Some(host) = var("GATEWAY_HOST") {
        config.server.host = host;
    }
    if let Some(port) = var("GATEWAY_PORT") {
        config.server.port = parse_number("GATEWAY_PORT", &port)?;
    }
    if let Some(env) = var("GATEWAY_ENV") {
        config.environment = Environment::parse(&env);
    }

    // Providers
    let providers = &mut config.providers;
    if let Some(provider) = var("AI_PROVIDER") {
        providers.provider = provider.trim().to_string();
    }
    if let Some(prompt) = var("SYSTEM_PROMPT") {
        providers.system_prompt = prompt;
    }
    if let Some(secs) = var("UPSTREAM_TIMEOUT_SECS") {
        let secs: u64 = parse_number("UPSTREAM_TIMEOUT_SECS", &secs)?;
        // a zero reqwest timeout fails every upstream call
        if secs == 0 {
            return Err(ConfigError::invalid("UPSTREAM_TIMEOUT_SECS", "must be at least 1"));
        }
        providers.upstream_timeout = Duration::from_secs(secs);
    }

    if let Some(model) = var("GEMINI_MODEL") {
        providers.gemini.model = model.trim().to_string();
    }
    if let Some(keys) = var("GOOGLE_GEMINI_API_KEY") {
        providers.gemini.api_keys = parse_key_pool(&keys);
    }
    if let Some(url) = var("GEMINI_BASE_URL") {
        providers.gemini.base_url = parse_base_url("GEMINI_BASE_URL", &url)?;
    }

    if let Some(model) = var("OPENROUTER_MODEL") {
        providers.openrouter.model = model.trim().to_string();
    }
    if let Some(key) = var("OPENROUTER_API_KEY") {
        providers.openrouter.api_key = Some(SecretString::new(key.trim().to_string()));
    }
    if let Some(url) = var("OPENROUTER_BASE_URL") {
        providers.openrouter.base_url = parse_base_url("OPENROUTER_BASE_URL", &url)?;
    }
    if let Some(referer) = var("OPENROUTER_REFERER") {
        providers.openrouter.referer = referer;
    }
    if let Some(title) = var("OPENROUTER_TITLE") {
        providers.openrouter.title = title;
    }

    // Admission control
    let rate_limit = &mut config.rate_limit;
    if let Some(url) = var("REDIS_URL") {
        rate_limit.redis_url = Some(SecretString::new(url.trim().to_string()));
    }
    if let Some(max) = var("RATE_LIMIT_REQUESTS") {
        rate_limit.max_requests = parse_number("RATE_LIMIT_REQUESTS", &max)?;
    }
    if let Some(window) = var("RATE_LIMIT_WINDOW_SECS") {
        rate_limit.window_secs = parse_number("RATE_LIMIT_WINDOW_SECS", &window)?;
    }
    if let Some(prefix) = var("RATE_LIMIT_PREFIX") {
        rate_limit.key_prefix = prefix.trim().to_string();
    }
    if let Some(timeout) = var("RATE_LIMIT_TIMEOUT_MS") {
        rate_limit.operation_timeout_ms = parse_number("RATE_LIMIT_TIMEOUT_MS", &timeout)?;
    }

    // Logging
    if let Some(level) = var("LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = var("LOG_FORMAT") {
        config.logging.format = match format.trim().to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "pretty" | "text" => LogFormat::Pretty,
            other => {
                return Err(ConfigError::invalid(
                    "LOG_FORMAT",
                    format!("expected `json` or `pretty`, got `{other}`"),
                ))
            }
        };
    }

    config.server.validate()?;
    config.rate_limit.validate()?;

    debug!(
        provider = %config.providers.provider,
        gemini_keys = config.providers.gemini.api_keys.len(),
        openrouter_key = config.providers.openrouter.api_key.is_some(),
        rate_limiting = config.rate_limit.is_enabled(),
        "Configuration resolved"
    );

    Ok(config)
}

/// Split a comma-delimited key list, dropping blank entries
#[must_use]
pub fn parse_key_pool(raw: &str) -> Vec<SecretString> {
    raw.split(',')
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .map(|key| SecretString::new(key.to_string()))
        .collect()
}

fn parse_number<T>(key: &'static str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ConfigError::invalid(key, format!("`{value}`: {e}")))
}

fn parse_base_url(key: &'static str, value: &str) -> ConfigResult<String> {
    let trimmed = value.trim().trim_end_matches('/');
    url::Url::parse(trimmed).map_err(|e| ConfigError::invalid(key, e.to_string()))?;
    Ok(trimmed.to_string())
}
