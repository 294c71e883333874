//! Provider adapters built from configuration.

use gateway_config::GatewayConfig;
use gateway_core::GatewayResult;
use gateway_providers::{GeminiConfig, GeminiProvider, OpenRouterConfig, OpenRouterProvider};
use gateway_routing::ProviderRouter;
use std::sync::Arc;
use tracing::{info, warn};

/// Build a router holding every supported adapter.
///
/// Both adapters are always registered; the configured selection is applied
/// per request, so an unknown `AI_PROVIDER` still lets the service start.
///
/// # Errors
/// Returns an error if an HTTP client cannot be created.
pub fn build_provider_router(config: &GatewayConfig) -> GatewayResult<ProviderRouter> {
    let settings = &config.providers;

    let gemini = GeminiConfig::new(settings.gemini.api_keys.clone())
        .with_base_url(settings.gemini.base_url.as_str())
        .with_timeout(settings.upstream_timeout)
        .with_mock_response(config.environment.is_development());

    let openrouter = OpenRouterConfig::new(settings.openrouter.api_key.clone())
        .with_base_url(settings.openrouter.base_url.as_str())
        .with_attribution(
            settings.openrouter.referer.as_str(),
            settings.openrouter.title.as_str(),
        )
        .with_timeout(settings.upstream_timeout);

    let gemini = GeminiProvider::new(gemini)?;
    let openrouter = OpenRouterProvider::new(openrouter)?;

    info!(
        gemini_keys = gemini.key_count(),
        openrouter_key = settings.openrouter.api_key.is_some(),
        "Provider adapters created"
    );

    match settings.selected() {
        Ok(provider) => info!(
            provider = %provider,
            model = settings.model_for(provider),
            "Selected chat provider"
        ),
        Err(_) => warn!(
            provider = %settings.provider,
            "AI_PROVIDER is not supported, chat requests will fail"
        ),
    }

    Ok(ProviderRouter::new()
        .with_provider(Arc::new(gemini))
        .with_provider(Arc::new(openrouter)))
}
