//! Provider router.
//!
//! Dispatches a normalized message to the adapter named by the resolved
//! [`ProviderConfig`]. Provider choice is a deployment decision: a failing
//! provider is never retried against another one.

use gateway_config::ProviderConfig;
use gateway_core::{
    ChatPrompt, ChatProvider, EffectiveMessage, GatewayError, GatewayResult, ProviderType,
    UpstreamResult,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Table of registered adapters
#[derive(Clone, Default)]
pub struct ProviderRouter {
    providers: HashMap<ProviderType, Arc<dyn ChatProvider>>,
}

impl ProviderRouter {
    /// Create an empty router
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any previous one of the same type
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn ChatProvider>) -> Self {
        self.register(provider);
        self
    }

    /// Register an adapter, replacing any previous one of the same type
    pub fn register(&mut self, provider: Arc<dyn ChatProvider>) {
        self.providers.insert(provider.provider_type(), provider);
    }

    /// Registered provider types
    #[must_use]
    pub fn provider_types(&self) -> Vec<ProviderType> {
        let mut types: Vec<_> = self.providers.keys().copied().collect();
        types.sort_by_key(|t| t.as_str());
        types
    }

    /// Adapter selected by `config`.
    ///
    /// # Errors
    /// `InvalidConfiguration` if the provider name is unknown or has no
    /// registered adapter.
    pub fn select(&self, config: &ProviderConfig) -> GatewayResult<&Arc<dyn ChatProvider>> {
        let provider_type: ProviderType = config.provider_name.parse()?;
        self.providers.get(&provider_type).ok_or_else(|| {
            GatewayError::configuration(format!("{provider_type} provider is not available"))
        })
    }

    /// Send `message` to the configured provider
    ///
    /// # Errors
    /// Configuration errors before any network call, or the adapter's error.
    #[instrument(skip_all, fields(provider = %config.provider_name, model = %config.model_id))]
    pub async fn route(
        &self,
        config: &ProviderConfig,
        message: &EffectiveMessage,
    ) -> UpstreamResult {
        let provider = self.select(config)?;

        debug!(message_len = message.len(), "Dispatching to provider");

        let prompt = ChatPrompt {
            model: &config.model_id,
            system_prompt: &config.system_prompt,
            message,
        };
        provider.complete(&prompt).await
    }
}

impl std::fmt::Debug for ProviderRouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRouter")
            .field("providers", &self.provider_types())
            .finish()
    }
}
