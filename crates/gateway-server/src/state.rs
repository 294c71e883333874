//! Shared handler state.

use gateway_config::{GatewayConfig, ProviderConfig};
use gateway_ratelimit::AdmissionController;
use gateway_routing::ProviderRouter;
use gateway_telemetry::{Metrics, TelemetryError};
use std::sync::Arc;

/// State shared by every handler
#[derive(Clone, Debug)]
pub struct AppState {
    /// Gateway configuration
    pub config: Arc<GatewayConfig>,
    /// Provider selection resolved once at startup
    pub provider_config: Arc<ProviderConfig>,
    /// Provider adapters
    pub router: Arc<ProviderRouter>,
    /// Admission control; `None` admits every request
    pub admission: Option<Arc<AdmissionController>>,
    /// Prometheus metrics
    pub metrics: Metrics,
}

impl AppState {
    /// Start building a state
    #[must_use]
    pub fn builder() -> AppStateBuilder {
        AppStateBuilder::default()
    }

    /// Label for the configured provider in logs and metrics
    #[must_use]
    pub fn provider_label(&self) -> &'static str {
        self.config
            .providers
            .selected()
            .map_or("unknown", |provider| provider.as_str())
    }
}

/// Builder for [`AppState`]
#[derive(Debug, Default)]
pub struct AppStateBuilder {
    config: Option<GatewayConfig>,
    router: Option<ProviderRouter>,
    admission: Option<AdmissionController>,
    metrics: Option<Metrics>,
}

impl AppStateBuilder {
    /// Set the configuration
    #[must_use]
    pub fn config(mut self, config: GatewayConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the provider router
    #[must_use]
    pub fn router(mut self, router: ProviderRouter) -> Self {
        self.router = Some(router);
        self
    }

    /// Enable admission control
    #[must_use]
    pub fn admission(mut self, admission: AdmissionController) -> Self {
        self.admission = Some(admission);
        self
    }

    /// Set the metrics registry
    #[must_use]
    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the state
    ///
    /// # Errors
    /// Returns an error if no metrics were given and they cannot be created.
    pub fn build(self) -> Result<AppState, TelemetryError> {
        let config = self.config.unwrap_or_default();
        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => Metrics::new()?,
        };

        Ok(AppState {
            provider_config: Arc::new(config.providers.resolve()),
            config: Arc::new(config),
            router: Arc::new(self.router.unwrap_or_default()),
            admission: self.admission.map(Arc::new),
            metrics,
        })
    }
}
