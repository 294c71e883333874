//! Prometheus metrics.

use crate::error::TelemetryError;
use prometheus::{
    HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::time::Duration;
use tracing::error;

/// Outcome label for successful chat requests
pub const OUTCOME_SUCCESS: &str = "success";

const LATENCY_BUCKETS: &[f64] = &[0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0];

/// Gateway metrics backed by a private registry
#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    chat_requests: IntCounterVec,
    admission_rejections: IntCounter,
    upstream_latency: HistogramVec,
}

impl Metrics {
    /// Create and register all gateway metrics
    ///
    /// # Errors
    /// Returns an error if a metric cannot be registered.
    pub fn new() -> Result<Self, TelemetryError> {
        let registry = Registry::new();

        let chat_requests = IntCounterVec::new(
            Opts::new("nexus_chat_requests_total", "Chat requests by provider and outcome"),
            &["provider", "outcome"],
        )?;
        let admission_rejections = IntCounter::new(
            "nexus_admission_rejections_total",
            "Requests rejected by admission control",
        )?;
        let upstream_latency = HistogramVec::new(
            HistogramOpts::new(
                "nexus_upstream_latency_seconds",
                "Upstream provider call latency",
            )
            .buckets(LATENCY_BUCKETS.to_vec()),
            &["provider"],
        )?;

        registry.register(Box::new(chat_requests.clone()))?;
        registry.register(Box::new(admission_rejections.clone()))?;
        registry.register(Box::new(upstream_latency.clone()))?;

        Ok(Self {
            registry,
            chat_requests,
            admission_rejections,
            upstream_latency,
        })
    }

    /// Count a finished chat request
    pub fn record_request(&self, provider: &str, outcome: &str) {
        self.chat_requests
            .with_label_values(&[provider, outcome])
            .inc();
    }

    /// Count an admission rejection
    pub fn record_rejection(&self) {
        self.admission_rejections.inc();
    }

    /// Observe one upstream call
    pub fn observe_upstream(&self, provider: &str, elapsed: Duration) {
        self.upstream_latency
            .with_label_values(&[provider])
            .observe(elapsed.as_secs_f64());
    }

    /// Value of the request counter for a label pair
    #[must_use]
    pub fn request_count(&self, provider: &str, outcome: &str) -> u64 {
        self.chat_requests
            .with_label_values(&[provider, outcome])
            .get()
    }

    /// Value of the rejection counter
    #[must_use]
    pub fn rejection_count(&self) -> u64 {
        self.admission_rejections.get()
    }

    /// Render all metrics in the Prometheus text format
    #[must_use]
    pub fn gather(&self) -> String {
        TextEncoder::new()
            .encode_to_string(&self.registry.gather())
            .unwrap_or_else(|e| {
                error!(error = %e, "Failed to encode metrics");
                String::new()
            })
    }
}

impl std::fmt::Debug for Metrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Metrics").finish_non_exhaustive()
    }
}
