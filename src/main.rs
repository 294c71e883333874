//! # Nexus Chat Gateway
//!
//! Single-turn AI chat gateway. Accepts one user message on `POST /api/chat`,
//! applies per-caller admission control and forwards the message to the
//! configured provider (Google Gemini or OpenRouter).
//!
//! ## Usage
//!
//! ```bash
//! # Gemini with a pool of keys
//! GOOGLE_GEMINI_API_KEY=key-a,key-b nexus-chat-gateway
//!
//! # OpenRouter, with admission control shared through Redis
//! AI_PROVIDER=openrouter OPENROUTER_API_KEY=sk-or-... \
//!     REDIS_URL=redis://127.0.0.1:6379 nexus-chat-gateway
//! ```

use gateway_config::{load_config, GatewayConfig, LogFormat, RateLimitSettings};
use gateway_ratelimit::{AdmissionController, CounterStore, RedisCounterStore};
use gateway_server::{build_provider_router, AppState, Server, ServerConfig};
use gateway_telemetry::{init_logging, LoggingConfig, Metrics};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Application entry point
#[tokio::main]
async fn main() {
    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            if let Err(log_err) = init_logging(&LoggingConfig::new()) {
                eprintln!("Failed to initialize logging: {log_err}");
            }
            error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    let logging = LoggingConfig::new()
        .with_level(config.logging.level.as_str())
        .with_json(config.logging.format == LogFormat::Json);
    if let Err(e) = init_logging(&logging) {
        eprintln!("Failed to initialize logging: {e}");
    }

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        "Starting Nexus chat gateway"
    );

    if let Err(e) = run(config).await {
        error!(error = %e, "Application failed");
        std::process::exit(1);
    }
}

/// Main application logic
async fn run(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = Metrics::new()?;
    let providers = build_provider_router(&config)?;

    let mut builder = AppState::builder().router(providers).metrics(metrics);

    let redis_url = config
        .rate_limit
        .redis_url
        .as_ref()
        .filter(|_| config.rate_limit.is_enabled());

    if let Some(url) = redis_url {
        let store = RedisCounterStore::connect(url.expose_secret()).await?;
        builder = builder.admission(admission_controller(&config.rate_limit, Arc::new(store)));
        info!(
            limit = config.rate_limit.max_requests,
            window_secs = config.rate_limit.window_secs,
            "Admission control enabled"
        );
    } else {
        warn!("REDIS_URL not set, admission control disabled");
    }

    let server_config = ServerConfig::from(&config.server);
    let state = builder.config(config).build()?;

    Server::new(server_config, state).run().await?;

    Ok(())
}

fn admission_controller(
    settings: &RateLimitSettings,
    store: Arc<dyn CounterStore>,
) -> AdmissionController {
    AdmissionController::new(store)
        .with_limit(settings.max_requests, settings.window())
        .with_key_prefix(settings.key_prefix.as_str())
        .with_operation_timeout(settings.operation_timeout())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gateway_ratelimit::{MemoryCounterStore, RateLimitKey};
    use std::time::Duration;

    #[tokio::test]
    async fn test_admission_controller_follows_settings() {
        let settings = RateLimitSettings {
            max_requests: 2,
            window_secs: 30,
            key_prefix: "custom".to_string(),
            ..RateLimitSettings::default()
        };

        let controller = admission_controller(&settings, Arc::new(MemoryCounterStore::new()));
        assert_eq!(controller.limit(), 2);
        assert_eq!(controller.window(), Duration::from_secs(30));

        let key = RateLimitKey::new("192.0.2.1");
        assert!(controller.admit(&key).await.allowed);
    }
}
