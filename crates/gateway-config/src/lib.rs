//! # Gateway Config
//!
//! Configuration management for the Nexus chat gateway.
//!
//! Configuration is read from the environment once at process start into an
//! immutable [`GatewayConfig`]. Per request, [`ProviderSettings::resolve`]
//! yields the [`ProviderConfig`] handed to the router.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod loader;

pub use config::{
    Environment, GatewayConfig, GeminiSettings, LogFormat, LoggingSettings, OpenRouterSettings,
    ProviderConfig, ProviderSettings, RateLimitSettings, ServerSettings, DEFAULT_SYSTEM_PROMPT,
};
pub use error::{ConfigError, ConfigResult};
pub use loader::{load_config, load_from_lookup, parse_key_pool};
