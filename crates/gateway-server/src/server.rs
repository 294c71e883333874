//! HTTP server.

use gateway_config::ServerSettings;
use std::net::{SocketAddr, ToSocketAddrs};
use tracing::info;

use crate::{error::ServerError, routes::create_router, shutdown::shutdown_signal, state::AppState};

/// Listen address configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
}

impl From<&ServerSettings> for ServerConfig {
    fn from(settings: &ServerSettings) -> Self {
        Self {
            host: settings.host.clone(),
            port: settings.port,
        }
    }
}

impl ServerConfig {
    /// Resolve the socket address to bind
    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let display = format!("{}:{}", self.host, self.port);
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|_| ServerError::InvalidAddress(display.clone()))?
            .next()
            .ok_or(ServerError::InvalidAddress(display))
    }
}

/// Gateway HTTP server
#[derive(Debug)]
pub struct Server {
    config: ServerConfig,
    state: AppState,
}

impl Server {
    /// Create a server for `state`
    #[must_use]
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self { config, state }
    }

    /// Serve until a shutdown signal arrives, then drain in-flight requests
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.socket_addr()?;
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        info!(addr = %addr, "Gateway listening");

        axum::serve(listener, create_router(self.state))
            .with_graceful_shutdown(async {
                shutdown_signal().await;
            })
            .await?;

        info!("Gateway stopped");
        Ok(())
    }
}
