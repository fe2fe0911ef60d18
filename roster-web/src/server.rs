//! Main web server implementation using Axum

use crate::{create_app, AppState, WebError, WebResult};
use axum::serve;
use roster_core::RosterConfig;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Main roster web server
pub struct RosterServer {
    config: RosterConfig,
    state: AppState,
}

impl RosterServer {
    /// Create a new server
    pub async fn new(config: RosterConfig) -> WebResult<Self> {
        let state = AppState::new(config.clone()).await?;

        Ok(Self { config, state })
    }

    /// Start the web server
    pub async fn start(self) -> WebResult<()> {
        let address = self.config.address();

        info!("Starting roster web server");
        info!("Server address: http://{}", address);
        info!("Development mode: {}", self.config.server.dev_mode);

        let app = create_app(self.state.clone());

        let listener = TcpListener::bind(&address)
            .await
            .map_err(WebError::Server)?;

        info!("Server listening on http://{}", address);

        if let Err(e) = serve(listener, app).await {
            error!("Server error: {}", e);
            return Err(WebError::Server(e));
        }

        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Builder for RosterServer
pub struct RosterServerBuilder {
    config: RosterConfig,
}

impl RosterServerBuilder {
    /// Create a new server builder from environment-derived defaults
    pub fn new() -> Self {
        Self {
            config: RosterConfig::from_env(),
        }
    }

    /// Start from an explicit configuration
    pub fn with_config(config: RosterConfig) -> Self {
        Self { config }
    }

    /// Set the server host
    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.config.server.host = host.into();
        self
    }

    /// Set the server port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Enable development mode
    pub fn dev_mode(mut self, dev_mode: bool) -> Self {
        self.config.server.dev_mode = dev_mode;
        self
    }

    /// Set database URL
    pub fn database_url<S: Into<String>>(mut self, database_url: S) -> Self {
        self.config.database.url = database_url.into();
        self
    }

    /// Build the server
    pub async fn build(self) -> WebResult<RosterServer> {
        RosterServer::new(self.config).await
    }
}

impl Default for RosterServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
