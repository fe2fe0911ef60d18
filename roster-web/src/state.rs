//! Application state management

use crate::{
    users::{service::UserService, store::DatabaseUserStore},
    WebError, WebResult,
};
use roster_core::RosterConfig;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: RosterConfig,
    /// User directory service
    pub user_service: UserService,
}

impl AppState {
    /// Create a new application state
    pub async fn new(config: RosterConfig) -> WebResult<Self> {
        config
            .validate()
            .map_err(|e| WebError::Config(e.to_string()))?;

        let pool = connect(&config.database.url).await?;

        let store = DatabaseUserStore::new(pool)
            .await
            .map_err(|e| WebError::Database(e.to_string()))?;

        let user_service = UserService::new(store, config.database.cas_max_retries);

        info!("Application state initialized successfully");
        Ok(Self {
            config,
            user_service,
        })
    }
}

/// Open a SQLite pool, creating the database file when needed
async fn connect(database_url: &str) -> WebResult<SqlitePool> {
    info!("Connecting to database: {}", database_url);

    if database_url.contains(":memory:") {
        // Every pooled connection to :memory: would get its own empty
        // database, so pin the pool to one connection that never recycles.
        let options = SqliteConnectOptions::new().in_memory(true);

        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await
            .map_err(|e| WebError::Database(format!("Failed to connect to database: {}", e)))
    } else {
        let db_path = database_url.strip_prefix("sqlite:").unwrap_or(database_url);

        if let Some(parent) = std::path::Path::new(db_path).parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    WebError::Database(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(db_path)
            .create_if_missing(true);

        SqlitePool::connect_with(options)
            .await
            .map_err(|e| WebError::Database(format!("Failed to connect to database: {}", e)))
    }
}
