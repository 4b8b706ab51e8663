//! Application state - shared across all handlers.

use std::sync::Arc;

use quill_core::ports::{PasswordService, TokenService};
use quill_core::services::{
    ContentService, FeedService, IdentityService, RelationService, Repositories,
};
use quill_infra::{Argon2PasswordService, InMemoryStore, JwtTokenService};

#[cfg(feature = "postgres")]
use quill_infra::DatabaseConnections;

use crate::config::AppConfig;

/// Why the server could not assemble its state.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    /// `DATABASE_URL` is set but the pool could not be opened.
    #[cfg(feature = "postgres")]
    #[error("database unavailable: {0}")]
    Database(String),
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<IdentityService>,
    pub content: Arc<ContentService>,
    pub relations: Arc<RelationService>,
    pub feed: Arc<FeedService>,
    pub tokens: Arc<dyn TokenService>,
    #[cfg(feature = "postgres")]
    pub db: Option<Arc<DatabaseConnections>>,
}

impl AppState {
    /// Build the application state with appropriate implementations.
    ///
    /// Without `DATABASE_URL` the server runs on the in-memory store. With it,
    /// an unreachable database is a startup failure.
    pub async fn new(config: &AppConfig) -> Result<Self, StartupError> {
        let tokens: Arc<dyn TokenService> = Arc::new(JwtTokenService::new(config.jwt.clone()));
        let passwords: Arc<dyn PasswordService> = Arc::new(Argon2PasswordService::new());

        #[cfg(feature = "postgres")]
        {
            let db = match &config.database {
                Some(db_config) => {
                    let connections = DatabaseConnections::init(db_config).await.map_err(|e| {
                        tracing::error!(error = %e, "Failed to connect to database");
                        StartupError::Database(e.to_string())
                    })?;
                    Some(Arc::new(connections))
                }
                None => {
                    tracing::warn!(
                        "DATABASE_URL not set. Running without database (in-memory mode)."
                    );
                    None
                }
            };

            let repos = match &db {
                Some(connections) => connections.repositories(),
                None => InMemoryStore::new().repositories(),
            };

            let mut state = Self::from_repositories(&repos, tokens, passwords);
            state.db = db;
            tracing::info!("Application state initialized");
            Ok(state)
        }

        #[cfg(not(feature = "postgres"))]
        {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            let state =
                Self::from_repositories(&InMemoryStore::new().repositories(), tokens, passwords);
            tracing::info!("Application state initialized");
            Ok(state)
        }
    }

    /// Wire every service over one set of repositories.
    pub fn from_repositories(
        repos: &Repositories,
        tokens: Arc<dyn TokenService>,
        passwords: Arc<dyn PasswordService>,
    ) -> Self {
        let content = Arc::new(ContentService::new(repos));

        Self {
            identity: Arc::new(IdentityService::new(repos, passwords)),
            relations: Arc::new(RelationService::new(repos)),
            feed: Arc::new(FeedService::new(repos, content.clone())),
            content,
            tokens,
            #[cfg(feature = "postgres")]
            db: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use quill_infra::JwtConfig;

    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            #[cfg(feature = "postgres")]
            database: None,
            jwt: JwtConfig::default(),
        }
    }

    #[actix_rt::test]
    async fn test_no_database_url_runs_in_memory() {
        let state = AppState::new(&config()).await;
        assert!(state.is_ok());
    }

    #[cfg(feature = "postgres")]
    #[actix_rt::test]
    async fn test_unreachable_database_fails_startup() {
        use quill_infra::DatabaseConfig;

        let config = AppConfig {
            database: Some(DatabaseConfig {
                url: "not-a-database-url".to_string(),
                max_connections: 1,
                min_connections: 0,
            }),
            ..config()
        };

        let result = AppState::new(&config).await;
        assert!(matches!(result, Err(StartupError::Database(_))));
    }
}
