use std::sync::Arc;

use config::{Config, ConfigError};
use db::{DBService, DbErr};
use thiserror::Error;
use utils_jwt::TokenKeys;

pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;

#[cfg(test)]
pub(crate) mod test_support;

#[derive(Debug, Error)]
pub enum DeploymentError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Database(#[from] DbErr),
}

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct DeploymentImpl {
    config: Arc<Config>,
    db: DBService,
    tokens: TokenKeys,
}

impl DeploymentImpl {
    pub async fn new(config: Config) -> Result<Self, DeploymentError> {
        let db = DBService::new(&config.database_url).await?;
        Ok(Self::from_parts(config, db))
    }

    pub fn from_parts(config: Config, db: DBService) -> Self {
        let tokens = TokenKeys::new(
            config.jwt_secret_bytes(),
            config.jwt_issuer.clone(),
            chrono::Duration::seconds(config.session_ttl_secs),
        );
        Self {
            config: Arc::new(config),
            db,
            tokens,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn tokens(&self) -> &TokenKeys {
        &self.tokens
    }
}
