//! Business logic services

pub mod auth;
pub mod catalog;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    repository: Repository,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), config.auth.clone()),
            catalog: catalog::CatalogService::new(repository.clone(), config.catalog.clone()),
            repository,
        }
    }

    /// Check that the database answers
    pub async fn ready(&self) -> crate::error::AppResult<()> {
        self.repository.ping().await
    }
}
