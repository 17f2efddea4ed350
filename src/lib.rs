//! Stacks library catalog server
//!
//! REST JSON API for a small library catalog: books, categories and the
//! user accounts allowed to edit them.

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub mod api;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
    pub throttle: middleware::rate_limit::Throttle,
}

impl AppState {
    /// Wire services and the rate limiter over a database pool
    pub fn new(config: AppConfig, pool: Pool<Postgres>) -> Self {
        let repository = repository::Repository::new(pool);
        let services = services::Services::new(repository, &config);
        let throttle = middleware::rate_limit::Throttle::new(&config.rate_limit);
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
            throttle,
        }
    }
}
