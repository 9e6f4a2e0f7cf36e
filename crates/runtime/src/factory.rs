//! Service wiring.
//!
//! The factory owns the connection pool and hands out the shared
//! [`PreferenceService`]. Nothing is registered globally.

use std::sync::Arc;

use domain::services::{PreferenceService, PreferenceStore};
use persistence::PreferenceRepository;
use sqlx::PgPool;
use tracing::info;

use crate::config::Config;
use crate::error::RuntimeError;

pub struct ServiceFactory {
    pool: Option<PgPool>,
    preference_service: Arc<PreferenceService>,
}

impl ServiceFactory {
    /// Connect to the database, apply migrations if configured, and build an
    /// initialized preference service.
    pub async fn bootstrap(config: &Config) -> Result<Self, RuntimeError> {
        info!("Starting preference store v{}", env!("CARGO_PKG_VERSION"));

        let db_config: persistence::db::DatabaseConfig = (&config.database).into();
        let pool = persistence::db::create_pool(&db_config).await?;

        if config.database.run_migrations {
            persistence::db::run_migrations(&pool).await?;
        }

        let repository = Arc::new(PreferenceRepository::new(pool.clone()));
        let factory = Self::with_store(config, repository)?;

        Ok(Self {
            pool: Some(pool),
            ..factory
        })
    }

    /// Build the service over an arbitrary store, e.g. the in-memory one.
    pub fn with_store(
        config: &Config,
        store: Arc<dyn PreferenceStore>,
    ) -> Result<Self, RuntimeError> {
        let service = PreferenceService::new(store)
            .with_max_options_length(config.preferences.max_options_length)
            .with_span(tracing::info_span!("preference_service"));
        service.init()?;

        Ok(Self {
            pool: None,
            preference_service: Arc::new(service),
        })
    }

    pub fn preference_service(&self) -> Arc<PreferenceService> {
        Arc::clone(&self.preference_service)
    }

    pub fn pool(&self) -> Option<&PgPool> {
        self.pool.as_ref()
    }

    /// Record connection pool gauges.
    pub fn record_pool_metrics(&self) {
        if let Some(pool) = &self.pool {
            persistence::metrics::record_pool_metrics(pool);
        }
    }

    /// Dispose the service and close the pool.
    pub async fn shutdown(self) {
        self.preference_service.dispose();
        if let Some(pool) = self.pool {
            pool.close().await;
        }
        info!("Preference store shut down");
    }
}
