//! Dataset storage
//!
//! Handlers see storage only through [`DatasetRepository`]; the backend is
//! chosen by `storage.backend` at start-up.

pub mod memory;
pub mod postgres;

use std::{sync::Arc, time::Duration};

use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use crate::config::{Config, StorageBackend};
use crate::error::{AppError, AppResult};
use crate::models::{Dataset, DatasetSummary};

pub use memory::MemoryDatasetRepository;
pub use postgres::PostgresDatasetRepository;

#[axum::async_trait]
pub trait DatasetRepository: Send + Sync {
    /// Summaries of every dataset, newest first
    async fn list(&self) -> AppResult<Vec<DatasetSummary>>;

    async fn get(&self, id: Uuid) -> AppResult<Option<Dataset>>;

    /// Store a new dataset; an existing id is a conflict
    async fn put(&self, dataset: Dataset) -> AppResult<()>;

    /// Returns whether a dataset was removed
    async fn delete(&self, id: Uuid) -> AppResult<bool>;

    /// Backend name reported by the health check
    fn backend_name(&self) -> &'static str;

    async fn is_available(&self) -> bool {
        true
    }
}

pub(crate) fn duplicate(id: Uuid) -> AppError {
    AppError::Conflict {
        resource: "dataset".to_string(),
        message: format!("Dataset {} already exists", id),
    }
}

/// Build the configured repository, running migrations in development
pub async fn connect(config: &Config) -> anyhow::Result<Arc<dyn DatasetRepository>> {
    match config.storage.backend {
        StorageBackend::Memory => {
            tracing::info!("Using in-memory dataset storage");
            Ok(Arc::new(MemoryDatasetRepository::new()))
        }
        StorageBackend::Postgres => {
            let url = config
                .storage
                .database_url
                .as_deref()
                .ok_or_else(|| AppError::Configuration("storage.database_url is not set".into()))?;

            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.storage.max_connections)
                .min_connections(config.storage.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(url)
                .await?;
            tracing::info!("Database connection established");

            // Run migrations in development
            if config.is_development() {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("Migrations completed");
            }

            Ok(Arc::new(PostgresDatasetRepository::new(pool)))
        }
    }
}
