//! Snapshot repository selection from configuration

use std::sync::Arc;

use tracing::info;

use crate::config::{StorageBackend, StorageSettings};
use crate::domain::snapshot::SnapshotRepository;
use crate::domain::DomainError;

use super::file::FileSnapshotRepository;
use super::in_memory::InMemorySnapshotRepository;
use super::postgres::{PostgresConfig, PostgresSnapshotRepository};

/// Factory for creating snapshot repositories
#[derive(Debug)]
pub struct SnapshotRepositoryFactory;

impl SnapshotRepositoryFactory {
    pub async fn create(
        settings: &StorageSettings,
    ) -> Result<Arc<dyn SnapshotRepository>, DomainError> {
        match settings.backend {
            StorageBackend::Memory => {
                info!("Using in-memory snapshot storage");
                Ok(Arc::new(InMemorySnapshotRepository::new()))
            }
            StorageBackend::File => {
                info!(path = %settings.path, "Using file snapshot storage");
                Ok(Arc::new(FileSnapshotRepository::new(&settings.path)))
            }
            StorageBackend::Postgres => {
                let url = settings.url.as_deref().ok_or_else(|| {
                    DomainError::configuration("storage.url is required for the postgres backend")
                })?;
                let repository =
                    PostgresSnapshotRepository::connect(&PostgresConfig::new(url), &settings.table)
                        .await?;
                info!(table = %settings.table, "Using PostgreSQL snapshot storage");
                Ok(Arc::new(repository))
            }
        }
    }
}
