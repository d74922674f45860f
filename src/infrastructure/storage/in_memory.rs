//! In-memory snapshot repository

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::snapshot::{PredictorSnapshot, SnapshotKey, SnapshotRepository};
use crate::domain::DomainError;

/// Thread-safe in-memory snapshot store
///
/// Useful for testing and development. Data is lost when the process terminates.
#[derive(Debug, Default)]
pub struct InMemorySnapshotRepository {
    snapshots: RwLock<HashMap<SnapshotKey, PredictorSnapshot>>,
}

impl InMemorySnapshotRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snapshots.read().await.is_empty()
    }
}

#[async_trait]
impl SnapshotRepository for InMemorySnapshotRepository {
    async fn save(&self, snapshot: PredictorSnapshot) -> Result<(), DomainError> {
        let mut snapshots = self.snapshots.write().await;
        snapshots.insert(snapshot.key.clone(), snapshot);
        Ok(())
    }

    async fn load(&self, key: &SnapshotKey) -> Result<Option<PredictorSnapshot>, DomainError> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots.get(key).cloned())
    }

    async fn delete(&self, key: &SnapshotKey) -> Result<bool, DomainError> {
        let mut snapshots = self.snapshots.write().await;
        Ok(snapshots.remove(key).is_some())
    }
}
