//! Snapshot repository trait

use async_trait::async_trait;

use super::{PredictorSnapshot, SnapshotKey};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Durable store for predictor snapshots
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SnapshotRepository: Send + Sync + std::fmt::Debug {
    /// Stores a snapshot, replacing any previous one under the same key
    async fn save(&self, snapshot: PredictorSnapshot) -> Result<(), DomainError>;

    /// Loads the snapshot stored under `key`, if any
    async fn load(&self, key: &SnapshotKey) -> Result<Option<PredictorSnapshot>, DomainError>;

    /// Removes a snapshot, returns true if one was deleted
    async fn delete(&self, key: &SnapshotKey) -> Result<bool, DomainError>;
}
