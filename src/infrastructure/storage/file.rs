//! File-backed snapshot repository, one JSON document per key

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::domain::snapshot::{PredictorSnapshot, SnapshotKey, SnapshotRepository};
use crate::domain::DomainError;

#[derive(Debug, Clone)]
pub struct FileSnapshotRepository {
    directory: PathBuf,
}

impl FileSnapshotRepository {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Keys are validated, so they cannot escape the directory
    fn path_for(&self, key: &SnapshotKey) -> PathBuf {
        self.directory.join(format!("{}.json", key.as_str()))
    }
}

#[async_trait]
impl SnapshotRepository for FileSnapshotRepository {
    async fn save(&self, snapshot: PredictorSnapshot) -> Result<(), DomainError> {
        fs::create_dir_all(&self.directory).await.map_err(|e| {
            DomainError::storage(format!(
                "Failed to create snapshot directory {}: {}",
                self.directory.display(),
                e
            ))
        })?;

        let data = serde_json::to_vec_pretty(&snapshot).map_err(|e| {
            DomainError::serialization(format!("Failed to serialize snapshot: {}", e))
        })?;

        // Write then rename, so readers never see a partial document
        let path = self.path_for(&snapshot.key);
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, &data)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to write snapshot: {}", e)))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to replace snapshot: {}", e)))?;

        debug!(key = %snapshot.key, path = %path.display(), "Snapshot written");
        Ok(())
    }

    async fn load(&self, key: &SnapshotKey) -> Result<Option<PredictorSnapshot>, DomainError> {
        let path = self.path_for(key);
        let data = match fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(DomainError::storage(format!(
                    "Failed to read snapshot {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        let snapshot = serde_json::from_slice(&data).map_err(|e| {
            DomainError::serialization(format!("Failed to deserialize snapshot: {}", e))
        })?;
        Ok(Some(snapshot))
    }

    async fn delete(&self, key: &SnapshotKey) -> Result<bool, DomainError> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(DomainError::storage(format!(
                "Failed to delete snapshot: {}",
                e
            ))),
        }
    }
}
