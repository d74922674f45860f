//! Snapshot domain - persistence boundary of the predictor

mod entity;
mod key;
mod repository;

pub use entity::PredictorSnapshot;
pub use key::{validate_snapshot_key, SnapshotKey, MAX_KEY_LENGTH};
pub use repository::SnapshotRepository;

#[cfg(test)]
pub use repository::MockSnapshotRepository;
