//! Workflow Predictor
//!
//! Learns how users move through acquisition workflows and predicts their
//! next steps:
//! - Probabilistic finite-state model over workflow phases
//! - Multi-factor confidence scoring with Platt calibration
//! - Privacy settings and feature flags that can switch predictions off
//! - Snapshot persistence (memory, file, PostgreSQL)

pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use tracing::info;

use domain::snapshot::SnapshotKey;
use infrastructure::services::{
    ConfidenceScorer, PatternLearningEngine, StatePredictor, StatePredictorConfig,
};
use infrastructure::storage::SnapshotRepositoryFactory;

/// Create the learning engine with default configuration
pub async fn create_engine() -> anyhow::Result<PatternLearningEngine> {
    create_engine_with_config(&AppConfig::default()).await
}

/// Create the learning engine with custom configuration
///
/// The predictor scores candidates with the engine's confidence scorer and
/// persists snapshots through the configured storage backend.
pub async fn create_engine_with_config(config: &AppConfig) -> anyhow::Result<PatternLearningEngine> {
    config.validate()?;

    let repository = SnapshotRepositoryFactory::create(&config.storage).await?;
    let key = SnapshotKey::new(config.storage.snapshot_key.as_str())?;

    let scorer = Arc::new(ConfidenceScorer::new(config.calibration.to_settings()));
    let predictor = StatePredictor::new(StatePredictorConfig::from(&config.predictor))
        .with_signals(scorer.clone())
        .with_repository(repository, key);

    predictor.set_privacy_settings(config.privacy.to_settings()).await;
    predictor.set_feature_flags(config.features.to_flags()).await;

    info!(
        backend = ?config.storage.backend,
        history_capacity = config.predictor.history_capacity,
        "Workflow predictor initialized"
    );

    Ok(PatternLearningEngine::new(Arc::new(predictor), scorer))
}
