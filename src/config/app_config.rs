use serde::Deserialize;

use crate::domain::calibration::CalibrationSettings;
use crate::domain::gating::{PredictionPrivacySettings, WorkflowPredictionFeatureFlags};
use crate::domain::history::MAX_HISTORY_CAPACITY;
use crate::domain::snapshot::validate_snapshot_key;
use crate::domain::DomainError;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub logging: LoggingConfig,
    pub predictor: PredictorConfig,
    pub calibration: CalibrationConfig,
    pub storage: StorageSettings,
    pub privacy: PrivacyConfig,
    pub features: FeatureConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictorConfig {
    pub history_capacity: usize,
    pub learning_rate: f64,
    /// Predictions slower than this are reported, not aborted
    pub latency_budget_ms: u64,
    pub max_predictions: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CalibrationConfig {
    pub min_points: usize,
    pub max_points: usize,
    pub recalibration_interval_days: i64,
    pub brier_threshold: f64,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    File,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Directory for the file backend
    pub path: String,
    /// Connection URL for the postgres backend
    pub url: Option<String>,
    pub table: String,
    pub snapshot_key: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PrivacyConfig {
    pub enable_predictions: bool,
    pub data_retention_days: u32,
    pub allow_analytics: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    pub enable_predictions: bool,
    pub enable_auto_execution: bool,
    pub max_predictions: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            history_capacity: 1000,
            learning_rate: 0.1,
            latency_budget_ms: 100,
            max_predictions: 5,
        }
    }
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        let settings = CalibrationSettings::default();
        Self {
            min_points: settings.min_points,
            max_points: settings.max_points,
            recalibration_interval_days: settings.recalibration_interval_days,
            brier_threshold: settings.brier_threshold,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            path: "data/snapshots".to_string(),
            url: None,
            table: "predictor_snapshots".to_string(),
            snapshot_key: "default".to_string(),
        }
    }
}

impl Default for PrivacyConfig {
    fn default() -> Self {
        let settings = PredictionPrivacySettings::default();
        Self {
            enable_predictions: settings.enable_predictions,
            data_retention_days: settings.data_retention_days,
            allow_analytics: settings.allow_analytics,
        }
    }
}

impl Default for FeatureConfig {
    fn default() -> Self {
        let flags = WorkflowPredictionFeatureFlags::default();
        Self {
            enable_predictions: flags.enable_predictions,
            enable_auto_execution: flags.enable_auto_execution,
            max_predictions: flags.max_predictions,
        }
    }
}

impl CalibrationConfig {
    pub fn to_settings(&self) -> CalibrationSettings {
        CalibrationSettings {
            min_points: self.min_points,
            max_points: self.max_points,
            recalibration_interval_days: self.recalibration_interval_days,
            brier_threshold: self.brier_threshold,
        }
    }
}

impl PrivacyConfig {
    pub fn to_settings(&self) -> PredictionPrivacySettings {
        PredictionPrivacySettings {
            enable_predictions: self.enable_predictions,
            data_retention_days: self.data_retention_days,
            allow_analytics: self.allow_analytics,
        }
    }
}

impl FeatureConfig {
    pub fn to_flags(&self) -> WorkflowPredictionFeatureFlags {
        WorkflowPredictionFeatureFlags {
            enable_predictions: self.enable_predictions,
            enable_auto_execution: self.enable_auto_execution,
            max_predictions: self.max_predictions,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Reject settings the predictor cannot run with
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.predictor.history_capacity == 0 {
            return Err(DomainError::configuration(
                "predictor.history_capacity must be greater than 0",
            ));
        }

        if self.predictor.history_capacity > MAX_HISTORY_CAPACITY {
            return Err(DomainError::configuration(format!(
                "predictor.history_capacity must be at most {}",
                MAX_HISTORY_CAPACITY
            )));
        }

        let rate = self.predictor.learning_rate;
        if !(rate > 0.0 && rate <= 1.0) {
            return Err(DomainError::configuration(format!(
                "predictor.learning_rate must be in (0, 1], got {}",
                rate
            )));
        }

        if self.calibration.max_points < self.calibration.min_points {
            return Err(DomainError::configuration(
                "calibration.max_points must not be smaller than calibration.min_points",
            ));
        }

        if !(0.0..=1.0).contains(&self.calibration.brier_threshold) {
            return Err(DomainError::configuration(
                "calibration.brier_threshold must be in [0, 1]",
            ));
        }

        if self.storage.backend == StorageBackend::Postgres && self.storage.url.is_none() {
            return Err(DomainError::configuration(
                "storage.url is required for the postgres backend",
            ));
        }

        validate_snapshot_key(&self.storage.snapshot_key)
            .map_err(|e| DomainError::configuration(format!("storage.snapshot_key: {}", e)))?;

        Ok(())
    }
}
