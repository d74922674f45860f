//! Layered application configuration

mod app_config;

pub use app_config::{
    AppConfig, CalibrationConfig, FeatureConfig, LogFormat, LoggingConfig, PredictorConfig,
    PrivacyConfig, StorageBackend, StorageSettings,
};
