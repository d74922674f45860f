//! Gating domain - host-owned switches that can turn predictions off

use serde::{Deserialize, Serialize};

pub const DEFAULT_RETENTION_DAYS: u32 = 30;
pub const DEFAULT_FLAG_MAX_PREDICTIONS: usize = 3;

/// User privacy choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PredictionPrivacySettings {
    pub enable_predictions: bool,
    pub data_retention_days: u32,
    pub allow_analytics: bool,
}

impl Default for PredictionPrivacySettings {
    fn default() -> Self {
        Self {
            enable_predictions: true,
            data_retention_days: DEFAULT_RETENTION_DAYS,
            allow_analytics: true,
        }
    }
}

/// Rollout switches for the prediction feature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowPredictionFeatureFlags {
    pub enable_predictions: bool,
    pub enable_auto_execution: bool,
    pub max_predictions: usize,
}

impl Default for WorkflowPredictionFeatureFlags {
    fn default() -> Self {
        Self {
            enable_predictions: true,
            enable_auto_execution: false,
            max_predictions: DEFAULT_FLAG_MAX_PREDICTIONS,
        }
    }
}

/// Privacy settings and feature flags evaluated together
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionGate {
    pub privacy: PredictionPrivacySettings,
    pub flags: WorkflowPredictionFeatureFlags,
}

impl PredictionGate {
    pub fn new(privacy: PredictionPrivacySettings, flags: WorkflowPredictionFeatureFlags) -> Self {
        Self { privacy, flags }
    }

    /// Both the user and the feature flags must allow predictions
    pub fn is_open(&self) -> bool {
        self.privacy.enable_predictions && self.flags.enable_predictions
    }

    /// Caller's requested count, capped by the feature flags
    pub fn effective_max(&self, requested: usize) -> usize {
        requested.min(self.flags.max_predictions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let gate = PredictionGate::default();
        assert!(gate.is_open());
        assert_eq!(gate.privacy.data_retention_days, 30);
        assert!(!gate.flags.enable_auto_execution);
        assert_eq!(gate.flags.max_predictions, 3);
    }

    #[test]
    fn test_either_switch_closes_gate() {
        let mut gate = PredictionGate::default();
        gate.privacy.enable_predictions = false;
        assert!(!gate.is_open());

        let mut gate = PredictionGate::default();
        gate.flags.enable_predictions = false;
        assert!(!gate.is_open());
    }

    #[test]
    fn test_effective_max() {
        let gate = PredictionGate::default();
        assert_eq!(gate.effective_max(5), 3);
        assert_eq!(gate.effective_max(2), 2);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let privacy: PredictionPrivacySettings =
            serde_json::from_str(r#"{"enablePredictions": false}"#).unwrap();
        assert!(!privacy.enable_predictions);
        assert_eq!(privacy.data_retention_days, 30);
    }
}
