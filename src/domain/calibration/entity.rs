//! Calibration data and diagnostic types

use std::fmt;
use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A confidence that was shown to the user and whether it turned out right
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationDataPoint {
    pub predicted_confidence: f64,
    pub actual_outcome: bool,
}

impl CalibrationDataPoint {
    pub fn new(predicted_confidence: f64, actual_outcome: bool) -> Self {
        Self {
            predicted_confidence,
            actual_outcome,
        }
    }

    /// The point with its confidence clamped to `[0, 1]`, or `None` when the
    /// confidence is not finite
    pub fn sanitized(self) -> Option<Self> {
        if !self.predicted_confidence.is_finite() {
            return None;
        }
        Some(Self::new(
            self.predicted_confidence.clamp(0.0, 1.0),
            self.actual_outcome,
        ))
    }

    /// Squared error against the binary outcome
    pub fn squared_error(&self) -> f64 {
        let outcome = if self.actual_outcome { 1.0 } else { 0.0 };
        (self.predicted_confidence - outcome).powi(2)
    }
}

/// Calibration points collected during one week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyCalibrationData {
    pub week: DateTime<Utc>,
    pub calibration_points: Vec<CalibrationDataPoint>,
}

/// A scored prediction, paired by index with an [`OutcomeData`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionData {
    pub confidence: f64,
    #[serde(default)]
    pub features: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutcomeData {
    pub success: bool,
    #[serde(default)]
    pub actual_value: f64,
}

/// Observed success frequency for one confidence bin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationPlotPoint {
    pub bin_center: f64,
    pub observed_frequency: f64,
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationPlot {
    pub points: Vec<CalibrationPlotPoint>,
    /// Fit of observed frequency against the ideal diagonal
    pub r_squared: f64,
}

/// Accuracy measured within one confidence range
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliabilityDataPoint {
    pub confidence_bin: RangeInclusive<f64>,
    pub accuracy: f64,
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReliabilityDiagram {
    pub points: Vec<ReliabilityDataPoint>,
    pub overall_accuracy: f64,
}

/// Coarse confidence bucket shown to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceCategory {
    High,
    Medium,
    Low,
    VeryLow,
}

impl ConfidenceCategory {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::High
        } else if score >= 0.6 {
            Self::Medium
        } else if score >= 0.4 {
            Self::Low
        } else {
            Self::VeryLow
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::VeryLow => "very_low",
        }
    }
}

impl fmt::Display for ConfidenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
