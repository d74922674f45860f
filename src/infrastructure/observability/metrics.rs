//! Prediction metrics
//!
//! Emitted through the `metrics` facade; the host decides which recorder
//! (if any) is installed.

use std::time::Duration;

use metrics::{counter, gauge, histogram};

use crate::domain::feedback::UserAction;

/// Where a batch of predictions came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PredictionSource {
    /// Learned transition probabilities
    Learned,
    /// Static cold-start table
    Fallback,
    /// Predictions disabled by privacy settings or feature flags
    Gated,
}

impl PredictionSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Learned => "learned",
            Self::Fallback => "fallback",
            Self::Gated => "gated",
        }
    }
}

/// Record one prediction call and whether it blew the latency budget
pub fn record_prediction(source: PredictionSource, latency: Duration, budget: Duration) {
    let labels = [("source", source.as_str().to_string())];

    counter!("workflow_predictions_total", &labels).increment(1);
    histogram!("workflow_prediction_latency_seconds", &labels).record(latency.as_secs_f64());

    if latency > budget {
        counter!("workflow_prediction_budget_exceeded_total").increment(1);
    }
}

pub fn record_feedback(action: UserAction) {
    counter!("workflow_feedback_total", "action" => action.as_str()).increment(1);
}

pub fn record_recalibration(brier_loss: f64) {
    counter!("workflow_recalibrations_total").increment(1);
    gauge!("workflow_calibration_brier_loss").set(brier_loss);
}
