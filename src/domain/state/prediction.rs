//! Ranked next-state predictions

use std::time::Duration;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::entity::WorkflowState;

/// A candidate next state with its learned probability and scored confidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatePrediction {
    /// Identifier feedback can refer back to
    pub id: Uuid,
    pub next_state: WorkflowState,
    /// Transition probability (0.0 - 1.0)
    pub probability: f64,
    /// Confidence in the prediction (0.0 - 1.0)
    pub confidence: f64,
    pub reasoning: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<Duration>,
}

impl StatePrediction {
    pub fn new(
        next_state: WorkflowState,
        probability: f64,
        confidence: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            next_state,
            probability: unit_interval(probability),
            confidence: unit_interval(confidence),
            reasoning: reasoning.into(),
            estimated_duration: None,
        }
    }

    pub fn with_estimated_duration(mut self, duration: Duration) -> Self {
        self.estimated_duration = Some(duration);
        self
    }

    /// Sort key: confidence weighted by probability
    pub fn ranking_score(&self) -> f64 {
        self.confidence * self.probability
    }
}

/// Clamp into `[0, 1]`; NaN maps to 0
fn unit_interval(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Order predictions by ranking score, highest first
pub fn rank_predictions(predictions: &mut [StatePrediction]) {
    predictions.sort_by(|a, b| {
        b.ranking_score()
            .partial_cmp(&a.ranking_score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(step: &str, probability: f64, confidence: f64) -> StatePrediction {
        StatePrediction::new(
            WorkflowState::new("review", step, "RFP"),
            probability,
            confidence,
            "test",
        )
    }

    #[test]
    fn test_new_clamps_values() {
        let p = prediction("a", 1.5, -0.2);
        assert_eq!(p.probability, 1.0);
        assert_eq!(p.confidence, 0.0);

        let nan = prediction("b", f64::NAN, f64::NAN);
        assert_eq!(nan.probability, 0.0);
        assert_eq!(nan.confidence, 0.0);
    }

    #[test]
    fn test_rank_predictions() {
        let mut predictions = vec![
            prediction("low", 0.2, 0.5),
            prediction("high", 0.9, 0.9),
            prediction("mid", 0.5, 0.8),
        ];

        rank_predictions(&mut predictions);

        let steps: Vec<&str> = predictions
            .iter()
            .map(|p| p.next_state.current_step())
            .collect();
        assert_eq!(steps, vec!["high", "mid", "low"]);
    }

    #[test]
    fn test_ids_are_unique() {
        let a = prediction("a", 0.5, 0.5);
        let b = prediction("a", 0.5, 0.5);
        assert_ne!(a.id, b.id);
    }
}
