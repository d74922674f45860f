//! Feedback domain - what the user did with a prediction

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::calibration::CalibrationDataPoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserAction {
    Accepted,
    Rejected,
    Modified,
    Ignored,
}

impl UserAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Modified => "modified",
            Self::Ignored => "ignored",
        }
    }

    /// Only an accepted prediction counts as correct
    pub fn is_correct(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

impl fmt::Display for UserAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User response to a previously issued prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionFeedback {
    pub prediction_id: Uuid,
    pub user_action: UserAction,
    pub actual_next_step: String,
    /// Confidence that was shown with the prediction
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

impl PredictionFeedback {
    pub fn new(
        prediction_id: Uuid,
        user_action: UserAction,
        actual_next_step: impl Into<String>,
        confidence: f64,
    ) -> Self {
        Self {
            prediction_id,
            user_action,
            actual_next_step: actual_next_step.into(),
            confidence,
            timestamp: Utc::now(),
        }
    }

    pub fn is_correct(&self) -> bool {
        self.user_action.is_correct()
    }

    pub fn calibration_point(&self) -> CalibrationDataPoint {
        CalibrationDataPoint::new(self.confidence, self.is_correct())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_accepted_is_correct() {
        assert!(UserAction::Accepted.is_correct());
        assert!(!UserAction::Rejected.is_correct());
        assert!(!UserAction::Modified.is_correct());
        assert!(!UserAction::Ignored.is_correct());
    }

    #[test]
    fn test_calibration_point() {
        let feedback = PredictionFeedback::new(Uuid::new_v4(), UserAction::Modified, "review", 0.7);
        let point = feedback.calibration_point();
        assert_eq!(point.predicted_confidence, 0.7);
        assert!(!point.actual_outcome);
    }

    #[test]
    fn test_feedback_deserializes_camel_case() {
        let json = r#"{
            "predictionId": "6f1c2b4e-3a9d-4c8e-9b7a-1d2e3f4a5b6c",
            "userAction": "accepted",
            "actualNextStep": "proposal_evaluation",
            "confidence": 0.82,
            "timestamp": "2026-03-01T12:00:00Z"
        }"#;

        let feedback: PredictionFeedback = serde_json::from_str(json).unwrap();
        assert_eq!(feedback.user_action, UserAction::Accepted);
        assert_eq!(feedback.actual_next_step, "proposal_evaluation");
    }
}
