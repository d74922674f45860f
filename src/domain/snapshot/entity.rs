//! Durable image of a predictor

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SnapshotKey;
use crate::domain::transition::TransitionEntry;
use crate::domain::state::WorkflowState;

/// Everything needed to rebuild a predictor's learned state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictorSnapshot {
    pub key: SnapshotKey,
    pub transitions: Vec<TransitionEntry>,
    pub learning_rate: f64,
    pub current_state: Option<WorkflowState>,
    /// History contents, oldest first
    #[serde(default)]
    pub history: Vec<WorkflowState>,
    pub history_capacity: usize,
    pub saved_at: DateTime<Utc>,
}

impl PredictorSnapshot {
    pub fn transition_count(&self) -> usize {
        self.transitions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::state::StateKey;

    #[test]
    fn test_json_round_trip_is_exact() {
        let snapshot = PredictorSnapshot {
            key: SnapshotKey::new("default").unwrap(),
            transitions: vec![TransitionEntry {
                from: StateKey::new("planning", "a", "RFP"),
                to: StateKey::new("execution", "b", "RFP"),
                probability: 1.0 / 3.0,
            }],
            learning_rate: 0.1,
            current_state: Some(WorkflowState::new("planning", "a", "RFP")),
            history: vec![WorkflowState::new("planning", "a", "RFP")],
            history_capacity: 1000,
            saved_at: Utc::now(),
        };

        let json = serde_json::to_string(&snapshot).unwrap();
        let restored: PredictorSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, snapshot);
        assert_eq!(restored.transition_count(), 1);
    }
}
