//! Workflow state domain - states, keys, phase rules and predictions

mod entity;
mod prediction;
pub mod rules;

pub use entity::{StateKey, WorkflowState};
pub use prediction::{rank_predictions, StatePrediction};
pub use rules::{validate_transition, Phase};
