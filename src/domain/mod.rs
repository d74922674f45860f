//! Domain layer - Core prediction model, scoring and calibration

pub mod calibration;
pub mod confidence;
pub mod error;
pub mod feedback;
pub mod gating;
pub mod history;
pub mod snapshot;
pub mod state;
pub mod transition;

pub use calibration::{
    CalibrationDataPoint, CalibrationEngine, CalibrationSettings, ConfidenceCategory,
    PlattParameters,
};
pub use confidence::{
    ConfidenceComponents, ConfidenceSignals, NeutralSignals, PredictionOutcome, WorkflowContext,
    WorkflowPattern,
};
pub use error::DomainError;
pub use feedback::{PredictionFeedback, UserAction};
pub use gating::{PredictionGate, PredictionPrivacySettings, WorkflowPredictionFeatureFlags};
pub use history::StateHistoryBuffer;
pub use snapshot::{PredictorSnapshot, SnapshotKey, SnapshotRepository};
pub use state::{Phase, StateKey, StatePrediction, WorkflowState};
pub use transition::{TransitionEntry, TransitionModel};
