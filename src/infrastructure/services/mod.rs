//! Infrastructure services - stateful owners of the prediction model

mod confidence_scorer;
mod pattern_learning;
mod state_predictor;

pub use confidence_scorer::{
    ConfidenceScorer, DOCUMENT_TYPE_CONTEXT_KEY, MAX_OUTCOMES, MAX_PATTERNS,
};
pub use pattern_learning::{
    LearningMetrics, PatternLearningEngine, PatternWorkflowState, WorkflowPrediction,
    DEFAULT_CONFIDENCE_THRESHOLD,
};
pub use state_predictor::{PerformanceMetrics, StatePredictor, StatePredictorConfig};
