//! Confidence domain - multi-factor scoring of predictions

mod entity;
mod scoring;
mod signals;

/// Score used whenever a component has no evidence
pub const NEUTRAL_SCORE: f64 = 0.5;

pub use entity::{
    ConfidenceComponents, ExpertiseLevel, PredictionOutcome, TemporalFactor,
    UserExpertiseProfile, WorkflowContext, WorkflowPattern, WorkflowPredictionRequest,
    WorkflowStyle,
};
pub use scoring::{
    clamp_confidence_score, confidence_variance, context_entry_jaccard, context_similarity,
    decay_weight, historical_accuracy, historical_accuracy_from_counts, jaccard,
    longest_common_subsequence, max_frequency, metadata_key_jaccard, pattern_strength,
    sequence_similarity, temporal_relevance, user_profile_alignment, weighted_confidence, weights,
    HISTORICAL_DECAY, STYLE_FACTOR, TEMPORAL_HALF_LIFE_DAYS,
};
pub use signals::{ConfidenceSignals, NeutralSignals};

#[cfg(test)]
pub use signals::MockConfidenceSignals;
