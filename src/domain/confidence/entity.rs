//! Inputs to multi-factor confidence scoring

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five confidence signals, each expected in `[0, 1]`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfidenceComponents {
    pub historical_accuracy: f64,
    pub pattern_strength: f64,
    pub context_similarity: f64,
    pub user_profile_alignment: f64,
    pub temporal_relevance: f64,
}

impl ConfidenceComponents {
    /// All components at the neutral value
    pub fn neutral() -> Self {
        Self {
            historical_accuracy: super::NEUTRAL_SCORE,
            pattern_strength: super::NEUTRAL_SCORE,
            context_similarity: super::NEUTRAL_SCORE,
            user_profile_alignment: super::NEUTRAL_SCORE,
            temporal_relevance: super::NEUTRAL_SCORE,
        }
    }
}

/// Whether a past prediction matched what the user actually did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionOutcome {
    pub prediction: String,
    pub actual: String,
    pub correct: bool,
    pub recorded_at: DateTime<Utc>,
}

impl PredictionOutcome {
    pub fn new(prediction: impl Into<String>, actual: impl Into<String>, correct: bool) -> Self {
        Self {
            prediction: prediction.into(),
            actual: actual.into(),
            correct,
            recorded_at: Utc::now(),
        }
    }

    pub fn recorded_at(mut self, at: DateTime<Utc>) -> Self {
        self.recorded_at = at;
        self
    }
}

/// A learned sequence of workflow steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPattern {
    pub sequence: Vec<String>,
    #[serde(default)]
    pub context: BTreeMap<String, String>,
    pub frequency: u32,
    pub success_rate: f64,
}

impl WorkflowPattern {
    pub fn new<S: Into<String>>(sequence: impl IntoIterator<Item = S>) -> Self {
        Self {
            sequence: sequence.into_iter().map(Into::into).collect(),
            context: BTreeMap::new(),
            frequency: 1,
            success_rate: super::NEUTRAL_SCORE,
        }
    }

    pub fn with_context_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    pub fn with_frequency(mut self, frequency: u32) -> Self {
        self.frequency = frequency;
        self
    }

    pub fn with_success_rate(mut self, success_rate: f64) -> Self {
        self.success_rate = success_rate;
        self
    }

    pub fn contains_step(&self, step: &str) -> bool {
        self.sequence.iter().any(|s| s == step)
    }
}

/// Who is working on what, used for context similarity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowContext {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    pub workflow_type: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl WorkflowContext {
    pub fn new(workflow_type: impl Into<String>) -> Self {
        Self {
            workflow_type: workflow_type.into(),
            ..Default::default()
        }
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Six-level ordinal expertise scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpertiseLevel {
    Novice,
    Low,
    Intermediate,
    High,
    Advanced,
    Expert,
}

impl ExpertiseLevel {
    pub const LEVEL_COUNT: usize = 6;

    pub fn ordinal(&self) -> usize {
        match self {
            Self::Novice => 0,
            Self::Low => 1,
            Self::Intermediate => 2,
            Self::High => 3,
            Self::Advanced => 4,
            Self::Expert => 5,
        }
    }

    /// `1 - |distance| / (levels - 1)`
    pub fn alignment_with(&self, other: ExpertiseLevel) -> f64 {
        let distance = self.ordinal().abs_diff(other.ordinal()) as f64;
        1.0 - distance / (Self::LEVEL_COUNT - 1) as f64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStyle {
    Systematic,
    Adaptive,
    Efficient,
    Thorough,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserExpertiseProfile {
    pub acquisition_experience: ExpertiseLevel,
    #[serde(default)]
    pub domain_knowledge: HashMap<String, ExpertiseLevel>,
    /// Fraction of past workflows completed successfully
    pub success_history: f64,
    /// Average hours per task
    pub average_task_time: f64,
    pub preferred_workflow_style: WorkflowStyle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPredictionRequest {
    pub current_step: String,
    pub document_type: String,
    pub domain: String,
    pub estimated_complexity: ExpertiseLevel,
    pub required_expertise: ExpertiseLevel,
}

/// A past signal whose weight decays with age
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemporalFactor {
    pub timestamp: DateTime<Utc>,
    pub relevance: f64,
    pub context: String,
}

impl TemporalFactor {
    pub fn new(timestamp: DateTime<Utc>, relevance: f64, context: impl Into<String>) -> Self {
        Self {
            timestamp,
            relevance,
            context: context.into(),
        }
    }
}
