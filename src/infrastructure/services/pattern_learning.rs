//! Pattern learning engine
//!
//! Entry point for hosts: combines the state predictor with learned workflow
//! patterns, enforces privacy settings and feature flags, and routes user
//! feedback back into both the transition model and confidence calibration.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::confidence::{clamp_confidence_score, WorkflowPattern};
use crate::domain::feedback::PredictionFeedback;
use crate::domain::gating::{PredictionPrivacySettings, WorkflowPredictionFeatureFlags};
use crate::domain::state::{Phase, StatePrediction, WorkflowState};
use crate::infrastructure::logging::PRIVACY_TARGET;
use crate::infrastructure::observability::record_feedback;

use super::confidence_scorer::{ConfidenceScorer, DOCUMENT_TYPE_CONTEXT_KEY};
use super::state_predictor::StatePredictor;

/// Confidence threshold used when the caller has no preference
pub const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.7;

/// Success rate assumed for the pattern built from the current state
const CURRENT_PATTERN_SUCCESS_RATE: f64 = 0.7;

/// Share of pattern support added to a prediction's confidence
const PATTERN_BOOST_FACTOR: f64 = 0.2;

/// Outcomes considered when measuring accuracy improvement
const IMPROVEMENT_WINDOW: usize = 100;

const CURRENT_STEP_CONTEXT_KEY: &str = "currentStep";

// ============================================================================
// Types
// ============================================================================

/// Where the user is, as reported by the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternWorkflowState {
    pub current_step: String,
    #[serde(default)]
    pub completed_steps: Vec<String>,
    pub document_type: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl PatternWorkflowState {
    pub fn new(current_step: impl Into<String>, document_type: impl Into<String>) -> Self {
        Self {
            current_step: current_step.into(),
            completed_steps: Vec::new(),
            document_type: document_type.into(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn with_completed_steps<S: Into<String>>(mut self, steps: impl IntoIterator<Item = S>) -> Self {
        self.completed_steps = steps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_metadata_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn phase(&self) -> Phase {
        Phase::infer_from_step(&self.current_step)
    }

    /// Predictor state with the phase inferred from the step name
    pub fn to_workflow_state(&self) -> WorkflowState {
        WorkflowState::new(
            self.phase().as_str(),
            self.current_step.as_str(),
            self.document_type.as_str(),
        )
        .with_metadata(self.metadata.clone())
    }

    fn to_pattern(&self) -> WorkflowPattern {
        let mut sequence = Vec::with_capacity(self.completed_steps.len() + 1);
        sequence.push(self.current_step.clone());
        sequence.extend(self.completed_steps.iter().cloned());

        let mut pattern = WorkflowPattern::new(sequence)
            .with_context_entry(DOCUMENT_TYPE_CONTEXT_KEY, self.document_type.as_str())
            .with_context_entry(CURRENT_STEP_CONTEXT_KEY, self.current_step.as_str())
            .with_success_rate(CURRENT_PATTERN_SUCCESS_RATE);
        pattern.context.extend(self.metadata.clone());
        pattern
    }
}

/// A suggested next step with everything a host needs to present it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowPrediction {
    /// Id of the underlying state prediction, used for feedback
    pub id: Uuid,
    pub next_steps: Vec<String>,
    pub confidence: f64,
    pub reasoning: String,
    pub alternative_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_duration: Option<Duration>,
    pub required_resources: Vec<String>,
    pub risk_factors: Vec<String>,
}

/// Running statistics of sequence predictions
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningMetrics {
    pub total_predictions: u64,
    /// Calls that returned at least one prediction
    pub successful_predictions: u64,
    pub average_latency: Duration,
    pub average_confidence_threshold: f64,
}

impl Default for LearningMetrics {
    fn default() -> Self {
        Self {
            total_predictions: 0,
            successful_predictions: 0,
            average_latency: Duration::ZERO,
            average_confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl LearningMetrics {
    fn record(&mut self, latency: Duration, returned: usize, threshold: f64) {
        let previous = self.total_predictions as f64;
        self.total_predictions += 1;
        if returned > 0 {
            self.successful_predictions += 1;
        }

        let total = self.total_predictions as f64;
        self.average_latency = Duration::from_secs_f64(
            (self.average_latency.as_secs_f64() * previous + latency.as_secs_f64()) / total,
        );
        self.average_confidence_threshold =
            (self.average_confidence_threshold * previous + threshold) / total;
    }
}

// ============================================================================
// Pattern Learning Engine
// ============================================================================

/// Learns user workflow habits and turns them into ranked suggestions
#[derive(Debug)]
pub struct PatternLearningEngine {
    predictor: Arc<StatePredictor>,
    scorer: Arc<ConfidenceScorer>,
    metrics: Mutex<LearningMetrics>,
}

impl PatternLearningEngine {
    pub fn new(predictor: Arc<StatePredictor>, scorer: Arc<ConfidenceScorer>) -> Self {
        Self {
            predictor,
            scorer,
            metrics: Mutex::new(LearningMetrics::default()),
        }
    }

    pub fn predictor(&self) -> &Arc<StatePredictor> {
        &self.predictor
    }

    pub fn scorer(&self) -> &Arc<ConfidenceScorer> {
        &self.scorer
    }

    /// Record a step the user reached
    pub async fn observe_state(&self, state: WorkflowState) {
        self.scorer.observe_state(state.key()).await;
        self.predictor.update_current_state(state).await;
    }

    /// Learn from a finished workflow
    pub async fn record_completed_workflow(
        &self,
        sequence: Vec<String>,
        context: BTreeMap<String, String>,
        success: bool,
    ) {
        if !self.predictor.gate().await.is_open() {
            return;
        }
        self.scorer.record_workflow(sequence, context, success).await;
    }

    // ========================================================================
    // Prediction
    // ========================================================================

    /// Suggested next steps at or above `threshold`, most confident first
    pub async fn predict_workflow_sequence(
        &self,
        current: &PatternWorkflowState,
        threshold: f64,
    ) -> Vec<WorkflowPrediction> {
        let gate = self.predictor.gate().await;
        if !gate.is_open() {
            info!(
                target: PRIVACY_TARGET,
                context = "predict_workflow_sequence",
                "Predictions disabled, returning empty results"
            );
            return Vec::new();
        }

        let started = Instant::now();
        let state = current.to_workflow_state();
        let base = self
            .predictor
            .predict_next_states(&state, gate.flags.max_predictions)
            .await;

        let enhanced = self.enhance_with_patterns(base, current).await;
        let mut predictions: Vec<WorkflowPrediction> = enhanced
            .into_iter()
            .filter(|p| p.confidence >= threshold)
            .map(|p| to_workflow_prediction(p, current))
            .collect();
        predictions.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        self.metrics
            .lock()
            .await
            .record(started.elapsed(), predictions.len(), threshold);

        info!(
            target: PRIVACY_TARGET,
            context = "predict_workflow_sequence",
            count = predictions.len(),
            threshold,
            "Generated workflow predictions"
        );
        predictions
    }

    async fn enhance_with_patterns(
        &self,
        base: Vec<StatePrediction>,
        current: &PatternWorkflowState,
    ) -> Vec<StatePrediction> {
        let similar: Vec<WorkflowPattern> = self
            .scorer
            .patterns()
            .await
            .into_iter()
            .filter(|p| {
                p.context.get(DOCUMENT_TYPE_CONTEXT_KEY) == Some(&current.document_type)
                    || p.contains_step(&current.current_step)
            })
            .collect();
        let strengths = self
            .scorer
            .calculate_pattern_strengths(&current.to_pattern(), &similar)
            .await;

        base.into_iter()
            .map(|mut prediction| {
                let boost = pattern_boost(&prediction, &similar, &strengths);
                prediction.confidence = clamp_confidence_score(prediction.confidence + boost);
                prediction.reasoning = format!(
                    "Enhanced: {} (Pattern boost: +{}%)",
                    prediction.reasoning,
                    (boost * 100.0) as u32
                );
                prediction
            })
            .collect()
    }

    // ========================================================================
    // Feedback
    // ========================================================================

    /// Learn from what the user did with a prediction
    ///
    /// Returns how much historical accuracy over the recent window improved,
    /// never negative. Returns `0.0` while predictions are disabled.
    pub async fn process_prediction_feedback(&self, feedback: &PredictionFeedback) -> f64 {
        let gate = self.predictor.gate().await;
        if !gate.is_open() {
            info!(
                target: PRIVACY_TARGET,
                context = "process_prediction_feedback",
                "Feedback processing disabled"
            );
            return 0.0;
        }

        let predicted_step = self
            .predictor
            .apply_feedback(feedback)
            .await
            .map(|key| key.current_step)
            .unwrap_or_else(|| feedback.actual_next_step.clone());
        self.scorer.record_feedback(feedback, &predicted_step).await;

        let improvement = self.accuracy_improvement().await;
        if gate.privacy.allow_analytics {
            record_feedback(feedback.user_action);
        }

        info!(
            target: PRIVACY_TARGET,
            context = "process_prediction_feedback",
            action = feedback.user_action.as_str(),
            improvement,
            "Processed prediction feedback"
        );
        improvement
    }

    async fn accuracy_improvement(&self) -> f64 {
        let outcomes = self.scorer.outcomes().await;
        let recent = &outcomes[outcomes.len().saturating_sub(IMPROVEMENT_WINDOW)..];
        if recent.is_empty() {
            return 0.0;
        }

        let previous = self
            .scorer
            .calculate_historical_accuracy(&recent[..recent.len() - 1])
            .await;
        let current = self.scorer.calculate_historical_accuracy(recent).await;
        (current - previous).max(0.0)
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Apply new privacy settings
    ///
    /// Shrinking retention prunes older outcomes; disabling predictions
    /// clears all learned data.
    pub async fn update_privacy_settings(&self, settings: PredictionPrivacySettings) {
        let previous = self.predictor.gate().await.privacy;
        self.predictor.set_privacy_settings(settings.clone()).await;

        info!(
            target: PRIVACY_TARGET,
            context = "update_privacy_settings",
            predictions = settings.enable_predictions,
            retention_days = settings.data_retention_days,
            analytics = settings.allow_analytics,
            "Privacy settings updated"
        );

        if settings.data_retention_days < previous.data_retention_days {
            let cutoff = Utc::now() - chrono::Duration::days(i64::from(settings.data_retention_days));
            self.scorer.prune_outcomes_older_than(cutoff).await;
        }

        if previous.enable_predictions && !settings.enable_predictions {
            self.clear_learned_data().await;
        }
    }

    pub async fn update_feature_flags(&self, flags: WorkflowPredictionFeatureFlags) {
        info!(
            target: PRIVACY_TARGET,
            context = "update_feature_flags",
            predictions = flags.enable_predictions,
            auto_execution = flags.enable_auto_execution,
            max_predictions = flags.max_predictions,
            "Feature flags updated"
        );
        self.predictor.set_feature_flags(flags).await;
    }

    pub async fn metrics(&self) -> LearningMetrics {
        self.metrics.lock().await.clone()
    }

    /// Forget everything and restore default settings
    pub async fn reset(&self) {
        self.clear_learned_data().await;
        self.predictor
            .set_privacy_settings(PredictionPrivacySettings::default())
            .await;
        self.predictor
            .set_feature_flags(WorkflowPredictionFeatureFlags::default())
            .await;
        *self.metrics.lock().await = LearningMetrics::default();

        info!(target: PRIVACY_TARGET, context = "reset", "Engine reset completed");
    }

    async fn clear_learned_data(&self) {
        self.predictor.reset().await;
        self.scorer.reset().await;
        info!(
            target: PRIVACY_TARGET,
            context = "clear_learned_data",
            "Prediction data cleared"
        );
    }
}

/// Mean `strength * success_rate` of patterns containing the predicted step,
/// scaled by [`PATTERN_BOOST_FACTOR`]
fn pattern_boost(prediction: &StatePrediction, patterns: &[WorkflowPattern], strengths: &[f64]) -> f64 {
    if patterns.is_empty() || patterns.len() != strengths.len() {
        return 0.0;
    }

    let step = prediction.next_state.current_step();
    let (total, count) = patterns
        .iter()
        .zip(strengths)
        .filter(|(pattern, _)| pattern.contains_step(step))
        .fold((0.0, 0usize), |(total, count), (pattern, strength)| {
            (total + strength * pattern.success_rate, count + 1)
        });

    if count == 0 {
        return 0.0;
    }
    debug!(step, supporting = count, "Applying pattern boost");
    total / count as f64 * PATTERN_BOOST_FACTOR
}

fn to_workflow_prediction(prediction: StatePrediction, current: &PatternWorkflowState) -> WorkflowPrediction {
    let next_phase = Phase::parse(prediction.next_state.phase());
    WorkflowPrediction {
        id: prediction.id,
        next_steps: vec![prediction.next_state.current_step().to_string()],
        confidence: prediction.confidence,
        required_resources: required_resources(next_phase),
        risk_factors: risk_factors(next_phase, current),
        reasoning: prediction.reasoning,
        alternative_steps: Vec::new(),
        estimated_duration: prediction.estimated_duration,
    }
}

fn required_resources(phase: Option<Phase>) -> Vec<String> {
    let resources: &[&str] = match phase {
        Some(Phase::Planning) => &["Project Manager", "Business Analyst", "Documentation"],
        Some(Phase::Execution) => &["Developer", "Designer", "Testing Environment"],
        Some(Phase::Review) => &["Reviewer", "Quality Assurance", "Documentation"],
        Some(Phase::Closeout) => &["Project Manager", "Stakeholder Sign-off"],
        None => &["Team Member"],
    };
    resources.iter().map(|r| r.to_string()).collect()
}

fn risk_factors(next_phase: Option<Phase>, current: &PatternWorkflowState) -> Vec<String> {
    let mut risks = Vec::new();

    if current.metadata.get("complexity").map(String::as_str) == Some("high") {
        risks.push("High complexity may cause delays".to_string());
    }
    if next_phase != Some(current.phase()) {
        risks.push("Phase transition requires stakeholder approval".to_string());
    }
    if current.document_type == "RFP" {
        risks.push("Regulatory compliance requirements".to_string());
    }

    if risks.is_empty() {
        risks.push("Standard workflow risks".to_string());
    }
    risks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::feedback::UserAction;

    fn engine() -> PatternLearningEngine {
        let scorer = Arc::new(ConfidenceScorer::default());
        let predictor = Arc::new(StatePredictor::default().with_signals(scorer.clone()));
        PatternLearningEngine::new(predictor, scorer)
    }

    fn steps(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_phase_inference() {
        assert_eq!(PatternWorkflowState::new("market_research", "RFP").phase(), Phase::Planning);
        assert_eq!(PatternWorkflowState::new("implementation", "RFP").phase(), Phase::Execution);
        assert_eq!(PatternWorkflowState::new("technical_evaluation", "RFP").phase(), Phase::Review);
        assert_eq!(PatternWorkflowState::new("final_signoff", "RFP").phase(), Phase::Closeout);
        assert_eq!(PatternWorkflowState::new("something_else", "RFP").phase(), Phase::Planning);
    }

    #[test]
    fn test_current_pattern() {
        let state = PatternWorkflowState::new("market_research", "SOW")
            .with_completed_steps(["intake"])
            .with_metadata_entry("agency", "DOD");
        let pattern = state.to_pattern();

        assert_eq!(pattern.sequence, steps(&["market_research", "intake"]));
        assert_eq!(pattern.context.get("documentType").map(String::as_str), Some("SOW"));
        assert_eq!(pattern.context.get("currentStep").map(String::as_str), Some("market_research"));
        assert_eq!(pattern.context.get("agency").map(String::as_str), Some("DOD"));
        assert_eq!(pattern.success_rate, 0.7);
    }

    #[test]
    fn test_risk_factors() {
        let rfp = PatternWorkflowState::new("market_research", "RFP").with_metadata_entry("complexity", "high");
        assert_eq!(
            risk_factors(Some(Phase::Execution), &rfp),
            vec![
                "High complexity may cause delays",
                "Phase transition requires stakeholder approval",
                "Regulatory compliance requirements",
            ]
        );

        let sow = PatternWorkflowState::new("market_research", "SOW");
        assert_eq!(risk_factors(Some(Phase::Planning), &sow), vec!["Standard workflow risks"]);
    }

    #[test]
    fn test_required_resources() {
        assert_eq!(
            required_resources(Some(Phase::Closeout)),
            vec!["Project Manager", "Stakeholder Sign-off"]
        );
        assert_eq!(required_resources(None), vec!["Team Member"]);
    }

    #[test]
    fn test_pattern_boost() {
        let prediction = StatePrediction::new(WorkflowState::new("review", "evaluation", "RFP"), 0.5, 0.4, "x");
        let patterns = vec![
            WorkflowPattern::new(["evaluation", "award"]).with_success_rate(1.0),
            WorkflowPattern::new(["evaluation"]).with_success_rate(0.5),
            WorkflowPattern::new(["other"]).with_success_rate(1.0),
        ];

        let boost = pattern_boost(&prediction, &patterns, &[1.0, 0.8, 1.0]);
        assert!((boost - (1.0 + 0.4) / 2.0 * 0.2).abs() < 1e-12);

        assert_eq!(pattern_boost(&prediction, &patterns, &[1.0]), 0.0);
        assert_eq!(pattern_boost(&prediction, &[], &[]), 0.0);
    }

    #[tokio::test]
    async fn test_cold_start_sequence_respects_threshold() {
        let engine = engine();
        let current = PatternWorkflowState::new("market_research", "RFP");

        assert!(engine
            .predict_workflow_sequence(&current, DEFAULT_CONFIDENCE_THRESHOLD)
            .await
            .is_empty());

        let predictions = engine.predict_workflow_sequence(&current, 0.3).await;
        assert_eq!(predictions.len(), 2);
        for prediction in &predictions {
            assert!((prediction.confidence - 0.4).abs() < 1e-12);
            assert!(prediction.reasoning.starts_with("Enhanced: Based on typical workflow patterns"));
            assert_eq!(prediction.next_steps.len(), 1);
        }

        let metrics = engine.metrics().await;
        assert_eq!(metrics.total_predictions, 2);
        assert_eq!(metrics.successful_predictions, 1);
        assert!((metrics.average_confidence_threshold - 0.5).abs() < 1e-12);
    }

    #[tokio::test]
    async fn test_learned_patterns_boost_confidence() {
        let engine = engine();
        let mut context = BTreeMap::new();
        context.insert("documentType".to_string(), "RFP".to_string());
        for _ in 0..3 {
            engine
                .record_completed_workflow(
                    steps(&["market_research", "solicitation_preparation"]),
                    context.clone(),
                    true,
                )
                .await;
        }

        let current = PatternWorkflowState::new("market_research", "RFP");
        let predictions = engine.predict_workflow_sequence(&current, 0.0).await;

        let boosted = predictions
            .iter()
            .find(|p| p.next_steps == steps(&["solicitation_preparation"]))
            .unwrap();
        let plain = predictions
            .iter()
            .find(|p| p.next_steps == steps(&["requirements_review"]))
            .unwrap();
        assert!(boosted.confidence > plain.confidence);
        assert_eq!(predictions[0].id, boosted.id);
    }

    #[tokio::test]
    async fn test_disabled_predictions_short_circuit() {
        let engine = engine();
        engine
            .update_feature_flags(WorkflowPredictionFeatureFlags {
                enable_predictions: false,
                ..Default::default()
            })
            .await;

        let current = PatternWorkflowState::new("market_research", "RFP");
        assert!(engine.predict_workflow_sequence(&current, 0.0).await.is_empty());

        let feedback = PredictionFeedback::new(Uuid::new_v4(), UserAction::Accepted, "x", 0.9);
        assert_eq!(engine.process_prediction_feedback(&feedback).await, 0.0);
        assert_eq!(engine.scorer().outcome_count().await, 0);
        assert_eq!(engine.metrics().await.total_predictions, 0);
    }

    #[tokio::test]
    async fn test_disabling_privacy_clears_learned_data() {
        let engine = engine();
        engine
            .observe_state(WorkflowState::new("planning", "a", "RFP"))
            .await;
        engine
            .observe_state(WorkflowState::new("planning", "b", "RFP"))
            .await;
        engine
            .record_completed_workflow(steps(&["a", "b"]), BTreeMap::new(), true)
            .await;

        engine
            .update_privacy_settings(PredictionPrivacySettings {
                enable_predictions: false,
                ..Default::default()
            })
            .await;

        assert_eq!(engine.predictor().get_history_count().await, 0);
        assert!(engine.scorer().patterns().await.is_empty());
        assert!(!engine.predictor().gate().await.is_open());
    }

    #[tokio::test]
    async fn test_shrinking_retention_prunes_outcomes() {
        let engine = engine();
        let mut old = PredictionFeedback::new(Uuid::new_v4(), UserAction::Accepted, "x", 0.9);
        old.timestamp = Utc::now() - chrono::Duration::days(20);
        engine.process_prediction_feedback(&old).await;
        let fresh = PredictionFeedback::new(Uuid::new_v4(), UserAction::Rejected, "y", 0.6);
        engine.process_prediction_feedback(&fresh).await;

        engine
            .update_privacy_settings(PredictionPrivacySettings {
                data_retention_days: 7,
                ..Default::default()
            })
            .await;

        assert_eq!(engine.scorer().outcome_count().await, 1);
    }

    #[tokio::test]
    async fn test_feedback_improvement() {
        let engine = engine();
        let accepted = PredictionFeedback::new(Uuid::new_v4(), UserAction::Accepted, "x", 0.9);
        let rejected = PredictionFeedback::new(Uuid::new_v4(), UserAction::Rejected, "x", 0.9);

        // One correct outcome: 2/3 * 0.95 against the neutral 0.5
        let first = engine.process_prediction_feedback(&accepted).await;
        assert!((first - (2.0 / 3.0 * 0.95 - 0.5)).abs() < 1e-12);

        assert_eq!(engine.process_prediction_feedback(&rejected).await, 0.0);
        assert_eq!(engine.scorer().outcome_count().await, 2);
    }

    #[tokio::test]
    async fn test_feedback_reinforces_issued_prediction() {
        let engine = engine();
        let from = WorkflowState::new("planning", "market_research", "RFP");
        let to_a = WorkflowState::new("execution", "solicitation", "RFP");
        let to_b = WorkflowState::new("review", "requirements_review", "RFP");
        engine.predictor().update_transition_probability(&from, &to_a, 0.5).await;
        engine.predictor().update_transition_probability(&from, &to_b, 0.5).await;

        let current = PatternWorkflowState::new("market_research", "RFP");
        let predictions = engine.predict_workflow_sequence(&current, 0.0).await;
        let chosen = predictions
            .iter()
            .find(|p| p.next_steps == steps(&["requirements_review"]))
            .unwrap();

        let before = engine.predictor().get_transition_probability(&from, &to_b).await;
        let feedback = PredictionFeedback::new(chosen.id, UserAction::Accepted, "requirements_review", chosen.confidence);
        engine.process_prediction_feedback(&feedback).await;

        assert!(engine.predictor().get_transition_probability(&from, &to_b).await > before);
        let outcomes = engine.scorer().outcomes().await;
        assert_eq!(outcomes[0].prediction, "requirements_review");
        assert!(outcomes[0].correct);
    }

    #[tokio::test]
    async fn test_reset_restores_defaults() {
        let engine = engine();
        engine
            .update_feature_flags(WorkflowPredictionFeatureFlags {
                max_predictions: 1,
                ..Default::default()
            })
            .await;
        engine
            .predict_workflow_sequence(&PatternWorkflowState::new("review", "RFP"), 0.0)
            .await;

        engine.reset().await;

        assert_eq!(engine.predictor().gate().await.flags.max_predictions, 3);
        assert_eq!(engine.metrics().await, LearningMetrics::default());
    }
}
