//! Confidence scorer service
//!
//! Owns the outcome ledger, learned workflow patterns and the calibration
//! engine. Scoring math lives in `domain::confidence`; this service feeds it
//! with the evidence gathered so far and fans batch work out over tokio tasks.

use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::domain::calibration::{
    calibration_plot_points, generate_calibration_plot, map_confidence_to_categories,
    reliability_points, validate_reliability_diagram, CalibrationDataPoint, CalibrationEngine,
    CalibrationPlot, CalibrationSettings, ConfidenceCategory, PlattParameters,
    RecalibrationSummary, ReliabilityDiagram, WeeklyCalibrationData, DEFAULT_BIN_COUNT,
};
use crate::domain::confidence::{
    clamp_confidence_score, confidence_variance, context_similarity, decay_weight,
    historical_accuracy, historical_accuracy_from_counts, max_frequency, pattern_strength,
    temporal_relevance, user_profile_alignment, weighted_confidence, ConfidenceComponents,
    ConfidenceSignals, PredictionOutcome, TemporalFactor, UserExpertiseProfile, WorkflowContext,
    WorkflowPattern, WorkflowPredictionRequest, NEUTRAL_SCORE,
};
use crate::domain::feedback::PredictionFeedback;
use crate::domain::state::StateKey;
use crate::infrastructure::observability::record_recalibration;

/// Outcomes kept for historical accuracy
pub const MAX_OUTCOMES: usize = 1000;

/// Learned patterns kept; the least frequent is dropped beyond this
pub const MAX_PATTERNS: usize = 500;

/// Context key holding the document type of a learned pattern
pub const DOCUMENT_TYPE_CONTEXT_KEY: &str = "documentType";

#[derive(Debug)]
struct ScorerState {
    outcomes: VecDeque<PredictionOutcome>,
    calibration: CalibrationEngine,
    patterns: Vec<WorkflowPattern>,
    last_seen: HashMap<StateKey, DateTime<Utc>>,
}

impl ScorerState {
    fn new(settings: CalibrationSettings) -> Self {
        Self {
            outcomes: VecDeque::new(),
            calibration: CalibrationEngine::new(settings),
            patterns: Vec::new(),
            last_seen: HashMap::new(),
        }
    }

    fn push_outcome(&mut self, outcome: PredictionOutcome) {
        if self.outcomes.len() == MAX_OUTCOMES {
            self.outcomes.pop_front();
        }
        self.outcomes.push_back(outcome);
    }

    fn accuracy(&self) -> f64 {
        let correct = self.outcomes.iter().filter(|o| o.correct).count() as u64;
        let incorrect = self.outcomes.len() as u64 - correct;
        historical_accuracy_from_counts(correct, incorrect)
    }
}

/// Multi-factor confidence scoring backed by observed outcomes
#[derive(Debug)]
pub struct ConfidenceScorer {
    state: Mutex<ScorerState>,
}

impl Default for ConfidenceScorer {
    fn default() -> Self {
        Self::new(CalibrationSettings::default())
    }
}

impl ConfidenceScorer {
    pub fn new(settings: CalibrationSettings) -> Self {
        Self {
            state: Mutex::new(ScorerState::new(settings)),
        }
    }

    // ========================================================================
    // Component scores
    // ========================================================================

    pub async fn calculate_historical_accuracy(&self, outcomes: &[PredictionOutcome]) -> f64 {
        historical_accuracy(outcomes)
    }

    pub async fn calculate_pattern_strength(
        &self,
        target: &WorkflowPattern,
        candidate: &WorkflowPattern,
        max_frequency: u32,
    ) -> f64 {
        pattern_strength(target, candidate, max_frequency)
    }

    /// Strength of every candidate against `target`, in input order
    pub async fn calculate_pattern_strengths(
        &self,
        target: &WorkflowPattern,
        candidates: &[WorkflowPattern],
    ) -> Vec<f64> {
        let target = Arc::new(target.clone());
        let max = max_frequency(candidates);
        fan_out(candidates.to_vec(), move |candidate| {
            pattern_strength(&target, &candidate, max)
        })
        .await
    }

    pub async fn calculate_context_similarity(
        &self,
        reference: &WorkflowContext,
        candidate: &WorkflowContext,
    ) -> f64 {
        context_similarity(reference, candidate)
    }

    /// Similarity of every candidate to `reference`, in input order
    pub async fn calculate_context_similarities(
        &self,
        reference: &WorkflowContext,
        candidates: &[WorkflowContext],
    ) -> Vec<f64> {
        let reference = Arc::new(reference.clone());
        fan_out(candidates.to_vec(), move |candidate| {
            context_similarity(&reference, &candidate)
        })
        .await
    }

    pub async fn calculate_user_profile_alignment(
        &self,
        profile: &UserExpertiseProfile,
        request: &WorkflowPredictionRequest,
    ) -> f64 {
        user_profile_alignment(profile, request)
    }

    pub async fn calculate_temporal_relevance(&self, factors: &[TemporalFactor]) -> f64 {
        temporal_relevance(factors, Utc::now())
    }

    /// Weighted components, adjusted by the fitted calibration and clamped
    pub async fn calculate_weighted_confidence(&self, components: &ConfidenceComponents) -> f64 {
        let parameters = self.state.lock().await.calibration.parameters();
        calibrated(parameters, weighted_confidence(components))
    }

    /// Calibrated confidence for every component set, in input order
    pub async fn calculate_confidence_scores(&self, components: &[ConfidenceComponents]) -> Vec<f64> {
        let parameters = self.state.lock().await.calibration.parameters();
        fan_out(components.to_vec(), move |c| {
            calibrated(parameters, weighted_confidence(&c))
        })
        .await
    }

    pub async fn calculate_confidence_variance(&self, scores: &[f64]) -> f64 {
        confidence_variance(scores)
    }

    pub fn map_confidence_to_categories(&self, scores: &[f64]) -> Vec<ConfidenceCategory> {
        map_confidence_to_categories(scores)
    }

    // ========================================================================
    // Evidence
    // ========================================================================

    pub async fn record_outcome(&self, outcome: PredictionOutcome) {
        self.state.lock().await.push_outcome(outcome);
    }

    /// Record user feedback as an outcome and a calibration point
    ///
    /// Recalibrates when the schedule or the observed loss calls for it.
    pub async fn record_feedback(&self, feedback: &PredictionFeedback, predicted_step: &str) {
        let outcome = PredictionOutcome::new(
            predicted_step,
            feedback.actual_next_step.as_str(),
            feedback.is_correct(),
        )
        .recorded_at(feedback.timestamp);

        let summary = {
            let mut state = self.state.lock().await;
            state.push_outcome(outcome);
            state.calibration.record(feedback.calibration_point());

            if state.calibration.check_recalibration_trigger() {
                Some(state.calibration.perform_weekly_recalibration(&[]))
            } else {
                None
            }
        };

        if let Some(summary) = summary {
            record_recalibration(summary.brier_loss_after);
        }
    }

    pub async fn outcomes(&self) -> Vec<PredictionOutcome> {
        self.state.lock().await.outcomes.iter().cloned().collect()
    }

    pub async fn outcome_count(&self) -> usize {
        self.state.lock().await.outcomes.len()
    }

    /// Historical accuracy over the whole ledger
    pub async fn current_accuracy(&self) -> f64 {
        self.state.lock().await.accuracy()
    }

    /// Plain hit rate of the newest `window` outcomes; `None` when empty
    pub async fn recent_hit_rate(&self, window: usize) -> Option<f64> {
        let state = self.state.lock().await;
        let recent: Vec<&PredictionOutcome> = state.outcomes.iter().rev().take(window).collect();
        if recent.is_empty() {
            return None;
        }
        let correct = recent.iter().filter(|o| o.correct).count();
        Some(correct as f64 / recent.len() as f64)
    }

    /// Drop outcomes recorded before `cutoff`; returns how many were removed
    pub async fn prune_outcomes_older_than(&self, cutoff: DateTime<Utc>) -> usize {
        let mut state = self.state.lock().await;
        let before = state.outcomes.len();
        state.outcomes.retain(|o| o.recorded_at >= cutoff);
        let removed = before - state.outcomes.len();
        if removed > 0 {
            debug!(removed, "Pruned expired prediction outcomes");
        }
        removed
    }

    /// Note that a state was just visited, for temporal relevance
    pub async fn observe_state(&self, key: StateKey) {
        self.state.lock().await.last_seen.insert(key, Utc::now());
    }

    // ========================================================================
    // Patterns
    // ========================================================================

    /// Learn from a finished workflow
    ///
    /// A known sequence in the same context gains frequency and a running
    /// success rate; an unknown one starts at frequency 1.
    pub async fn record_workflow(
        &self,
        sequence: Vec<String>,
        context: BTreeMap<String, String>,
        success: bool,
    ) {
        if sequence.is_empty() {
            return;
        }
        let outcome = if success { 1.0 } else { 0.0 };

        let mut state = self.state.lock().await;
        if let Some(pattern) = state
            .patterns
            .iter_mut()
            .find(|p| p.sequence == sequence && p.context == context)
        {
            let previous = f64::from(pattern.frequency);
            pattern.frequency = pattern.frequency.saturating_add(1);
            pattern.success_rate =
                (pattern.success_rate * previous + outcome) / f64::from(pattern.frequency);
            return;
        }

        if state.patterns.len() >= MAX_PATTERNS {
            if let Some(weakest) = state
                .patterns
                .iter()
                .enumerate()
                .min_by_key(|(_, p)| p.frequency)
                .map(|(i, _)| i)
            {
                state.patterns.swap_remove(weakest);
            }
        }

        let mut pattern = WorkflowPattern::new(sequence).with_success_rate(outcome);
        pattern.context = context;
        state.patterns.push(pattern);
    }

    pub async fn patterns(&self) -> Vec<WorkflowPattern> {
        self.state.lock().await.patterns.clone()
    }

    // ========================================================================
    // Calibration
    // ========================================================================

    pub async fn apply_platt_scaling(&self, data: &[CalibrationDataPoint]) -> bool {
        self.state.lock().await.calibration.apply_platt_scaling(data)
    }

    pub async fn calibration_parameters(&self) -> Option<PlattParameters> {
        self.state.lock().await.calibration.parameters()
    }

    pub async fn calculate_brier_loss(&self) -> f64 {
        self.state.lock().await.calibration.brier_loss()
    }

    pub async fn calculate_calibrated_brier_loss(&self) -> f64 {
        self.state.lock().await.calibration.calibrated_brier_loss()
    }

    /// Calibration plot over the current dataset; `None` while it is empty
    pub async fn calibration_plot(&self) -> Option<CalibrationPlot> {
        let dataset = self.state.lock().await.calibration.dataset();
        generate_calibration_plot(&calibration_plot_points(&dataset, DEFAULT_BIN_COUNT))
    }

    /// Reliability diagram over the current dataset; `None` while it is empty
    pub async fn reliability_diagram(&self) -> Option<ReliabilityDiagram> {
        let dataset = self.state.lock().await.calibration.dataset();
        validate_reliability_diagram(&reliability_points(&dataset, DEFAULT_BIN_COUNT))
    }

    pub async fn check_recalibration_trigger(&self) -> bool {
        self.state.lock().await.calibration.check_recalibration_trigger()
    }

    pub async fn perform_weekly_recalibration(
        &self,
        weeks: &[WeeklyCalibrationData],
    ) -> RecalibrationSummary {
        let summary = self
            .state
            .lock()
            .await
            .calibration
            .perform_weekly_recalibration(weeks);
        record_recalibration(summary.brier_loss_after);
        summary
    }

    /// Copy of the calibration engine, dataset included
    pub async fn calibration_engine(&self) -> CalibrationEngine {
        self.state.lock().await.calibration.clone()
    }

    /// Forget outcomes, patterns, observations and calibration data
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.outcomes.clear();
        state.patterns.clear();
        state.last_seen.clear();
        state.calibration.reset();
        info!("Confidence scorer reset");
    }
}

#[async_trait]
impl ConfidenceSignals for ConfidenceScorer {
    async fn historical_accuracy(&self) -> f64 {
        self.current_accuracy().await
    }

    /// Best match of `from -> to` among learned patterns
    async fn pattern_strength(&self, from: &StateKey, to: &StateKey) -> f64 {
        let state = self.state.lock().await;
        if state.patterns.is_empty() {
            return NEUTRAL_SCORE;
        }

        let target = WorkflowPattern::new([from.current_step.as_str(), to.current_step.as_str()])
            .with_context_entry(DOCUMENT_TYPE_CONTEXT_KEY, to.document_type.as_str());
        let max = max_frequency(&state.patterns);

        state
            .patterns
            .iter()
            .map(|candidate| pattern_strength(&target, candidate, max))
            .fold(0.0, f64::max)
    }

    /// Decayed recency of the last visit to `to`
    async fn temporal_relevance(&self, to: &StateKey) -> f64 {
        let state = self.state.lock().await;
        match state.last_seen.get(to) {
            Some(seen) => decay_weight(*seen, Utc::now()),
            None => NEUTRAL_SCORE,
        }
    }
}

fn calibrated(parameters: Option<PlattParameters>, raw: f64) -> f64 {
    let raw = clamp_confidence_score(raw);
    match parameters {
        Some(params) => clamp_confidence_score(params.apply(raw)),
        None => raw,
    }
}

/// One task per item; results land in their input slot
///
/// A task that fails leaves the neutral score in its slot. Dropping the
/// returned future aborts the remaining tasks.
async fn fan_out<T, F>(items: Vec<T>, score: F) -> Vec<f64>
where
    T: Send + 'static,
    F: Fn(T) -> f64 + Send + Sync + 'static,
{
    let score = Arc::new(score);
    let mut slots = vec![NEUTRAL_SCORE; items.len()];
    let mut tasks = JoinSet::new();

    for (index, item) in items.into_iter().enumerate() {
        let score = score.clone();
        tasks.spawn(async move { (index, score(item)) });
    }

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, value)) => slots[index] = value,
            Err(e) => warn!(error = %e, "Scoring task failed, using neutral score"),
        }
    }

    slots
}
