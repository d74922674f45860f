//! Probabilistic finite-state predictor
//!
//! Owns the transition model and history buffer behind a single async mutex,
//! so every mutation is serialized. Matrix updates happen synchronously while
//! the lock is held and therefore cannot be interrupted halfway by a dropped
//! future.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::PredictorConfig;
use crate::domain::confidence::{clamp_confidence_score, ConfidenceSignals, NeutralSignals};
use crate::domain::feedback::PredictionFeedback;
use crate::domain::gating::{PredictionGate, PredictionPrivacySettings, WorkflowPredictionFeatureFlags};
use crate::domain::history::{StateHistoryBuffer, DEFAULT_HISTORY_CAPACITY};
use crate::domain::snapshot::{PredictorSnapshot, SnapshotKey, SnapshotRepository};
use crate::domain::state::rules::{
    fallback_steps, FALLBACK_CONFIDENCE, FALLBACK_PROBABILITY, FALLBACK_REASONING,
};
use crate::domain::state::{
    rank_predictions, validate_transition, Phase, StateKey, StatePrediction, WorkflowState,
};
use crate::domain::transition::{TransitionModel, DEFAULT_LEARNING_RATE};
use crate::domain::DomainError;
use crate::infrastructure::logging::PRIVACY_TARGET;
use crate::infrastructure::observability::{record_prediction, PredictionSource};

/// Issued predictions remembered for feedback
const ISSUED_PREDICTION_CAPACITY: usize = 1000;

const HISTORICAL_WEIGHT: f64 = 0.4;
const PATTERN_WEIGHT: f64 = 0.3;
const TEMPORAL_WEIGHT: f64 = 0.2;
const PROBABILITY_WEIGHT: f64 = 0.1;

// ============================================================================
// Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct StatePredictorConfig {
    pub history_capacity: usize,
    pub learning_rate: f64,
    pub latency_budget: Duration,
    pub max_predictions: usize,
}

impl Default for StatePredictorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            learning_rate: DEFAULT_LEARNING_RATE,
            latency_budget: Duration::from_millis(100),
            max_predictions: 5,
        }
    }
}

impl From<&PredictorConfig> for StatePredictorConfig {
    fn from(config: &PredictorConfig) -> Self {
        Self {
            history_capacity: config.history_capacity,
            learning_rate: config.learning_rate,
            latency_budget: Duration::from_millis(config.latency_budget_ms),
            max_predictions: config.max_predictions,
        }
    }
}

/// Average latency and call count since the last reset
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceMetrics {
    pub average_latency: Duration,
    pub total_predictions: u64,
}

// ============================================================================
// Owned state
// ============================================================================

#[derive(Debug, Clone)]
struct IssuedPrediction {
    from: StateKey,
    to: StateKey,
}

/// Bounded record of predictions handed out, oldest forgotten first
#[derive(Debug, Default)]
struct IssuedPredictions {
    order: VecDeque<Uuid>,
    entries: HashMap<Uuid, IssuedPrediction>,
}

impl IssuedPredictions {
    fn remember(&mut self, id: Uuid, issued: IssuedPrediction) {
        if self.order.len() == ISSUED_PREDICTION_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(id);
        self.entries.insert(id, issued);
    }

    fn take(&mut self, id: &Uuid) -> Option<IssuedPrediction> {
        let issued = self.entries.remove(id)?;
        self.order.retain(|other| other != id);
        Some(issued)
    }

    fn clear(&mut self) {
        self.order.clear();
        self.entries.clear();
    }
}

#[derive(Debug)]
struct PredictorState {
    model: TransitionModel,
    history: StateHistoryBuffer<WorkflowState>,
    current: Option<WorkflowState>,
    gate: PredictionGate,
    issued: IssuedPredictions,
    total_predictions: u64,
    total_latency: Duration,
}

impl PredictorState {
    fn new(config: &StatePredictorConfig) -> Self {
        Self {
            model: TransitionModel::with_learning_rate(config.learning_rate),
            history: StateHistoryBuffer::new(config.history_capacity),
            current: None,
            gate: PredictionGate::default(),
            issued: IssuedPredictions::default(),
            total_predictions: 0,
            total_latency: Duration::ZERO,
        }
    }

    fn observe(&mut self, state: WorkflowState) {
        self.history.append(state);
        self.model.update_from_history(&self.history);
    }
}

// ============================================================================
// State Predictor
// ============================================================================

/// Predicts a user's next workflow step from learned transitions
pub struct StatePredictor {
    config: StatePredictorConfig,
    state: Mutex<PredictorState>,
    signals: Arc<dyn ConfidenceSignals>,
    persistence: Option<(Arc<dyn SnapshotRepository>, SnapshotKey)>,
}

impl std::fmt::Debug for StatePredictor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatePredictor")
            .field("config", &self.config)
            .field("persistent", &self.persistence.is_some())
            .finish()
    }
}

impl Default for StatePredictor {
    fn default() -> Self {
        Self::new(StatePredictorConfig::default())
    }
}

impl StatePredictor {
    pub fn new(config: StatePredictorConfig) -> Self {
        Self {
            state: Mutex::new(PredictorState::new(&config)),
            config,
            signals: Arc::new(NeutralSignals),
            persistence: None,
        }
    }

    /// Score candidates with real evidence instead of neutral placeholders
    pub fn with_signals(mut self, signals: Arc<dyn ConfidenceSignals>) -> Self {
        self.signals = signals;
        self
    }

    pub fn with_repository(mut self, repository: Arc<dyn SnapshotRepository>, key: SnapshotKey) -> Self {
        self.persistence = Some((repository, key));
        self
    }

    pub fn config(&self) -> &StatePredictorConfig {
        &self.config
    }

    // ========================================================================
    // Host-driven input
    // ========================================================================

    /// Record a step the user just reached and make it current
    pub async fn update_current_state(&self, state: WorkflowState) {
        let mut inner = self.state.lock().await;
        inner.current = Some(state.clone());
        inner.observe(state);
    }

    /// Record a step without changing the current state
    pub async fn add_to_history(&self, state: WorkflowState) {
        let mut inner = self.state.lock().await;
        inner.observe(state);
    }

    pub async fn update_transition_probability(
        &self,
        from: &WorkflowState,
        to: &WorkflowState,
        probability: f64,
    ) {
        let mut inner = self.state.lock().await;
        inner.model.update_probability(&from.key(), &to.key(), probability);
    }

    pub async fn reinforce_transition(&self, from: &WorkflowState, to: &WorkflowState) {
        let mut inner = self.state.lock().await;
        inner.model.reinforce(&from.key(), &to.key());
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn validate_transition(&self, from: &WorkflowState, to: &WorkflowState) -> bool {
        validate_transition(from, to)
    }

    pub async fn get_transition_probability(&self, from: &WorkflowState, to: &WorkflowState) -> f64 {
        let inner = self.state.lock().await;
        inner.model.get_probability(&from.key(), &to.key())
    }

    pub async fn get_current_state(&self) -> Option<WorkflowState> {
        self.state.lock().await.current.clone()
    }

    pub async fn get_history(&self) -> Vec<WorkflowState> {
        self.state.lock().await.history.get_all_elements()
    }

    pub async fn get_history_count(&self) -> usize {
        self.state.lock().await.history.count()
    }

    pub async fn is_row_stochastic(&self) -> bool {
        self.state.lock().await.model.is_row_stochastic()
    }

    pub async fn get_performance_metrics(&self) -> PerformanceMetrics {
        let inner = self.state.lock().await;
        let average_latency = if inner.total_predictions == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(
                inner.total_latency.as_secs_f64() / inner.total_predictions as f64,
            )
        };

        PerformanceMetrics {
            average_latency,
            total_predictions: inner.total_predictions,
        }
    }

    // ========================================================================
    // Gating
    // ========================================================================

    pub async fn gate(&self) -> PredictionGate {
        self.state.lock().await.gate.clone()
    }

    pub async fn set_privacy_settings(&self, privacy: PredictionPrivacySettings) {
        self.state.lock().await.gate.privacy = privacy;
    }

    pub async fn set_feature_flags(&self, flags: WorkflowPredictionFeatureFlags) {
        self.state.lock().await.gate.flags = flags;
    }

    // ========================================================================
    // Prediction
    // ========================================================================

    /// Ranked next-state predictions, best `confidence * probability` first
    ///
    /// Never fails: a state without learned transitions gets the static
    /// per-phase defaults, and a closed gate yields no predictions.
    pub async fn predict_next_states(
        &self,
        state: &WorkflowState,
        max_predictions: usize,
    ) -> Vec<StatePrediction> {
        let started = Instant::now();
        let key = state.key();

        let (gate, transitions) = {
            let inner = self.state.lock().await;
            (inner.gate.clone(), inner.model.transitions_from(&key))
        };

        if !gate.is_open() {
            info!(
                target: PRIVACY_TARGET,
                context = "predict_next_states",
                "Predictions disabled, returning empty results"
            );
            self.finish(started, PredictionSource::Gated, &key, &[], HashMap::new())
            .await;
            return Vec::new();
        }

        let limit = gate.effective_max(max_predictions);
        let (mut predictions, targets, source) = if transitions.is_empty() {
            let predictions = fallback_predictions(state);
            let targets = predictions
                .iter()
                .map(|p| (p.id, p.next_state.key()))
                .collect();
            (predictions, targets, PredictionSource::Fallback)
        } else {
            let (predictions, targets) = self.learned_predictions(state, &key, transitions).await;
            (predictions, targets, PredictionSource::Learned)
        };

        rank_predictions(&mut predictions);
        predictions.truncate(limit);

        self.finish(started, source, &key, &predictions, targets).await;
        predictions
    }

    /// Scored candidates plus the learned key behind each prediction id
    ///
    /// The decoded next state takes its document type from `state`, so its
    /// key can differ from the matrix column it came from.
    async fn learned_predictions(
        &self,
        state: &WorkflowState,
        from: &StateKey,
        transitions: Vec<(StateKey, f64)>,
    ) -> (Vec<StatePrediction>, HashMap<Uuid, StateKey>) {
        let historical = clamp_confidence_score(self.signals.historical_accuracy().await);
        let mut predictions = Vec::with_capacity(transitions.len());
        let mut targets = HashMap::with_capacity(transitions.len());

        for (to, probability) in transitions {
            let pattern = clamp_confidence_score(self.signals.pattern_strength(from, &to).await);
            let temporal = clamp_confidence_score(self.signals.temporal_relevance(&to).await);
            let confidence = HISTORICAL_WEIGHT * historical
                + PATTERN_WEIGHT * pattern
                + TEMPORAL_WEIGHT * temporal
                + PROBABILITY_WEIGHT * probability;

            let reasoning = format!(
                "Based on {:.0}% historical transition probability",
                probability * 100.0
            );
            let mut prediction =
                StatePrediction::new(to.to_state_in_context(state), probability, confidence, reasoning);
            if let Some(phase) = Phase::parse(&to.phase) {
                prediction = prediction.with_estimated_duration(phase.typical_duration());
            }
            targets.insert(prediction.id, to);
            predictions.push(prediction);
        }

        (predictions, targets)
    }

    async fn finish(
        &self,
        started: Instant,
        source: PredictionSource,
        from: &StateKey,
        predictions: &[StatePrediction],
        mut targets: HashMap<Uuid, StateKey>,
    ) {
        let latency = started.elapsed();
        {
            let mut inner = self.state.lock().await;
            for prediction in predictions {
                let Some(to) = targets.remove(&prediction.id) else {
                    continue;
                };
                inner.issued.remember(
                    prediction.id,
                    IssuedPrediction {
                        from: from.clone(),
                        to,
                    },
                );
            }
            inner.total_predictions += 1;
            inner.total_latency += latency;
        }

        record_prediction(source, latency, self.config.latency_budget);
        if latency > self.config.latency_budget {
            warn!(
                latency_ms = latency.as_millis() as u64,
                budget_ms = self.config.latency_budget.as_millis() as u64,
                "Prediction exceeded latency budget"
            );
        }
        debug!(
            source = source.as_str(),
            count = predictions.len(),
            "Predicted next states"
        );
    }

    // ========================================================================
    // Feedback
    // ========================================================================

    /// Look up the prediction the feedback refers to
    ///
    /// Returns the predicted target state when the id is known; an accepted
    /// prediction also reinforces its transition. Each prediction is resolved
    /// at most once.
    pub async fn apply_feedback(&self, feedback: &PredictionFeedback) -> Option<StateKey> {
        let mut inner = self.state.lock().await;
        let Some(issued) = inner.issued.take(&feedback.prediction_id) else {
            debug!(prediction_id = %feedback.prediction_id, "Feedback for unknown prediction");
            return None;
        };

        if feedback.is_correct() {
            inner.model.reinforce(&issued.from, &issued.to);
        }
        Some(issued.to)
    }

    // ========================================================================
    // Reset and persistence
    // ========================================================================

    /// Forget everything learned; gating is kept
    pub async fn reset(&self) {
        let mut inner = self.state.lock().await;
        let gate = inner.gate.clone();
        *inner = PredictorState::new(&self.config);
        inner.gate = gate;
        info!("Predictor state reset");
    }

    pub async fn snapshot(&self, key: SnapshotKey) -> PredictorSnapshot {
        let inner = self.state.lock().await;
        PredictorSnapshot {
            key,
            transitions: inner.model.entries(),
            learning_rate: inner.model.learning_rate(),
            current_state: inner.current.clone(),
            history: inner.history.get_all_elements(),
            history_capacity: inner.history.capacity(),
            saved_at: Utc::now(),
        }
    }

    /// Replace learned state with a snapshot
    ///
    /// A snapshot with corrupt transitions is rejected and the current state
    /// is kept.
    pub async fn restore(&self, snapshot: PredictorSnapshot) -> Result<(), DomainError> {
        let model = TransitionModel::from_entries(snapshot.transitions, snapshot.learning_rate)?;
        let mut history = StateHistoryBuffer::new(self.config.history_capacity);
        for state in snapshot.history {
            history.append(state);
        }

        let mut inner = self.state.lock().await;
        inner.model = model;
        inner.history = history;
        inner.current = snapshot.current_state;
        inner.issued.clear();
        Ok(())
    }

    /// Write the learned state to the configured repository
    ///
    /// On failure the in-memory state is untouched and remains authoritative.
    pub async fn persist_state(&self) -> Result<(), DomainError> {
        let (repository, key) = self.persistence()?;
        let snapshot = self.snapshot(key.clone()).await;
        let transitions = snapshot.transition_count();

        repository.save(snapshot).await?;
        info!(key = %key, transitions, "Persisted predictor state");
        Ok(())
    }

    /// Load learned state from the configured repository
    ///
    /// Returns false when nothing was stored; the current state is kept then.
    pub async fn load_persisted_state(&self) -> Result<bool, DomainError> {
        let (repository, key) = self.persistence()?;
        let Some(snapshot) = repository.load(key).await? else {
            debug!(key = %key, "No persisted predictor state");
            return Ok(false);
        };

        let transitions = snapshot.transition_count();
        if let Err(e) = self.restore(snapshot).await {
            warn!(key = %key, error = %e, "Rejected persisted predictor state");
            return Err(e);
        }
        info!(key = %key, transitions, "Loaded persisted predictor state");
        Ok(true)
    }

    fn persistence(&self) -> Result<(&Arc<dyn SnapshotRepository>, &SnapshotKey), DomainError> {
        self.persistence
            .as_ref()
            .map(|(repository, key)| (repository, key))
            .ok_or_else(|| DomainError::configuration("No snapshot repository configured"))
    }
}

fn fallback_predictions(state: &WorkflowState) -> Vec<StatePrediction> {
    fallback_steps(state.phase())
        .iter()
        .map(|(phase, step)| {
            StatePrediction::new(
                WorkflowState::new(phase.as_str(), *step, state.document_type()),
                FALLBACK_PROBABILITY,
                FALLBACK_CONFIDENCE,
                FALLBACK_REASONING,
            )
        })
        .collect()
}
