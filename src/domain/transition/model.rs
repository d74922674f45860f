//! Sparse row-stochastic transition matrix

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::history::StateHistoryBuffer;
use crate::domain::state::{StateKey, WorkflowState};
use crate::domain::DomainError;

/// Probability increment applied per observed transition
pub const DEFAULT_LEARNING_RATE: f64 = 0.1;

/// Tolerance for the row-sum invariant
pub const ROW_SUM_EPSILON: f64 = 1e-9;

/// Row-sum drift accepted when rebuilding from stored entries
pub const STORED_ROW_SUM_TOLERANCE: f64 = 1e-6;

type Row = HashMap<StateKey, f64>;

/// One stored `(from, to) -> probability` cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionEntry {
    pub from: StateKey,
    pub to: StateKey,
    pub probability: f64,
}

/// Learned transition probabilities between workflow states
///
/// Every row with at least one entry sums to 1 within [`ROW_SUM_EPSILON`].
/// Reinforcement is a fixed-increment scheme, not frequency counting: values
/// converge in the direction of observed transitions without matching
/// empirical frequencies.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionModel {
    rows: HashMap<StateKey, Row>,
    learning_rate: f64,
}

impl Default for TransitionModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TransitionModel {
    pub fn new() -> Self {
        Self::with_learning_rate(DEFAULT_LEARNING_RATE)
    }

    pub fn with_learning_rate(learning_rate: f64) -> Self {
        let learning_rate = if learning_rate.is_finite() && learning_rate > 0.0 {
            learning_rate.min(1.0)
        } else {
            DEFAULT_LEARNING_RATE
        };

        Self {
            rows: HashMap::new(),
            learning_rate,
        }
    }

    /// Rebuild a model from stored entries
    ///
    /// Every probability must be finite and within `[0, 1]`, and every row
    /// must sum to 1 within [`STORED_ROW_SUM_TOLERANCE`]. Rows outside
    /// [`ROW_SUM_EPSILON`] are renormalized so the strict invariant holds.
    pub fn from_entries(entries: Vec<TransitionEntry>, learning_rate: f64) -> Result<Self, DomainError> {
        let mut model = Self::with_learning_rate(learning_rate);
        for entry in entries {
            if !entry.probability.is_finite() || !(0.0..=1.0).contains(&entry.probability) {
                return Err(DomainError::validation(format!(
                    "Transition {} -> {} has invalid probability {}",
                    entry.from, entry.to, entry.probability
                )));
            }
            model
                .rows
                .entry(entry.from)
                .or_default()
                .insert(entry.to, entry.probability);
        }

        for (from, row) in model.rows.iter_mut() {
            let sum: f64 = row.values().sum();
            let drift = (sum - 1.0).abs();
            if drift > STORED_ROW_SUM_TOLERANCE {
                return Err(DomainError::validation(format!(
                    "Transitions from {from} sum to {sum}, expected 1"
                )));
            }
            if drift > ROW_SUM_EPSILON {
                normalize(row);
            }
        }
        Ok(model)
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Store a clamped probability, then renormalize the source row
    pub fn update_probability(&mut self, from: &StateKey, to: &StateKey, value: f64) {
        let value = sanitize(value);
        let row = self.rows.entry(from.clone()).or_default();
        row.insert(to.clone(), value);

        if !normalize(row) {
            self.rows.remove(from);
        }
    }

    /// Stored probability, or `0.0` when the transition was never seen
    pub fn get_probability(&self, from: &StateKey, to: &StateKey) -> f64 {
        self.rows
            .get(from)
            .and_then(|row| row.get(to))
            .copied()
            .unwrap_or(0.0)
    }

    /// Outgoing transitions of `from`, most probable first
    pub fn transitions_from(&self, from: &StateKey) -> Vec<(StateKey, f64)> {
        let mut transitions: Vec<(StateKey, f64)> = self
            .rows
            .get(from)
            .map(|row| row.iter().map(|(k, p)| (k.clone(), *p)).collect())
            .unwrap_or_default();

        transitions.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.0.cmp(&b.0))
        });
        transitions
    }

    /// Reinforce a single observed transition
    pub fn reinforce(&mut self, from: &StateKey, to: &StateKey) {
        let row = self.rows.entry(from.clone()).or_default();
        reinforce_row(row, to, self.learning_rate);
    }

    /// Reinforce every consecutive pair in the history
    ///
    /// The pass is staged on copies of the touched rows and committed at the
    /// end, so the matrix is never observed half-updated.
    pub fn update_from_history(&mut self, buffer: &StateHistoryBuffer<WorkflowState>) {
        let states = buffer.get_all_elements();
        if states.len() < 2 {
            return;
        }

        let mut staged: HashMap<StateKey, Row> = HashMap::new();
        for pair in states.windows(2) {
            let from = pair[0].key();
            let to = pair[1].key();
            let row = staged
                .entry(from.clone())
                .or_insert_with(|| self.rows.get(&from).cloned().unwrap_or_default());
            reinforce_row(row, &to, self.learning_rate);
        }

        debug!(
            pairs = states.len() - 1,
            rows = staged.len(),
            "Applied transition updates from history"
        );
        self.rows.extend(staged);
    }

    /// Sum of the outgoing probabilities of `from`
    pub fn row_sum(&self, from: &StateKey) -> f64 {
        self.rows
            .get(from)
            .map(|row| row.values().sum())
            .unwrap_or(0.0)
    }

    /// Whether every non-empty row sums to 1
    pub fn is_row_stochastic(&self) -> bool {
        self.rows
            .values()
            .all(|row| (row.values().sum::<f64>() - 1.0).abs() <= ROW_SUM_EPSILON)
    }

    /// All stored cells in a deterministic order
    pub fn entries(&self) -> Vec<TransitionEntry> {
        let mut entries: Vec<TransitionEntry> = self
            .rows
            .iter()
            .flat_map(|(from, row)| {
                row.iter().map(move |(to, p)| TransitionEntry {
                    from: from.clone(),
                    to: to.clone(),
                    probability: *p,
                })
            })
            .collect();

        entries.sort_by(|a, b| a.from.cmp(&b.from).then_with(|| a.to.cmp(&b.to)));
        entries
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

fn sanitize(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn reinforce_row(row: &mut Row, to: &StateKey, learning_rate: f64) {
    let current = row.get(to).copied().unwrap_or(0.0);
    row.insert(to.clone(), (current + learning_rate).min(1.0));
    normalize(row);
}

/// Scale a row to sum to 1; returns false when the row carries no mass
fn normalize(row: &mut Row) -> bool {
    let sum: f64 = row.values().sum();
    if sum <= 0.0 || !sum.is_finite() {
        row.clear();
        return false;
    }

    for p in row.values_mut() {
        *p /= sum;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(step: &str) -> StateKey {
        StateKey::new("planning", step, "RFP")
    }

    fn state(step: &str) -> WorkflowState {
        WorkflowState::new("planning", step, "RFP")
    }

    #[test]
    fn test_missing_probability_is_zero() {
        let model = TransitionModel::new();
        assert_eq!(model.get_probability(&key("a"), &key("b")), 0.0);
        assert!(model.transitions_from(&key("a")).is_empty());
    }

    #[test]
    fn test_single_entry_row_normalizes_to_one() {
        let mut model = TransitionModel::new();
        model.update_probability(&key("a"), &key("b"), 0.75);
        assert!((model.get_probability(&key("a"), &key("b")) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_update_renormalizes_row() {
        let mut model = TransitionModel::new();
        model.update_probability(&key("a"), &key("b"), 1.0);
        model.update_probability(&key("a"), &key("c"), 1.0);

        assert!((model.get_probability(&key("a"), &key("b")) - 0.5).abs() < 1e-12);
        assert!((model.get_probability(&key("a"), &key("c")) - 0.5).abs() < 1e-12);
        assert!(model.is_row_stochastic());
    }

    #[test]
    fn test_update_clamps_adversarial_values() {
        let mut model = TransitionModel::new();
        for value in [-3.0, 7.5, f64::NAN, f64::INFINITY, f64::NEG_INFINITY, 0.3] {
            model.update_probability(&key("a"), &key(&format!("{value}")), value);
            if model.row_count() > 0 {
                assert!((model.row_sum(&key("a")) - 1.0).abs() <= ROW_SUM_EPSILON);
            }
        }
        assert!(model.is_row_stochastic());
    }

    #[test]
    fn test_zero_update_on_empty_row_leaves_no_row() {
        let mut model = TransitionModel::new();
        model.update_probability(&key("a"), &key("b"), 0.0);
        assert!(model.is_empty());
        assert_eq!(model.get_probability(&key("a"), &key("b")), 0.0);
    }

    #[test]
    fn test_alternating_history_converges() {
        let mut model = TransitionModel::new();
        model.update_probability(&key("A"), &key("C"), 1.0);

        let mut buffer = StateHistoryBuffer::new(1000);
        let mut previous = model.get_probability(&key("A"), &key("B"));
        for round in 0..20 {
            buffer.clear();
            for step in ["A", "B", "A", "B", "A", "B"] {
                buffer.append(state(step));
            }
            model.update_from_history(&buffer);

            let current = model.get_probability(&key("A"), &key("B"));
            assert!(current >= previous, "round {round}: {current} < {previous}");
            previous = current;
        }

        assert!(model.get_probability(&key("A"), &key("B")) > 0.95);
        assert!(model.get_probability(&key("A"), &key("C")) < 0.05);
        assert!(model.is_row_stochastic());
    }

    #[test]
    fn test_update_from_short_history_is_noop() {
        let mut model = TransitionModel::new();
        let mut buffer = StateHistoryBuffer::new(10);
        buffer.append(state("A"));

        model.update_from_history(&buffer);
        assert!(model.is_empty());
    }

    #[test]
    fn test_metadata_does_not_split_rows() {
        let mut model = TransitionModel::new();
        let mut buffer = StateHistoryBuffer::new(10);
        buffer.append(state("A").with_metadata_entry("agency", "DOD"));
        buffer.append(state("B").with_metadata_entry("agency", "Navy"));

        model.update_from_history(&buffer);
        assert_eq!(model.row_count(), 1);
        assert!((model.get_probability(&key("A"), &key("B")) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_transitions_sorted_by_probability() {
        let mut model = TransitionModel::new();
        model.update_probability(&key("a"), &key("b"), 0.2);
        // The row is {b: 1.0} now, so c lands at 0.9 / 1.9
        model.update_probability(&key("a"), &key("c"), 0.9);

        let transitions = model.transitions_from(&key("a"));
        assert_eq!(transitions[0].0, key("b"));
        assert_eq!(transitions[1].0, key("c"));
        assert!(transitions[0].1 > transitions[1].1);
        assert!((transitions[1].1 - 0.9 / 1.9).abs() < 1e-12);
    }

    #[test]
    fn test_transitions_from_entries_sorted_by_probability() {
        let entry = |to: &str, probability| TransitionEntry {
            from: key("a"),
            to: key(to),
            probability,
        };
        let model = TransitionModel::from_entries(
            vec![entry("b", 0.2), entry("c", 0.7), entry("d", 0.1)],
            DEFAULT_LEARNING_RATE,
        )
        .unwrap();

        let order: Vec<StateKey> = model
            .transitions_from(&key("a"))
            .into_iter()
            .map(|(to, _)| to)
            .collect();
        assert_eq!(order, vec![key("c"), key("b"), key("d")]);
    }

    #[test]
    fn test_entries_round_trip() {
        let mut model = TransitionModel::new();
        model.update_probability(&key("a"), &key("b"), 0.3);
        model.update_probability(&key("a"), &key("c"), 0.6);
        model.reinforce(&key("b"), &key("c"));

        let restored = TransitionModel::from_entries(model.entries(), model.learning_rate()).unwrap();
        assert_eq!(restored, model);
        assert!(restored.is_row_stochastic());
    }

    #[test]
    fn test_from_entries_rejects_corrupt_probabilities() {
        for probability in [5.0, -0.1, f64::NAN, f64::INFINITY] {
            let entries = vec![TransitionEntry {
                from: key("a"),
                to: key("b"),
                probability,
            }];
            let result = TransitionModel::from_entries(entries, DEFAULT_LEARNING_RATE);
            assert!(matches!(result, Err(DomainError::Validation { .. })));
        }
    }

    #[test]
    fn test_from_entries_rejects_non_stochastic_row() {
        let entries = vec![
            TransitionEntry {
                from: key("a"),
                to: key("b"),
                probability: 0.5,
            },
            TransitionEntry {
                from: key("a"),
                to: key("c"),
                probability: 0.2,
            },
        ];
        let result = TransitionModel::from_entries(entries, DEFAULT_LEARNING_RATE);
        assert!(matches!(result, Err(DomainError::Validation { .. })));
    }

    #[test]
    fn test_invalid_learning_rate_falls_back_to_default() {
        assert_eq!(
            TransitionModel::with_learning_rate(-1.0).learning_rate(),
            DEFAULT_LEARNING_RATE
        );
        assert_eq!(
            TransitionModel::with_learning_rate(f64::NAN).learning_rate(),
            DEFAULT_LEARNING_RATE
        );
        assert_eq!(TransitionModel::with_learning_rate(5.0).learning_rate(), 1.0);
    }
}
