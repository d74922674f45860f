//! Source of confidence signals for individual predictions

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use super::NEUTRAL_SCORE;
use crate::domain::state::StateKey;

/// Supplies the evidence used to score a single candidate transition
///
/// Implementations must be total: return values in `[0, 1]` and fall back to
/// `0.5` rather than failing.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ConfidenceSignals: Send + Sync {
    /// Accuracy of previously issued predictions
    async fn historical_accuracy(&self) -> f64;

    /// How strongly learned patterns support `from -> to`
    async fn pattern_strength(&self, from: &StateKey, to: &StateKey) -> f64;

    /// How recently the target state has been observed
    async fn temporal_relevance(&self, to: &StateKey) -> f64;
}

/// Signals with no evidence behind them
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralSignals;

#[async_trait]
impl ConfidenceSignals for NeutralSignals {
    async fn historical_accuracy(&self) -> f64 {
        NEUTRAL_SCORE
    }

    async fn pattern_strength(&self, _from: &StateKey, _to: &StateKey) -> f64 {
        NEUTRAL_SCORE
    }

    async fn temporal_relevance(&self, _to: &StateKey) -> f64 {
        NEUTRAL_SCORE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_neutral_signals() {
        let signals = NeutralSignals;
        let key = StateKey::new("planning", "a", "RFP");

        assert_eq!(signals.historical_accuracy().await, 0.5);
        assert_eq!(signals.pattern_strength(&key, &key).await, 0.5);
        assert_eq!(signals.temporal_relevance(&key).await, 0.5);
    }
}
