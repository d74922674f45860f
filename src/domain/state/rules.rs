//! Phase adjacency rules and cold-start defaults for the workflow machine

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::entity::WorkflowState;

/// Acquisition workflow phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Planning,
    Execution,
    Review,
    Closeout,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Planning,
        Phase::Execution,
        Phase::Review,
        Phase::Closeout,
    ];

    /// Parse a phase name, case-insensitively
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "planning" => Some(Self::Planning),
            "execution" => Some(Self::Execution),
            "review" => Some(Self::Review),
            "closeout" => Some(Self::Closeout),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Execution => "execution",
            Self::Review => "review",
            Self::Closeout => "closeout",
        }
    }

    /// Phases reachable in one transition
    ///
    /// `closeout -> planning` closes the cycle; there is no terminal phase.
    pub fn successors(&self) -> &'static [Phase] {
        match self {
            Self::Planning => &[Phase::Execution, Phase::Review],
            Self::Execution => &[Phase::Review, Phase::Closeout],
            Self::Review => &[Phase::Execution, Phase::Closeout, Phase::Planning],
            Self::Closeout => &[Phase::Planning],
        }
    }

    pub fn can_transition_to(&self, next: Phase) -> bool {
        self.successors().contains(&next)
    }

    /// Typical time spent before the next step in this phase
    pub fn typical_duration(&self) -> Duration {
        const DAY: u64 = 24 * 60 * 60;
        match self {
            Self::Planning => Duration::from_secs(5 * DAY),
            Self::Execution => Duration::from_secs(10 * DAY),
            Self::Review => Duration::from_secs(3 * DAY),
            Self::Closeout => Duration::from_secs(2 * DAY),
        }
    }

    /// Infer a phase from a free-form step name
    pub fn infer_from_step(step: &str) -> Self {
        let step = step.to_ascii_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|n| step.contains(n));

        if has(&["planning", "research", "requirements"]) {
            Self::Planning
        } else if has(&["execution", "development", "implementation"]) {
            Self::Execution
        } else if has(&["review", "evaluation", "assessment"]) {
            Self::Review
        } else if has(&["closeout", "completion", "final"]) {
            Self::Closeout
        } else {
            Self::Planning
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check a transition against the phase adjacency rules
///
/// Unknown phases never validate.
pub fn validate_transition(from: &WorkflowState, to: &WorkflowState) -> bool {
    match (Phase::parse(from.phase()), Phase::parse(to.phase())) {
        (Some(from), Some(to)) => from.can_transition_to(to),
        _ => false,
    }
}

/// Probability assigned to every cold-start prediction
pub const FALLBACK_PROBABILITY: f64 = 0.5;

/// Confidence assigned to every cold-start prediction
pub const FALLBACK_CONFIDENCE: f64 = 0.4;

/// Reasoning attached to every cold-start prediction
pub const FALLBACK_REASONING: &str = "Based on typical workflow patterns";

/// Default `(next phase, next step)` pairs for a state with no learned transitions
pub fn fallback_steps(phase: &str) -> &'static [(Phase, &'static str)] {
    match Phase::parse(phase) {
        Some(Phase::Planning) => &[
            (Phase::Execution, "solicitation_preparation"),
            (Phase::Review, "requirements_review"),
        ],
        Some(Phase::Execution) => &[
            (Phase::Review, "proposal_evaluation"),
            (Phase::Closeout, "contract_award"),
        ],
        Some(Phase::Review) => &[
            (Phase::Closeout, "final_approval"),
            (Phase::Execution, "revision"),
            (Phase::Planning, "requirements_refinement"),
        ],
        Some(Phase::Closeout) => &[(Phase::Planning, "new_acquisition_planning")],
        None => &[(Phase::Planning, "market_research")],
    }
}
