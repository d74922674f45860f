//! Confidence sub-score calculations
//!
//! Every function here is pure and total: missing or degenerate input
//! produces a documented neutral value rather than an error.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::hash::Hash;

use chrono::{DateTime, Utc};

use super::entity::{
    ConfidenceComponents, PredictionOutcome, TemporalFactor, UserExpertiseProfile,
    WorkflowContext, WorkflowPattern, WorkflowPredictionRequest,
};
use super::NEUTRAL_SCORE;

/// Flat recency multiplier applied to the Beta posterior mean
///
/// Outcome timestamps are not weighted individually.
pub const HISTORICAL_DECAY: f64 = 0.95;

/// Half-life of temporal factors, in days
pub const TEMPORAL_HALF_LIFE_DAYS: f64 = 30.0;

/// Placeholder for workflow-style fit in profile alignment
pub const STYLE_FACTOR: f64 = 0.5;

/// Weights of the five components in the combined confidence
pub mod weights {
    pub const HISTORICAL_ACCURACY: f64 = 0.3;
    pub const PATTERN_STRENGTH: f64 = 0.25;
    pub const CONTEXT_SIMILARITY: f64 = 0.2;
    pub const USER_PROFILE_ALIGNMENT: f64 = 0.15;
    pub const TEMPORAL_RELEVANCE: f64 = 0.1;
}

/// Beta-Binomial posterior mean with a uniform prior, times [`HISTORICAL_DECAY`]
///
/// Returns `0.5` when there are no outcomes.
pub fn historical_accuracy(outcomes: &[PredictionOutcome]) -> f64 {
    if outcomes.is_empty() {
        return NEUTRAL_SCORE;
    }

    let correct = outcomes.iter().filter(|o| o.correct).count() as f64;
    let incorrect = outcomes.len() as f64 - correct;
    historical_accuracy_from_counts(correct as u64, incorrect as u64)
}

/// Same as [`historical_accuracy`] over running counts
pub fn historical_accuracy_from_counts(correct: u64, incorrect: u64) -> f64 {
    if correct == 0 && incorrect == 0 {
        return NEUTRAL_SCORE;
    }

    let alpha = 1.0 + correct as f64;
    let beta = 1.0 + incorrect as f64;
    (alpha / (alpha + beta)) * HISTORICAL_DECAY
}

/// Length of the longest common subsequence
pub fn longest_common_subsequence<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    // Single-row DP table
    let mut row = vec![0usize; b.len() + 1];
    for x in a {
        let mut diagonal = 0;
        for (j, y) in b.iter().enumerate() {
            let above = row[j + 1];
            row[j + 1] = if x == y {
                diagonal + 1
            } else {
                above.max(row[j])
            };
            diagonal = above;
        }
    }
    row[b.len()]
}

/// LCS length normalized by the longer sequence
pub fn sequence_similarity<T: PartialEq>(a: &[T], b: &[T]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    longest_common_subsequence(a, b) as f64 / longest as f64
}

/// Intersection over union; two empty sets are identical
pub fn jaccard<T: Eq + Hash>(a: &HashSet<T>, b: &HashSet<T>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }

    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    intersection / union
}

/// Jaccard similarity of two metadata key sets
pub fn metadata_key_jaccard(a: &BTreeMap<String, String>, b: &BTreeMap<String, String>) -> f64 {
    let a: HashSet<&String> = a.keys().collect();
    let b: HashSet<&String> = b.keys().collect();
    jaccard(&a, &b)
}

/// Jaccard similarity of two contexts compared as `(key, value)` entries
pub fn context_entry_jaccard(a: &BTreeMap<String, String>, b: &BTreeMap<String, String>) -> f64 {
    let a: HashSet<(&String, &String)> = a.iter().collect();
    let b: HashSet<(&String, &String)> = b.iter().collect();
    jaccard(&a, &b)
}

/// Strength of a candidate pattern relative to a target
///
/// `0.4·LCS + 0.3·context Jaccard + 0.2·frequency / max_frequency + 0.1·success rate`
pub fn pattern_strength(
    target: &WorkflowPattern,
    candidate: &WorkflowPattern,
    max_frequency: u32,
) -> f64 {
    let sequence = sequence_similarity(&target.sequence, &candidate.sequence);
    let context = context_entry_jaccard(&target.context, &candidate.context);
    let frequency = if max_frequency == 0 {
        0.0
    } else {
        f64::from(candidate.frequency) / f64::from(max_frequency)
    };
    let success = clamp_confidence_score(candidate.success_rate);

    clamp_confidence_score(0.4 * sequence + 0.3 * context + 0.2 * frequency + 0.1 * success)
}

/// Highest frequency among the candidates, used to normalize frequency weights
pub fn max_frequency(candidates: &[WorkflowPattern]) -> u32 {
    candidates.iter().map(|c| c.frequency).max().unwrap_or(0)
}

/// `0.3·user + 0.4·workflow type + 0.2·metadata Jaccard + 0.1·session`
///
/// A workflow-type mismatch still earns half credit and a session mismatch
/// earns 0.1; a missing user id never matches.
pub fn context_similarity(reference: &WorkflowContext, candidate: &WorkflowContext) -> f64 {
    let user = match (&reference.user_id, &candidate.user_id) {
        (Some(a), Some(b)) if a == b => 1.0,
        _ => 0.0,
    };
    let workflow_type = if reference.workflow_type == candidate.workflow_type {
        1.0
    } else {
        0.5
    };
    let metadata = metadata_key_jaccard(&reference.metadata, &candidate.metadata);
    let session = match (&reference.session_id, &candidate.session_id) {
        (Some(a), Some(b)) if a == b => 1.0,
        _ => 0.1,
    };

    clamp_confidence_score(0.3 * user + 0.4 * workflow_type + 0.2 * metadata + 0.1 * session)
}

/// How well a user's expertise fits the requested work
///
/// Unknown domains contribute no domain alignment.
pub fn user_profile_alignment(
    profile: &UserExpertiseProfile,
    request: &WorkflowPredictionRequest,
) -> f64 {
    let experience = profile
        .acquisition_experience
        .alignment_with(request.required_expertise);
    let domain = profile
        .domain_knowledge
        .get(&request.domain)
        .map(|level| level.alignment_with(request.required_expertise))
        .unwrap_or(0.0);
    let success = clamp_confidence_score(profile.success_history);
    let complexity = profile
        .acquisition_experience
        .alignment_with(request.estimated_complexity);

    clamp_confidence_score(
        0.3 * experience + 0.25 * domain + 0.2 * success + 0.15 * complexity + 0.1 * STYLE_FACTOR,
    )
}

/// Exponential decay weight `0.5^(days / 30)`; future timestamps do not decay
pub fn decay_weight(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = (now - timestamp).num_seconds().max(0) as f64 / 86_400.0;
    0.5_f64.powf(days / TEMPORAL_HALF_LIFE_DAYS)
}

/// Relevance-weighted average of each factor's decay weight
///
/// Returns `0.5` when there are no factors or all relevances are zero.
pub fn temporal_relevance(factors: &[TemporalFactor], now: DateTime<Utc>) -> f64 {
    let mut weighted = 0.0;
    let mut total_relevance = 0.0;

    for factor in factors {
        let relevance = clamp_confidence_score(factor.relevance);
        weighted += relevance * decay_weight(factor.timestamp, now);
        total_relevance += relevance;
    }

    if total_relevance <= 0.0 {
        return NEUTRAL_SCORE;
    }
    clamp_confidence_score(weighted / total_relevance)
}

/// Uncalibrated weighted combination of the five components
pub fn weighted_confidence(components: &ConfidenceComponents) -> f64 {
    let c = components;
    clamp_confidence_score(
        weights::HISTORICAL_ACCURACY * clamp_confidence_score(c.historical_accuracy)
            + weights::PATTERN_STRENGTH * clamp_confidence_score(c.pattern_strength)
            + weights::CONTEXT_SIMILARITY * clamp_confidence_score(c.context_similarity)
            + weights::USER_PROFILE_ALIGNMENT * clamp_confidence_score(c.user_profile_alignment)
            + weights::TEMPORAL_RELEVANCE * clamp_confidence_score(c.temporal_relevance),
    )
}

/// Clamp to `[0, 1]`, mapping NaN to 0
pub fn clamp_confidence_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Sample variance (n - 1 denominator); fewer than two scores give 0
pub fn confidence_variance(scores: &[f64]) -> f64 {
    if scores.len() < 2 {
        return 0.0;
    }

    let n = scores.len() as f64;
    let mean = scores.iter().sum::<f64>() / n;
    scores.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::confidence::{ExpertiseLevel, WorkflowStyle};
    use chrono::Duration;
    use std::collections::HashMap;

    fn outcome(correct: bool) -> PredictionOutcome {
        PredictionOutcome::new("a", "b", correct)
    }

    #[test]
    fn test_historical_accuracy_empty_is_neutral() {
        assert_eq!(historical_accuracy(&[]), 0.5);
    }

    #[test]
    fn test_historical_accuracy_beta_posterior() {
        let outcomes = vec![outcome(true), outcome(false), outcome(true), outcome(true)];
        // alpha = 4, beta = 2
        let expected = (4.0 / 6.0) * HISTORICAL_DECAY;
        assert!((historical_accuracy(&outcomes) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_historical_accuracy_more_successes_is_higher() {
        let good = vec![outcome(true); 8];
        let bad = vec![outcome(false); 8];
        assert!(historical_accuracy(&good) > historical_accuracy(&bad));
        assert!(historical_accuracy(&good) < 1.0);
    }

    #[test]
    fn test_lcs() {
        let a = ["planning", "sourcing", "evaluation", "award"];
        let b = ["planning", "market_research", "evaluation", "award"];
        assert_eq!(longest_common_subsequence(&a, &a), 4);
        assert_eq!(longest_common_subsequence(&a, &b), 3);
        assert_eq!(longest_common_subsequence::<&str>(&a, &[]), 0);
        assert_eq!(longest_common_subsequence(&["a", "b", "c"], &["c", "b", "a"]), 1);
    }

    #[test]
    fn test_sequence_similarity_empty() {
        assert_eq!(sequence_similarity::<&str>(&[], &[]), 0.0);
    }

    #[test]
    fn test_jaccard() {
        let a: HashSet<i32> = [1, 2, 3].into_iter().collect();
        let b: HashSet<i32> = [2, 3, 4].into_iter().collect();
        assert!((jaccard(&a, &b) - 0.5).abs() < 1e-12);

        let empty: HashSet<i32> = HashSet::new();
        assert_eq!(jaccard(&empty, &empty), 1.0);
        assert_eq!(jaccard(&a, &empty), 0.0);
    }

    #[test]
    fn test_pattern_strength_exact_beats_fuzzy() {
        let target = WorkflowPattern::new(["planning", "sourcing", "evaluation", "award"])
            .with_context_entry("documentType", "RFP")
            .with_context_entry("value", "high")
            .with_frequency(15)
            .with_success_rate(0.85);
        let exact = WorkflowPattern::new(["planning", "sourcing", "evaluation", "award"])
            .with_context_entry("documentType", "RFP")
            .with_context_entry("value", "high")
            .with_frequency(12)
            .with_success_rate(0.9);
        let fuzzy = WorkflowPattern::new(["planning", "market_research", "evaluation", "award"])
            .with_context_entry("documentType", "RFP")
            .with_context_entry("value", "medium")
            .with_frequency(8)
            .with_success_rate(0.75);

        let candidates = vec![exact.clone(), fuzzy.clone()];
        let max = max_frequency(&candidates);
        let exact_strength = pattern_strength(&target, &exact, max);
        let fuzzy_strength = pattern_strength(&target, &fuzzy, max);

        // 0.4 * 1 + 0.3 * 1 + 0.2 * 1 + 0.1 * 0.9
        assert!((exact_strength - 0.99).abs() < 1e-12);
        assert!(fuzzy_strength < exact_strength);
        assert!(fuzzy_strength > 0.3);
    }

    #[test]
    fn test_pattern_strength_zero_frequency() {
        let target = WorkflowPattern::new(["a"]);
        let candidate = WorkflowPattern::new(["a"]).with_frequency(0).with_success_rate(0.0);
        // sequence 1.0, both contexts empty -> 1.0, no frequency, no success
        assert!((pattern_strength(&target, &candidate, 0) - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_context_similarity_components() {
        let reference = WorkflowContext::new("RFP")
            .with_user("u1")
            .with_session("s1")
            .with_metadata_entry("agency", "DOD");

        assert!((context_similarity(&reference, &reference) - 1.0).abs() < 1e-12);

        let stranger = WorkflowContext::new("Contract").with_metadata_entry("region", "east");
        // 0 + 0.4 * 0.5 + 0.2 * 0 + 0.1 * 0.1
        assert!((context_similarity(&reference, &stranger) - 0.21).abs() < 1e-12);
    }

    #[test]
    fn test_context_similarity_missing_ids_never_match() {
        let a = WorkflowContext::new("RFP");
        let b = WorkflowContext::new("RFP");
        // 0 + 0.4 + 0.2 * 1 + 0.1 * 0.1
        assert!((context_similarity(&a, &b) - 0.61).abs() < 1e-12);
    }

    fn profile() -> UserExpertiseProfile {
        let mut domain_knowledge = HashMap::new();
        domain_knowledge.insert("IT".to_string(), ExpertiseLevel::Advanced);
        domain_knowledge.insert("Construction".to_string(), ExpertiseLevel::Intermediate);

        UserExpertiseProfile {
            acquisition_experience: ExpertiseLevel::Expert,
            domain_knowledge,
            success_history: 0.88,
            average_task_time: 2.5,
            preferred_workflow_style: WorkflowStyle::Systematic,
        }
    }

    fn request(domain: &str) -> WorkflowPredictionRequest {
        WorkflowPredictionRequest {
            current_step: "technical_evaluation".to_string(),
            document_type: "RFP".to_string(),
            domain: domain.to_string(),
            estimated_complexity: ExpertiseLevel::High,
            required_expertise: ExpertiseLevel::Advanced,
        }
    }

    #[test]
    fn test_user_profile_alignment() {
        // experience 0.8, domain 1.0, success 0.88, complexity 0.6, style 0.5
        let expected = 0.3 * 0.8 + 0.25 * 1.0 + 0.2 * 0.88 + 0.15 * 0.6 + 0.1 * 0.5;
        let alignment = user_profile_alignment(&profile(), &request("IT"));
        assert!((alignment - expected).abs() < 1e-12);
    }

    #[test]
    fn test_user_profile_alignment_unknown_domain_scores_lower() {
        let known = user_profile_alignment(&profile(), &request("IT"));
        let unknown = user_profile_alignment(&profile(), &request("Healthcare"));
        assert!(unknown < known);
    }

    #[test]
    fn test_decay_weight_half_life() {
        let now = Utc::now();
        assert!((decay_weight(now, now) - 1.0).abs() < 1e-12);
        assert!((decay_weight(now - Duration::days(30), now) - 0.5).abs() < 1e-9);
        assert!((decay_weight(now - Duration::days(60), now) - 0.25).abs() < 1e-9);
        assert_eq!(decay_weight(now + Duration::days(5), now), 1.0);
    }

    #[test]
    fn test_temporal_relevance_recent_scores_higher() {
        let now = Utc::now();
        let recent = vec![TemporalFactor::new(now - Duration::hours(1), 0.95, "recent")];
        let old = vec![TemporalFactor::new(now - Duration::days(90), 0.95, "old")];

        assert!(temporal_relevance(&recent, now) > 0.99);
        assert!((temporal_relevance(&old, now) - 0.125).abs() < 1e-9);
    }

    #[test]
    fn test_temporal_relevance_weighted_average() {
        let now = Utc::now();
        let factors = vec![
            TemporalFactor::new(now, 0.75, "today"),
            TemporalFactor::new(now - Duration::days(30), 0.25, "month"),
        ];
        let expected = (0.75 * 1.0 + 0.25 * 0.5) / 1.0;
        assert!((temporal_relevance(&factors, now) - expected).abs() < 1e-9);
    }

    #[test]
    fn test_temporal_relevance_empty_is_neutral() {
        assert_eq!(temporal_relevance(&[], Utc::now()), 0.5);
        let zero = vec![TemporalFactor::new(Utc::now(), 0.0, "none")];
        assert_eq!(temporal_relevance(&zero, Utc::now()), 0.5);
    }

    #[test]
    fn test_weights_sum_to_one() {
        let sum = weights::HISTORICAL_ACCURACY
            + weights::PATTERN_STRENGTH
            + weights::CONTEXT_SIMILARITY
            + weights::USER_PROFILE_ALIGNMENT
            + weights::TEMPORAL_RELEVANCE;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_confidence() {
        let components = ConfidenceComponents {
            historical_accuracy: 0.85,
            pattern_strength: 0.78,
            context_similarity: 0.92,
            user_profile_alignment: 0.88,
            temporal_relevance: 0.75,
        };
        let expected = 0.3 * 0.85 + 0.25 * 0.78 + 0.2 * 0.92 + 0.15 * 0.88 + 0.1 * 0.75;
        assert!((weighted_confidence(&components) - expected).abs() < 1e-12);

        let neutral = weighted_confidence(&ConfidenceComponents::neutral());
        assert!((neutral - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_weighted_confidence_bounds_under_adversarial_input() {
        let values = [
            -10.0,
            -0.5,
            0.0,
            0.001,
            0.5,
            0.999,
            1.0,
            1.5,
            42.0,
            f64::NAN,
            f64::INFINITY,
            f64::NEG_INFINITY,
        ];
        for &a in &values {
            for &b in &values {
                let components = ConfidenceComponents {
                    historical_accuracy: a,
                    pattern_strength: b,
                    context_similarity: a,
                    user_profile_alignment: b,
                    temporal_relevance: a,
                };
                let score = weighted_confidence(&components);
                assert!((0.0..=1.0).contains(&score), "{a}, {b} -> {score}");
            }
        }
    }

    #[test]
    fn test_clamp_confidence_score() {
        assert_eq!(clamp_confidence_score(1.0), 1.0);
        assert_eq!(clamp_confidence_score(0.0), 0.0);
        assert_eq!(clamp_confidence_score(0.999), 0.999);
        assert_eq!(clamp_confidence_score(0.001), 0.001);
        assert_eq!(clamp_confidence_score(-0.5), 0.0);
        assert_eq!(clamp_confidence_score(1.5), 1.0);
        assert_eq!(clamp_confidence_score(f64::NAN), 0.0);
    }

    #[test]
    fn test_confidence_variance() {
        let var = confidence_variance(&[1.0, 2.0, 3.0, 4.0, 5.0]);
        assert!((var - 2.5).abs() < 1e-12);
        assert_eq!(confidence_variance(&[]), 0.0);
        assert_eq!(confidence_variance(&[0.7]), 0.0);
        assert_eq!(confidence_variance(&[0.6, 0.6, 0.6]), 0.0);
    }
}
