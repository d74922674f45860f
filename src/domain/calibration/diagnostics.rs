//! Stateless calibration diagnostics

use super::{
    CalibrationDataPoint, CalibrationPlot, CalibrationPlotPoint, ConfidenceCategory, OutcomeData,
    PredictionData, ReliabilityDataPoint, ReliabilityDiagram,
};

/// Brier score of an uninformative 50/50 forecaster
pub const REFERENCE_BRIER_SCORE: f64 = 0.25;

/// Minimum distance from [`REFERENCE_BRIER_SCORE`] counted as significant
pub const SIGNIFICANCE_MARGIN: f64 = 0.01;

/// Mean squared error of the points; `1.0` when there are none
///
/// Points with a non-finite confidence are skipped.
pub fn brier_loss<'a>(points: impl IntoIterator<Item = &'a CalibrationDataPoint>) -> f64 {
    let (sum, count) = points
        .into_iter()
        .filter_map(|p| p.sanitized())
        .fold((0.0, 0usize), |(sum, count), p| (sum + p.squared_error(), count + 1));

    if count == 0 {
        return 1.0;
    }
    sum / count as f64
}

/// Brier score over predictions and outcomes paired by index
///
/// Empty or mismatched inputs score the worst case, `1.0`.
pub fn calculate_brier_score(predictions: &[PredictionData], outcomes: &[OutcomeData]) -> f64 {
    if predictions.is_empty() || predictions.len() != outcomes.len() {
        return 1.0;
    }

    let sum: f64 = predictions
        .iter()
        .zip(outcomes)
        .map(|(p, o)| {
            let outcome = if o.success { 1.0 } else { 0.0 };
            (p.confidence - outcome).powi(2)
        })
        .sum();

    let score = sum / predictions.len() as f64;
    if score.is_finite() { score } else { 1.0 }
}

/// Whether a Brier score differs from the uninformative baseline
///
/// A fixed-margin heuristic, not a hypothesis test.
pub fn calculate_statistical_significance(brier_score: f64) -> bool {
    (brier_score - REFERENCE_BRIER_SCORE).abs() > SIGNIFICANCE_MARGIN
}

pub fn map_confidence_to_categories(scores: &[f64]) -> Vec<ConfidenceCategory> {
    scores
        .iter()
        .map(|&s| ConfidenceCategory::from_score(s))
        .collect()
}

/// Confidence bins used when summarizing raw calibration points
pub const DEFAULT_BIN_COUNT: usize = 10;

/// Equal-width confidence bins over `[0, 1]` as `(low, high, correct, total)`
///
/// Empty bins and points with a non-finite confidence are left out.
fn bin_points(points: &[CalibrationDataPoint], bins: usize) -> Vec<(f64, f64, usize, usize)> {
    let bins = bins.max(1);
    let mut counts = vec![(0usize, 0usize); bins];
    for point in points.iter().filter_map(|p| p.sanitized()) {
        let index = ((point.predicted_confidence * bins as f64) as usize).min(bins - 1);
        counts[index].1 += 1;
        if point.actual_outcome {
            counts[index].0 += 1;
        }
    }

    counts
        .into_iter()
        .enumerate()
        .filter(|(_, (_, total))| *total > 0)
        .map(|(i, (correct, total))| {
            let width = 1.0 / bins as f64;
            (i as f64 * width, (i + 1) as f64 * width, correct, total)
        })
        .collect()
}

/// Observed success frequency per confidence bin
pub fn calibration_plot_points(points: &[CalibrationDataPoint], bins: usize) -> Vec<CalibrationPlotPoint> {
    bin_points(points, bins)
        .into_iter()
        .map(|(low, high, correct, total)| CalibrationPlotPoint {
            bin_center: (low + high) / 2.0,
            observed_frequency: correct as f64 / total as f64,
            sample_size: total,
        })
        .collect()
}

/// Accuracy per confidence bin
pub fn reliability_points(points: &[CalibrationDataPoint], bins: usize) -> Vec<ReliabilityDataPoint> {
    bin_points(points, bins)
        .into_iter()
        .map(|(low, high, correct, total)| ReliabilityDataPoint {
            confidence_bin: low..=high,
            accuracy: correct as f64 / total as f64,
            sample_size: total,
        })
        .collect()
}

/// Calibration plot with R² of observed frequency against bin center
///
/// Returns `None` for an empty input. A perfectly calibrated plot has
/// `r_squared == 1`.
pub fn generate_calibration_plot(data: &[CalibrationPlotPoint]) -> Option<CalibrationPlot> {
    if data.is_empty() {
        return None;
    }

    let n = data.len() as f64;
    let mean_observed = data.iter().map(|p| p.observed_frequency).sum::<f64>() / n;
    let ss_total: f64 = data
        .iter()
        .map(|p| (p.observed_frequency - mean_observed).powi(2))
        .sum();
    let ss_residual: f64 = data
        .iter()
        .map(|p| (p.observed_frequency - p.bin_center).powi(2))
        .sum();

    let r_squared = if ss_total > 0.0 {
        1.0 - ss_residual / ss_total
    } else if ss_residual == 0.0 {
        1.0
    } else {
        0.0
    };

    Some(CalibrationPlot {
        points: data.to_vec(),
        r_squared,
    })
}

/// Sample-size-weighted accuracy across reliability bins
///
/// Returns `None` when there are no bins or no samples.
pub fn validate_reliability_diagram(data: &[ReliabilityDataPoint]) -> Option<ReliabilityDiagram> {
    let total: usize = data.iter().map(|p| p.sample_size).sum();
    if total == 0 {
        return None;
    }

    let weighted: f64 = data
        .iter()
        .map(|p| p.accuracy * p.sample_size as f64)
        .sum();

    Some(ReliabilityDiagram {
        points: data.to_vec(),
        overall_accuracy: weighted / total as f64,
    })
}
