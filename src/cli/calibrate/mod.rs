//! Calibrate command - fits Platt scaling to recorded confidence outcomes

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::Args;
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::calibration::{
    brier_loss, calculate_statistical_significance, calibration_plot_points,
    generate_calibration_plot, reliability_points, validate_reliability_diagram,
    CalibrationDataPoint, CalibrationPlot, PlattParameters, ReliabilityDiagram, DEFAULT_BIN_COUNT,
};
use crate::infrastructure::services::ConfidenceScorer;

/// Arguments for the calibrate command
#[derive(Args, Clone)]
pub struct CalibrateArgs {
    /// JSON file with a list of calibration points
    #[arg(long)]
    pub input: PathBuf,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalibrationReport {
    points: usize,
    fitted: bool,
    parameters: Option<PlattParameters>,
    brier_loss: f64,
    calibrated_brier_loss: f64,
    significant: bool,
    categories: BTreeMap<String, usize>,
    calibration_plot: Option<CalibrationPlot>,
    reliability: Option<ReliabilityDiagram>,
    recalibration_due: bool,
}

/// Run the calibration
pub async fn run(args: CalibrateArgs) -> anyhow::Result<()> {
    let config = super::bootstrap()?;
    let points: Vec<CalibrationDataPoint> = super::read_json(&args.input)?;

    let scorer = ConfidenceScorer::new(config.calibration.to_settings());
    let fitted = scorer.apply_platt_scaling(&points).await;
    if fitted {
        info!(points = points.len(), "Fitted calibration");
    } else {
        warn!(
            points = points.len(),
            required = config.calibration.min_points,
            "Not enough calibration points, scores stay uncalibrated"
        );
    }

    let scores: Vec<f64> = points.iter().map(|p| p.predicted_confidence).collect();
    let mut categories = BTreeMap::new();
    for category in scorer.map_confidence_to_categories(&scores) {
        *categories.entry(category.to_string()).or_insert(0) += 1;
    }

    // Below the minimum the scorer keeps no data, so score the input directly
    let raw_loss = brier_loss(&points);
    let calibrated_loss = if fitted {
        scorer.calculate_calibrated_brier_loss().await
    } else {
        raw_loss
    };

    let report = CalibrationReport {
        points: points.len(),
        fitted,
        parameters: scorer.calibration_parameters().await,
        brier_loss: raw_loss,
        calibrated_brier_loss: calibrated_loss,
        significant: calculate_statistical_significance(raw_loss),
        categories,
        calibration_plot: generate_calibration_plot(&calibration_plot_points(
            &points,
            DEFAULT_BIN_COUNT,
        )),
        reliability: validate_reliability_diagram(&reliability_points(&points, DEFAULT_BIN_COUNT)),
        recalibration_due: scorer.check_recalibration_trigger().await,
    };
    super::print_json(&report)
}
