//! Calibration domain - Platt scaling, Brier loss and reliability diagnostics

mod diagnostics;
mod engine;
mod entity;
mod platt;

pub use diagnostics::{
    brier_loss, calculate_brier_score, calculate_statistical_significance,
    calibration_plot_points, generate_calibration_plot, map_confidence_to_categories,
    reliability_points, validate_reliability_diagram, DEFAULT_BIN_COUNT, REFERENCE_BRIER_SCORE,
    SIGNIFICANCE_MARGIN,
};
pub use engine::{
    CalibrationEngine, CalibrationSettings, RecalibrationSummary, DEFAULT_BRIER_THRESHOLD,
    DEFAULT_MAX_POINTS, DEFAULT_MIN_POINTS, DEFAULT_RECALIBRATION_INTERVAL_DAYS,
};
pub use entity::{
    CalibrationDataPoint, CalibrationPlot, CalibrationPlotPoint, ConfidenceCategory, OutcomeData,
    PredictionData, ReliabilityDataPoint, ReliabilityDiagram, WeeklyCalibrationData,
};
pub use platt::PlattParameters;
