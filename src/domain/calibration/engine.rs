//! Calibration dataset, Platt fit and recalibration schedule

use std::collections::VecDeque;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::diagnostics::brier_loss;
use super::{CalibrationDataPoint, PlattParameters, WeeklyCalibrationData};
use crate::domain::confidence::clamp_confidence_score;

/// Points required before a sigmoid is fitted
pub const DEFAULT_MIN_POINTS: usize = 10;
pub const DEFAULT_MAX_POINTS: usize = 5000;
pub const DEFAULT_RECALIBRATION_INTERVAL_DAYS: i64 = 7;
pub const DEFAULT_BRIER_THRESHOLD: f64 = 0.25;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationSettings {
    pub min_points: usize,
    /// Oldest points are evicted beyond this window
    pub max_points: usize,
    pub recalibration_interval_days: i64,
    pub brier_threshold: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            min_points: DEFAULT_MIN_POINTS,
            max_points: DEFAULT_MAX_POINTS,
            recalibration_interval_days: DEFAULT_RECALIBRATION_INTERVAL_DAYS,
            brier_threshold: DEFAULT_BRIER_THRESHOLD,
        }
    }
}

/// What a weekly recalibration did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecalibrationSummary {
    pub points_added: usize,
    pub dataset_size: usize,
    pub brier_loss_before: f64,
    pub brier_loss_after: f64,
    pub parameters: Option<PlattParameters>,
}

/// Keeps confidence scores honest against observed outcomes
///
/// Until a sigmoid has been fitted, [`CalibrationEngine::calibrate`] is the
/// identity (after clamping).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalibrationEngine {
    settings: CalibrationSettings,
    dataset: VecDeque<CalibrationDataPoint>,
    parameters: Option<PlattParameters>,
    last_calibration: DateTime<Utc>,
}

impl Default for CalibrationEngine {
    fn default() -> Self {
        Self::new(CalibrationSettings::default())
    }
}

impl CalibrationEngine {
    pub fn new(settings: CalibrationSettings) -> Self {
        Self {
            settings,
            dataset: VecDeque::new(),
            parameters: None,
            last_calibration: Utc::now(),
        }
    }

    pub fn with_last_calibration(mut self, at: DateTime<Utc>) -> Self {
        self.last_calibration = at;
        self
    }

    pub fn settings(&self) -> &CalibrationSettings {
        &self.settings
    }

    pub fn parameters(&self) -> Option<PlattParameters> {
        self.parameters
    }

    pub fn last_calibration(&self) -> DateTime<Utc> {
        self.last_calibration
    }

    pub fn dataset(&self) -> Vec<CalibrationDataPoint> {
        self.dataset.iter().copied().collect()
    }

    pub fn dataset_len(&self) -> usize {
        self.dataset.len()
    }

    /// Append a point, evicting the oldest beyond `max_points`
    ///
    /// The confidence is clamped to `[0, 1]`; a non-finite confidence is
    /// dropped and false returned.
    pub fn record(&mut self, point: CalibrationDataPoint) -> bool {
        let Some(point) = point.sanitized() else {
            warn!(
                confidence = point.predicted_confidence,
                "Dropping calibration point with non-finite confidence"
            );
            return false;
        };
        if self.settings.max_points == 0 {
            return false;
        }
        if self.dataset.len() == self.settings.max_points {
            self.dataset.pop_front();
        }
        self.dataset.push_back(point);
        true
    }

    /// Store `data` as the dataset and fit a sigmoid to it
    ///
    /// Does nothing, and returns false, with fewer than `min_points` points.
    /// Points with a non-finite confidence are ignored.
    pub fn apply_platt_scaling(&mut self, data: &[CalibrationDataPoint]) -> bool {
        let data: Vec<CalibrationDataPoint> = data.iter().filter_map(|p| p.sanitized()).collect();
        if data.len() < self.settings.min_points {
            debug!(
                points = data.len(),
                required = self.settings.min_points,
                "Skipping Platt scaling, not enough calibration data"
            );
            return false;
        }

        let skip = data.len().saturating_sub(self.settings.max_points);
        self.dataset = data[skip..].iter().copied().collect();
        self.refit()
    }

    /// Calibrated confidence, clamped to `[0, 1]`
    pub fn calibrate(&self, score: f64) -> f64 {
        let score = clamp_confidence_score(score);
        match self.parameters {
            Some(params) => clamp_confidence_score(params.apply(score)),
            None => score,
        }
    }

    /// Brier loss of the raw confidences; `1.0` for an empty dataset
    pub fn brier_loss(&self) -> f64 {
        brier_loss(&self.dataset)
    }

    /// Brier loss after calibration; `1.0` for an empty dataset
    pub fn calibrated_brier_loss(&self) -> f64 {
        let calibrated: Vec<CalibrationDataPoint> = self
            .dataset
            .iter()
            .map(|p| {
                CalibrationDataPoint::new(self.calibrate(p.predicted_confidence), p.actual_outcome)
            })
            .collect();
        brier_loss(&calibrated)
    }

    pub fn check_recalibration_trigger(&self) -> bool {
        self.check_recalibration_trigger_at(Utc::now())
    }

    /// True when the interval has elapsed, or when enough data shows a
    /// Brier loss above the threshold
    ///
    /// Below `min_points` only elapsed time matters, since an empty or tiny
    /// dataset reports the worst-case loss.
    pub fn check_recalibration_trigger_at(&self, now: DateTime<Utc>) -> bool {
        let elapsed = now - self.last_calibration;
        if elapsed > Duration::days(self.settings.recalibration_interval_days) {
            return true;
        }

        self.dataset.len() >= self.settings.min_points
            && self.brier_loss() > self.settings.brier_threshold
    }

    pub fn perform_weekly_recalibration(
        &mut self,
        weeks: &[WeeklyCalibrationData],
    ) -> RecalibrationSummary {
        self.perform_weekly_recalibration_at(weeks, Utc::now())
    }

    /// Fold weekly batches into the dataset in chronological order and refit
    pub fn perform_weekly_recalibration_at(
        &mut self,
        weeks: &[WeeklyCalibrationData],
        now: DateTime<Utc>,
    ) -> RecalibrationSummary {
        let brier_loss_before = self.brier_loss();

        let mut ordered: Vec<&WeeklyCalibrationData> = weeks.iter().collect();
        ordered.sort_by_key(|w| w.week);

        let mut points_added = 0;
        for week in ordered {
            for point in &week.calibration_points {
                if self.record(*point) {
                    points_added += 1;
                }
            }
        }

        if self.dataset.len() >= self.settings.min_points {
            self.refit();
        }
        self.last_calibration = now;

        let summary = RecalibrationSummary {
            points_added,
            dataset_size: self.dataset.len(),
            brier_loss_before,
            brier_loss_after: self.calibrated_brier_loss(),
            parameters: self.parameters,
        };

        info!(
            points_added = summary.points_added,
            dataset_size = summary.dataset_size,
            brier_before = summary.brier_loss_before,
            brier_after = summary.brier_loss_after,
            "Weekly recalibration completed"
        );
        summary
    }

    /// Drop data and fitted parameters, restarting the schedule
    pub fn reset(&mut self) {
        self.dataset.clear();
        self.parameters = None;
        self.last_calibration = Utc::now();
    }

    fn refit(&mut self) -> bool {
        let points: Vec<CalibrationDataPoint> = self.dataset.iter().copied().collect();
        match PlattParameters::fit(&points) {
            Some(params) => {
                debug!(a = params.a, b = params.b, points = points.len(), "Fitted Platt scaling");
                self.parameters = Some(params);
                true
            }
            None => false,
        }
    }
}
