//! Observability infrastructure - Prediction metrics

mod metrics;

pub use metrics::{record_feedback, record_prediction, record_recalibration, PredictionSource};
