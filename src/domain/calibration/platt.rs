//! Platt scaling: logistic calibration of raw confidence scores
//!
//! Fits `P(correct | s) = sigmoid(a·s + b)` by maximum likelihood using
//! Newton's method with a backtracking line search. Targets are smoothed
//! (`(N+ + 1) / (N+ + 2)` and `1 / (N- + 2)`) so a perfectly separable
//! dataset still yields finite parameters.

use serde::{Deserialize, Serialize};

use super::CalibrationDataPoint;

const MAX_ITERATIONS: usize = 100;
const MIN_STEP: f64 = 1e-10;
const HESSIAN_RIDGE: f64 = 1e-12;
const GRADIENT_TOLERANCE: f64 = 1e-5;
const ARMIJO: f64 = 1e-4;

/// Fitted sigmoid parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattParameters {
    pub a: f64,
    pub b: f64,
}

impl PlattParameters {
    /// Calibrated probability for a raw score
    pub fn apply(&self, score: f64) -> f64 {
        sigmoid(self.a * score + self.b)
    }

    /// Maximum-likelihood fit; `None` when the data is empty or not finite
    pub fn fit(points: &[CalibrationDataPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let positives = points.iter().filter(|p| p.actual_outcome).count() as f64;
        let negatives = points.len() as f64 - positives;
        let hi_target = (positives + 1.0) / (positives + 2.0);
        let lo_target = 1.0 / (negatives + 2.0);

        let samples: Vec<(f64, f64)> = points
            .iter()
            .map(|p| {
                let target = if p.actual_outcome { hi_target } else { lo_target };
                (p.predicted_confidence, target)
            })
            .collect();

        if samples.iter().any(|(s, _)| !s.is_finite()) {
            return None;
        }

        let mut a = 0.0;
        let mut b = ((positives + 1.0) / (negatives + 1.0)).ln();
        let mut loss = negative_log_likelihood(&samples, a, b);

        for _ in 0..MAX_ITERATIONS {
            // Gradient and Hessian of the negative log-likelihood
            let (mut g_a, mut g_b) = (0.0, 0.0);
            let (mut h_aa, mut h_ab, mut h_bb) = (HESSIAN_RIDGE, 0.0, HESSIAN_RIDGE);
            for &(s, t) in &samples {
                let p = sigmoid(a * s + b);
                let d = p - t;
                let w = p * (1.0 - p);
                g_a += s * d;
                g_b += d;
                h_aa += s * s * w;
                h_ab += s * w;
                h_bb += w;
            }

            if g_a.abs() < GRADIENT_TOLERANCE && g_b.abs() < GRADIENT_TOLERANCE {
                break;
            }

            let det = h_aa * h_bb - h_ab * h_ab;
            if det <= 0.0 || !det.is_finite() {
                break;
            }
            let step_a = -(h_bb * g_a - h_ab * g_b) / det;
            let step_b = -(-h_ab * g_a + h_aa * g_b) / det;
            let slope = g_a * step_a + g_b * step_b;

            let mut t = 1.0;
            let mut improved = false;
            while t >= MIN_STEP {
                let next_a = a + t * step_a;
                let next_b = b + t * step_b;
                let next_loss = negative_log_likelihood(&samples, next_a, next_b);
                if next_loss <= loss + ARMIJO * t * slope {
                    a = next_a;
                    b = next_b;
                    loss = next_loss;
                    improved = true;
                    break;
                }
                t /= 2.0;
            }

            if !improved {
                break;
            }
        }

        (a.is_finite() && b.is_finite()).then_some(Self { a, b })
    }
}

pub(crate) fn sigmoid(x: f64) -> f64 {
    if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    }
}

/// `ln(1 + e^x)` without overflow
fn softplus(x: f64) -> f64 {
    if x > 0.0 {
        x + (-x).exp().ln_1p()
    } else {
        x.exp().ln_1p()
    }
}

fn negative_log_likelihood(samples: &[(f64, f64)], a: f64, b: f64) -> f64 {
    // -[t·ln p + (1-t)·ln(1-p)] with p = sigmoid(z) is softplus(z) - t·z
    samples
        .iter()
        .map(|&(s, t)| {
            let z = a * s + b;
            softplus(z) - t * z
        })
        .sum()
}
