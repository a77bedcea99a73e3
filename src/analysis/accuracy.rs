use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsp::contour::{cents, mean, std_dev, voiced};
use crate::error::{ensure_len, EngineError};

/// Default pitch tolerance: one semitone.
pub const DEFAULT_TOLERANCE_CENTS: f64 = 100.0;

/// Keeps the coefficient of variation finite when every error is zero.
const CV_EPSILON: f64 = 1e-6;

/// Pitch accuracy of a performance against its target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PitchMetrics {
    /// Mean absolute pitch error in Hz. None when no frame could be compared.
    pub mean_error_hz: Option<f64>,
    /// Standard deviation of the absolute error in Hz.
    pub std_error_hz: Option<f64>,
    /// Percentage of compared frames within the cents tolerance (0-100).
    pub accuracy: f64,
    /// Consistency of the error (0-1, higher is steadier).
    pub stability: f64,
    /// Frames where both user and target were voiced.
    pub voiced_frames: usize,
    /// All frames handed in.
    pub total_frames: usize,
}

impl PitchMetrics {
    /// Metrics for a performance with no comparable frames.
    pub fn degenerate(total_frames: usize) -> Self {
        Self {
            mean_error_hz: None,
            std_error_hz: None,
            accuracy: 0.0,
            stability: 0.0,
            voiced_frames: 0,
            total_frames,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        self.voiced_frames == 0
    }
}

/// Compare a user contour to a target contour on the same time grid.
///
/// Only frames where both sides are voiced take part. For those:
///   - error_hz    = |user - target|
///   - error_cents = |1200 * log2(user / target)|
///
/// Accuracy is the share of frames with error_cents strictly below
/// `tolerance_cents`. Cents, not Hz, because pitch perception is
/// logarithmic: 10 Hz off at 110 Hz is far worse than 10 Hz off at 880 Hz.
///
/// Stability = 1 / (1 + CV), where CV = std(error_hz) / (mean(error_hz) + ε).
/// It measures how *consistent* the error is, not whether it's small: a
/// singer who is steadily a third flat scores high on stability and low on
/// accuracy.
pub fn analyze_accuracy(
    user: &[Option<f64>],
    target: &[Option<f64>],
    tolerance_cents: f64,
) -> Result<PitchMetrics, EngineError> {
    ensure_len("user frequencies", target.len(), user.len())?;

    let (error_hz, error_cents): (Vec<f64>, Vec<f64>) = user
        .iter()
        .zip(target)
        .filter_map(|(&u, &t)| Some((voiced(u)?, voiced(t)?)))
        .map(|(u, t)| ((u - t).abs(), cents(u, t).abs()))
        .unzip();

    if error_hz.is_empty() {
        debug!(total_frames = user.len(), "no overlapping voiced frames");
        return Ok(PitchMetrics::degenerate(user.len()));
    }

    let within = error_cents.iter().filter(|&&c| c < tolerance_cents).count();
    let accuracy = 100.0 * within as f64 / error_cents.len() as f64;

    let mean_error = mean(&error_hz);
    let std_error = std_dev(&error_hz);
    let variation = std_error / (mean_error + CV_EPSILON);
    let stability = 1.0 / (1.0 + variation);

    Ok(PitchMetrics {
        mean_error_hz: Some(mean_error),
        std_error_hz: Some(std_error),
        accuracy,
        stability,
        voiced_frames: error_hz.len(),
        total_frames: user.len(),
    })
}
