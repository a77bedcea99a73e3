use tracing::{debug, warn};

use super::accuracy::{self, PitchMetrics, DEFAULT_TOLERANCE_CENTS};
use super::report::{Feedback, ScoreReport};
use super::vibrato::{self, VibratoMetrics, VibratoParams};
use crate::dsp::contour::voiced;
use crate::error::{ensure_len, ensure_time_grid, EngineError};

/// Added to the score when vibrato is detected.
pub const VIBRATO_BONUS: f64 = 5.0;

/// Stability (0-1) is scaled by this into a bonus of up to 10 points.
pub const STABILITY_BONUS_SCALE: f64 = 10.0;

/// Hz of mean error that cost one point in the quick score.
const QUICK_SCORE_PENALTY_PER_HZ: f64 = 0.5;

/// Parameters for a full performance analysis, with the usual defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    /// Frames within this many cents of the target count as accurate.
    pub tolerance_cents: f64,
    pub vibrato: VibratoParams,
}

impl Default for AnalysisParams {
    fn default() -> Self {
        Self {
            tolerance_cents: DEFAULT_TOLERANCE_CENTS,
            vibrato: VibratoParams::default(),
        }
    }
}

/// Strategy producing the base score (0-100) the bonuses are added to.
///
/// Any `Fn(&[Option<f64>], &[Option<f64>]) -> Result<f64, EngineError>`
/// closure is a scorer, which keeps tests and callers free to inject one.
pub trait BaseScorer {
    fn base_score(&self, user: &[Option<f64>], target: &[Option<f64>]) -> Result<f64, EngineError>;
}

impl<F> BaseScorer for F
where
    F: Fn(&[Option<f64>], &[Option<f64>]) -> Result<f64, EngineError>,
{
    fn base_score(&self, user: &[Option<f64>], target: &[Option<f64>]) -> Result<f64, EngineError> {
        self(user, target)
    }
}

/// The cheap scorer: 100 minus half the mean absolute error in Hz.
///
/// Linear in Hz rather than cents, so it is harsher on high notes than the
/// accuracy percentage. It's a rough proxy for callers that only want a
/// number, and can also serve as the base of a full report.
#[derive(Debug, Clone, Copy, Default)]
pub struct MeanErrorScorer;

impl BaseScorer for MeanErrorScorer {
    fn base_score(&self, user: &[Option<f64>], target: &[Option<f64>]) -> Result<f64, EngineError> {
        quick_score(user, target)
    }
}

/// Score two equal-length contours by mean absolute Hz error.
///
/// Frames where either side is unvoiced are ignored; with no comparable
/// frames the score is 0.
pub fn quick_score(user: &[Option<f64>], target: &[Option<f64>]) -> Result<f64, EngineError> {
    ensure_len("user frequencies", target.len(), user.len())?;

    let errors: Vec<f64> = user
        .iter()
        .zip(target)
        .filter_map(|(&u, &t)| Some((voiced(u)? - voiced(t)?).abs()))
        .collect();

    if errors.is_empty() {
        return Ok(0.0);
    }

    let mean_error = errors.iter().sum::<f64>() / errors.len() as f64;
    Ok((100.0 - mean_error * QUICK_SCORE_PENALTY_PER_HZ).clamp(0.0, 100.0))
}

/// Run the full analysis and assemble the report.
///
/// `user` and `target` must already be on the `times` grid. The base score
/// comes from `base_scorer` when given, otherwise it is the accuracy
/// percentage. Then:
///
///   total = clamp(base + vibrato_bonus + stability * 10, 0, 100)
///
/// where vibrato_bonus is 5 when vibrato was detected in the user contour.
pub fn score(
    user: &[Option<f64>],
    target: &[Option<f64>],
    times: &[f64],
    base_scorer: Option<&dyn BaseScorer>,
    params: &AnalysisParams,
) -> Result<ScoreReport, EngineError> {
    ensure_len("user frequencies", times.len(), user.len())?;
    ensure_len("target frequencies", times.len(), target.len())?;
    ensure_time_grid(times)?;

    let pitch_metrics = accuracy::analyze_accuracy(user, target, params.tolerance_cents)?;
    let vibrato_metrics = vibrato::detect_vibrato(user, times, &params.vibrato)?;

    let base = match base_scorer {
        Some(scorer) => scorer.base_score(user, target)?,
        None => pitch_metrics.accuracy,
    };
    let total_score = total_score(base, &pitch_metrics, &vibrato_metrics);

    let notes = feedback(&pitch_metrics, &vibrato_metrics, total_score);

    let duration = match (times.first(), times.last()) {
        (Some(first), Some(last)) => last - first,
        _ => 0.0,
    };

    debug!(
        total_score,
        base,
        accuracy = pitch_metrics.accuracy,
        stability = pitch_metrics.stability,
        vibrato = vibrato_metrics.detected(),
        "scored performance"
    );

    Ok(ScoreReport {
        total_score,
        pitch_metrics,
        vibrato_metrics,
        duration,
        notes,
    })
}

/// Combine the base score with the vibrato and stability bonuses.
pub fn total_score(base: f64, pitch: &PitchMetrics, vibrato: &VibratoMetrics) -> f64 {
    let base = if base.is_finite() {
        base
    } else {
        warn!(base, "base scorer returned a non-finite score, using 0");
        0.0
    };

    let vibrato_bonus = if vibrato.detected() { VIBRATO_BONUS } else { 0.0 };
    let stability_bonus = pitch.stability * STABILITY_BONUS_SCALE;
    let stability_bonus = if stability_bonus.is_finite() {
        stability_bonus
    } else {
        warn!(stability = pitch.stability, "stability is not finite, using 0");
        0.0
    };

    (base + vibrato_bonus + stability_bonus).clamp(0.0, 100.0)
}

/// Feedback text for each category, picked by fixed thresholds.
pub fn feedback(pitch: &PitchMetrics, vibrato: &VibratoMetrics, total_score: f64) -> Feedback {
    let pitch_accuracy = if pitch.accuracy >= 80.0 {
        "Excellent pitch accuracy!"
    } else if pitch.accuracy >= 60.0 {
        "Good pitch accuracy. Try to stay closer to the target."
    } else if pitch.accuracy >= 40.0 {
        "Fair pitch accuracy. Focus on hitting the right notes."
    } else {
        "Pitch accuracy needs improvement. Listen carefully to the backing track."
    };

    let stability = if pitch.stability >= 0.8 {
        "Great pitch stability!"
    } else if pitch.stability >= 0.5 {
        "Good stability. Try to reduce pitch wavering."
    } else {
        "Work on maintaining stable pitch."
    };

    let vibrato = vibrato.vibrato().map(|v| {
        format!(
            "Nice vibrato detected! ({:.1} Hz, {:.0} cents)",
            v.frequency_hz, v.depth_cents
        )
    });

    let overall = if total_score >= 90.0 {
        "Outstanding performance!"
    } else if total_score >= 75.0 {
        "Great job! Keep it up!"
    } else if total_score >= 60.0 {
        "Good effort! Practice more to improve."
    } else {
        "Keep practicing! You'll improve with time."
    };

    Feedback {
        pitch_accuracy: pitch_accuracy.into(),
        stability: stability.into(),
        vibrato,
        overall: overall.into(),
    }
}
