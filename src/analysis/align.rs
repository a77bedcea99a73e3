use tracing::debug;

use crate::dsp::contour::voiced;
use crate::error::{ensure_len, ensure_time_grid, EngineError};

/// Lowest frequency kept after interpolation. Below this is not singing.
pub const MIN_ALIGNED_HZ: f64 = 50.0;

/// Highest frequency kept after interpolation.
pub const MAX_ALIGNED_HZ: f64 = 2000.0;

/// Result of resampling a contour onto another time grid.
///
/// With fewer than two voiced source points there is nothing to
/// interpolate between. That's a common, expected outcome (a silent take),
/// so it is a variant rather than an error.
#[derive(Debug, Clone, PartialEq)]
pub enum Alignment {
    Interpolated(Vec<Option<f64>>),
    Insufficient { voiced_points: usize, len: usize },
}

impl Alignment {
    /// The aligned frequencies; an all-unvoiced contour when insufficient.
    pub fn into_frequencies(self) -> Vec<Option<f64>> {
        match self {
            Alignment::Interpolated(frequencies) => frequencies,
            Alignment::Insufficient { len, .. } => vec![None; len],
        }
    }

    pub fn is_insufficient(&self) -> bool {
        matches!(self, Alignment::Insufficient { .. })
    }
}

/// Resample `source_freqs` (sampled at `source_times`) onto `target_times`.
///
/// Unvoiced source frames are dropped first, then the remaining points are
/// joined by straight lines. Targets before the first or after the last
/// voiced point are extrapolated from the outermost segment. Any value that
/// lands outside 50–2000 Hz becomes unvoiced.
///
/// `source_times` must be strictly increasing. `target_times` may be in any
/// order; a non-finite target time yields an unvoiced frame.
pub fn align_contour(
    source_times: &[f64],
    source_freqs: &[Option<f64>],
    target_times: &[f64],
) -> Result<Alignment, EngineError> {
    ensure_len("source frequencies", source_times.len(), source_freqs.len())?;
    ensure_time_grid(source_times)?;

    let (xs, ys): (Vec<f64>, Vec<f64>) = source_times
        .iter()
        .zip(source_freqs)
        .filter_map(|(&t, &f)| voiced(f).map(|f| (t, f)))
        .unzip();

    if xs.len() < 2 {
        debug!(
            voiced_points = xs.len(),
            targets = target_times.len(),
            "too few voiced points to align"
        );
        return Ok(Alignment::Insufficient {
            voiced_points: xs.len(),
            len: target_times.len(),
        });
    }

    let aligned = target_times
        .iter()
        .map(|&t| {
            Some(interpolate(&xs, &ys, t)).filter(|f| (MIN_ALIGNED_HZ..=MAX_ALIGNED_HZ).contains(f))
        })
        .collect();

    Ok(Alignment::Interpolated(aligned))
}

/// Convenience form of [`align_contour`] returning the frequencies directly.
pub fn align(
    source_times: &[f64],
    source_freqs: &[Option<f64>],
    target_times: &[f64],
) -> Result<Vec<Option<f64>>, EngineError> {
    align_contour(source_times, source_freqs, target_times).map(Alignment::into_frequencies)
}

/// Piecewise-linear interpolation through (xs, ys), extrapolating past the
/// ends with the first/last segment. Needs at least two points.
fn interpolate(xs: &[f64], ys: &[f64], t: f64) -> f64 {
    // Segment i covers [xs[i], xs[i+1]); clamp so the ends extrapolate.
    let i = xs.partition_point(|&x| x <= t).saturating_sub(1).min(xs.len() - 2);

    let (x0, x1) = (xs[i], xs[i + 1]);
    let (y0, y1) = (ys[i], ys[i + 1]);
    y0 + (y1 - y0) * (t - x0) / (x1 - x0)
}
