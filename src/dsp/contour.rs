use serde::{Deserialize, Serialize};

use super::pitch::PitchFrame;
use crate::error::{ensure_len, EngineError};

/// A pitch contour: frame times in seconds and one optional frequency per frame.
///
/// `None` means the frame was unvoiced. It is never the same thing as 0 Hz,
/// and every computation over a contour skips it.
///
/// The two vectors always have the same length; the constructor enforces it
/// so the rest of the code can zip them without checking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawContour")]
pub struct Contour {
    times: Vec<f64>,
    frequencies: Vec<Option<f64>>,
}

/// Unchecked serde shape of a contour, validated on the way in.
#[derive(Deserialize)]
struct RawContour {
    times: Vec<f64>,
    frequencies: Vec<Option<f64>>,
}

impl TryFrom<RawContour> for Contour {
    type Error = EngineError;

    fn try_from(raw: RawContour) -> Result<Self, Self::Error> {
        Contour::new(raw.times, raw.frequencies)
    }
}

impl Contour {
    pub fn new(times: Vec<f64>, frequencies: Vec<Option<f64>>) -> Result<Self, EngineError> {
        ensure_len("frequencies", times.len(), frequencies.len())?;
        Ok(Self { times, frequencies })
    }

    /// Build a contour from detector frames.
    pub fn from_frames(frames: &[PitchFrame]) -> Self {
        Self {
            times: frames.iter().map(|f| f.time).collect(),
            frequencies: frames.iter().map(|f| f.frequency).collect(),
        }
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn frequencies(&self) -> &[Option<f64>] {
        &self.frequencies
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Number of frames carrying a usable frequency.
    pub fn voiced_count(&self) -> usize {
        self.frequencies.iter().filter(|f| voiced(**f).is_some()).count()
    }

    /// Fraction of frames that are voiced, 0.0 for an empty contour.
    pub fn voiced_fraction(&self) -> f64 {
        if self.is_empty() {
            return 0.0;
        }
        self.voiced_count() as f64 / self.len() as f64
    }

    /// Whether both contours sit on exactly the same time grid.
    pub fn shares_grid_with(&self, other: &Contour) -> bool {
        self.times == other.times
    }

    /// Same grid, new frequencies (e.g. after alignment onto this grid).
    pub fn with_frequencies(&self, frequencies: Vec<Option<f64>>) -> Result<Self, EngineError> {
        Self::new(self.times.clone(), frequencies)
    }
}

/// A frequency is usable only if present, finite and positive.
///
/// Detector output sometimes carries NaN or 0.0 for silence; those are
/// treated exactly like an absent frame.
pub fn voiced(frequency: Option<f64>) -> Option<f64> {
    frequency.filter(|f| f.is_finite() && *f > 0.0)
}

/// Musical distance from `reference` to `frequency` in cents.
/// 100 cents = 1 semitone, 1200 cents = 1 octave.
pub fn cents(frequency: f64, reference: f64) -> f64 {
    1200.0 * (frequency / reference).log2()
}

/// Arithmetic mean, NaN for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation (divides by N), NaN for an empty slice.
pub fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    if m.is_nan() {
        return f64::NAN;
    }
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Mean spacing between consecutive times, or None with fewer than two times.
pub fn mean_interval(times: &[f64]) -> Option<f64> {
    if times.len() < 2 {
        return None;
    }
    Some((times[times.len() - 1] - times[0]) / (times.len() - 1) as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_rejects_length_mismatch() {
        let err = Contour::new(vec![0.0, 0.01], vec![Some(440.0)]).unwrap_err();
        assert!(matches!(err, EngineError::ShapeMismatch { .. }));
    }

    #[test]
    fn voiced_filters_sentinels() {
        assert_eq!(voiced(Some(220.0)), Some(220.0));
        assert_eq!(voiced(None), None);
        assert_eq!(voiced(Some(f64::NAN)), None);
        assert_eq!(voiced(Some(0.0)), None);
        assert_eq!(voiced(Some(-5.0)), None);
    }

    #[test]
    fn voiced_count_and_fraction() {
        let contour = Contour::new(
            vec![0.0, 0.01, 0.02, 0.03],
            vec![Some(100.0), None, Some(f64::NAN), Some(101.0)],
        )
        .unwrap();
        assert_eq!(contour.voiced_count(), 2);
        assert!((contour.voiced_fraction() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn octave_is_1200_cents() {
        assert!((cents(880.0, 440.0) - 1200.0).abs() < 1e-9);
        assert!((cents(220.0, 440.0) + 1200.0).abs() < 1e-9);
    }

    #[test]
    fn population_std_dev() {
        // Population std of [2, 4, 4, 4, 5, 5, 7, 9] is exactly 2
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!((mean(&values) - 5.0).abs() < 1e-12);
        assert!((std_dev(&values) - 2.0).abs() < 1e-12);
        assert!(std_dev(&[]).is_nan());
    }

    #[test]
    fn mean_interval_of_uniform_grid() {
        let times: Vec<f64> = (0..11).map(|i| i as f64 * 0.01).collect();
        assert!((mean_interval(&times).unwrap() - 0.01).abs() < 1e-12);
        assert!(mean_interval(&[0.0]).is_none());
    }

    #[test]
    fn json_with_nulls_roundtrip() {
        let json = r#"{"times":[0.0,0.01,0.02],"frequencies":[440.0,null,441.0]}"#;
        let contour: Contour = serde_json::from_str(json).unwrap();
        assert_eq!(contour.frequencies()[1], None);

        let back = serde_json::to_string(&contour).unwrap();
        assert!(back.contains("null"));
    }

    #[test]
    fn json_length_mismatch_fails() {
        let json = r#"{"times":[0.0,0.01],"frequencies":[440.0]}"#;
        assert!(serde_json::from_str::<Contour>(json).is_err());
    }
}
