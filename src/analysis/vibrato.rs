use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dsp::autocorr;
use crate::dsp::contour::{mean, mean_interval, std_dev, voiced};
use crate::dsp::smoothing;
use crate::error::{ensure_len, EngineError};

/// Fewer voiced frames than this can't support the autocorrelation estimate.
pub const MIN_VOICED_FRAMES: usize = 100;

/// Autocorrelation peaks must be at least this strong to count as periodic.
pub const PEAK_THRESHOLD: f64 = 0.3;

/// Longest vibrato period searched for, in seconds.
const MAX_PERIOD_SECS: f64 = 0.5;

/// A lag window shorter than this can't resolve a period.
const MIN_LAG_WINDOW: usize = 10;

/// Upper bound on the smoothing window, in samples.
const MAX_SMOOTHING_WINDOW: usize = 51;

/// Degree of the smoothing polynomial.
const SMOOTHING_DEGREE: usize = 3;

/// Residuals with an RMS below this (Hz) carry no oscillation, only
/// floating-point noise from the smoothing fit.
const MIN_RESIDUAL_RMS_HZ: f64 = 1e-6;

/// Center frequencies below this (Hz) make the depth ratio meaningless.
const MIN_CENTER_HZ: f64 = 1e-6;

/// Parameters for vibrato detection.
#[derive(Debug, Clone, PartialEq)]
pub struct VibratoParams {
    /// Slowest accepted vibrato rate (Hz).
    pub min_rate_hz: f64,
    /// Fastest accepted vibrato rate (Hz).
    pub max_rate_hz: f64,
    /// Shallowest accepted depth (cents).
    pub min_depth_cents: f64,
}

impl Default for VibratoParams {
    fn default() -> Self {
        // 4-8 Hz is the typical range for trained singers
        Self {
            min_rate_hz: 4.0,
            max_rate_hz: 8.0,
            min_depth_cents: 30.0,
        }
    }
}

/// A detected vibrato.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vibrato {
    /// Oscillation rate in Hz.
    pub frequency_hz: f64,
    /// Depth in cents.
    pub depth_cents: f64,
    /// Percentage of samples oscillating beyond the baseline noise (0-100).
    pub coverage: f64,
}

/// Which gate turned the contour down.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "reason")]
pub enum VibratoRejection {
    TooFewVoicedFrames { found: usize, required: usize },
    SearchWindowTooShort { max_lag: usize },
    NoOscillation,
    NoPeriodicPeak,
    RateOutOfBand { rate_hz: f64 },
    DepthTooShallow { depth_cents: f64 },
    DegenerateCenter,
}

/// Outcome of vibrato detection.
#[derive(Debug, Clone, PartialEq)]
pub enum VibratoMetrics {
    Detected(Vibrato),
    NotDetected(VibratoRejection),
}

impl VibratoMetrics {
    pub fn detected(&self) -> bool {
        matches!(self, VibratoMetrics::Detected(_))
    }

    pub fn vibrato(&self) -> Option<&Vibrato> {
        match self {
            VibratoMetrics::Detected(v) => Some(v),
            VibratoMetrics::NotDetected(_) => None,
        }
    }

    pub fn frequency_hz(&self) -> Option<f64> {
        self.vibrato().map(|v| v.frequency_hz)
    }

    pub fn depth_cents(&self) -> Option<f64> {
        self.vibrato().map(|v| v.depth_cents)
    }

    /// Coverage percentage, 0 when nothing was detected.
    pub fn coverage(&self) -> f64 {
        self.vibrato().map_or(0.0, |v| v.coverage)
    }
}

/// Flat report layout: `detected`, `frequency_hz`, `depth_cents`, `coverage`.
#[derive(Serialize, Deserialize)]
struct VibratoRecord {
    detected: bool,
    frequency_hz: Option<f64>,
    depth_cents: Option<f64>,
    coverage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rejection: Option<VibratoRejection>,
}

impl Serialize for VibratoMetrics {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rejection = match self {
            VibratoMetrics::Detected(_) => None,
            VibratoMetrics::NotDetected(r) => Some(r.clone()),
        };
        VibratoRecord {
            detected: self.detected(),
            frequency_hz: self.frequency_hz(),
            depth_cents: self.depth_cents(),
            coverage: self.coverage(),
            rejection,
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for VibratoMetrics {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let record = VibratoRecord::deserialize(deserializer)?;
        match (record.detected, record.frequency_hz, record.depth_cents) {
            (true, Some(frequency_hz), Some(depth_cents)) => Ok(VibratoMetrics::Detected(Vibrato {
                frequency_hz,
                depth_cents,
                coverage: record.coverage,
            })),
            (true, _, _) => Err(serde::de::Error::custom(
                "detected vibrato needs frequency_hz and depth_cents",
            )),
            (false, _, _) => Ok(VibratoMetrics::NotDetected(
                record.rejection.unwrap_or(VibratoRejection::NoPeriodicPeak),
            )),
        }
    }
}

/// Detect vibrato in a pitch contour.
///
/// Steps, over the voiced frames only:
///   1. Smooth with a cubic Savitzky–Golay filter (window ≈ half the
///      frames, odd, at most 51) to get the note trajectory without vibrato.
///   2. Residual = contour - trajectory: the oscillating part.
///   3. Normalized autocorrelation of the zero-meaned residual, lags up to
///      half its length and at most 0.5 s.
///   4. The first autocorrelation peak above 0.3 gives the period; its rate
///      must fall inside the accepted band.
///   5. Depth = |1200 * log2(max(residual) / mean(trajectory))|, must reach
///      `min_depth_cents`.
///   6. Coverage = share of residual samples whose magnitude exceeds the
///      residual's standard deviation.
///
/// Each gate is independent; the first one failing decides the outcome and
/// no partial metrics are reported.
pub fn detect_vibrato(
    freqs: &[Option<f64>],
    times: &[f64],
    params: &VibratoParams,
) -> Result<VibratoMetrics, EngineError> {
    ensure_len("times", freqs.len(), times.len())?;

    let (voiced_times, pitch): (Vec<f64>, Vec<f64>) = times
        .iter()
        .zip(freqs)
        .filter_map(|(&t, &f)| voiced(f).map(|f| (t, f)))
        .unzip();

    let outcome = match measure(&voiced_times, &pitch, params) {
        Ok(vibrato) => VibratoMetrics::Detected(vibrato),
        Err(rejection) => {
            debug!(?rejection, voiced = pitch.len(), "no vibrato");
            VibratoMetrics::NotDetected(rejection)
        }
    };

    Ok(outcome)
}

fn measure(times: &[f64], pitch: &[f64], params: &VibratoParams) -> Result<Vibrato, VibratoRejection> {
    let n = pitch.len();
    if n < MIN_VOICED_FRAMES {
        return Err(VibratoRejection::TooFewVoicedFrames {
            found: n,
            required: MIN_VOICED_FRAMES,
        });
    }

    let window = smoothing::smoothing_window(n, MAX_SMOOTHING_WINDOW);
    // Can't fail for n >= MIN_VOICED_FRAMES; fall back to no smoothing anyway
    let smoothed = smoothing::savitzky_golay(pitch, window, SMOOTHING_DEGREE)
        .unwrap_or_else(|| pitch.to_vec());

    let residual: Vec<f64> = pitch.iter().zip(&smoothed).map(|(p, s)| p - s).collect();

    // Effective sample rate of the voiced frames
    let sample_rate = match mean_interval(times) {
        Some(dt) if dt > 0.0 => 1.0 / dt,
        _ => return Err(VibratoRejection::NoPeriodicPeak),
    };

    let max_lag = (n / 2).min((MAX_PERIOD_SECS * sample_rate).round() as usize);
    if max_lag < MIN_LAG_WINDOW {
        return Err(VibratoRejection::SearchWindowTooShort { max_lag });
    }

    let offset = mean(&residual);
    let centered: Vec<f64> = residual.iter().map(|r| r - offset).collect();
    let min_energy = n as f64 * MIN_RESIDUAL_RMS_HZ * MIN_RESIDUAL_RMS_HZ;
    let correlation = autocorr::normalized_autocorrelation(&centered, max_lag, min_energy)
        .ok_or(VibratoRejection::NoOscillation)?;

    let lag = autocorr::first_peak_above(&correlation, PEAK_THRESHOLD)
        .ok_or(VibratoRejection::NoPeriodicPeak)?;

    let rate_hz = sample_rate / lag as f64;
    if !(params.min_rate_hz..=params.max_rate_hz).contains(&rate_hz) {
        return Err(VibratoRejection::RateOutOfBand { rate_hz });
    }

    let center = mean(&smoothed);
    let peak = residual.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(center > MIN_CENTER_HZ) || !(peak > 0.0) {
        return Err(VibratoRejection::DegenerateCenter);
    }

    let depth_cents = (1200.0 * (peak / center).log2()).abs();
    if depth_cents < params.min_depth_cents {
        return Err(VibratoRejection::DepthTooShallow { depth_cents });
    }

    let spread = std_dev(&residual);
    let oscillating = residual.iter().filter(|r| r.abs() > spread).count();
    let coverage = 100.0 * oscillating as f64 / n as f64;

    Ok(Vibrato {
        frequency_hz: rate_hz,
        depth_cents,
        coverage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// `frames` contour samples at `rate` Hz around `center` Hz, with a
    /// sinusoidal modulation of `depth` cents at `vibrato_hz`.
    fn sung(center: f64, vibrato_hz: f64, depth: f64, frames: usize, rate: f64) -> (Vec<Option<f64>>, Vec<f64>) {
        let times: Vec<f64> = (0..frames).map(|i| i as f64 / rate).collect();
        let freqs = times
            .iter()
            .map(|t| {
                let cents = depth * (2.0 * PI * vibrato_hz * t).sin();
                Some(center * 2f64.powf(cents / 1200.0))
            })
            .collect();
        (freqs, times)
    }

    #[test]
    fn detects_six_hz_vibrato() {
        let (freqs, times) = sung(300.0, 6.0, 50.0, 200, 100.0);
        let m = detect_vibrato(&freqs, &times, &VibratoParams::default()).unwrap();

        let v = m.vibrato().expect("vibrato should be detected");
        assert!(
            (4.0..=8.0).contains(&v.frequency_hz),
            "Rate should be in the singing band, got {:.2} Hz",
            v.frequency_hz
        );
        assert!((v.frequency_hz - 6.0).abs() < 0.5);
        assert!(v.depth_cents >= 30.0);
        assert!(v.coverage > 0.0 && v.coverage <= 100.0);
    }

    #[test]
    fn unvoiced_gaps_are_skipped() {
        let (mut freqs, mut times) = sung(300.0, 6.0, 50.0, 250, 100.0);
        // Unvoiced frames appended at the end don't disturb the detection
        for i in 0..20 {
            times.push(2.5 + i as f64 * 0.01);
            freqs.push(None);
        }
        let m = detect_vibrato(&freqs, &times, &VibratoParams::default()).unwrap();
        assert!(m.detected());
    }

    #[test]
    fn too_few_frames_never_detect() {
        let (freqs, times) = sung(300.0, 6.0, 50.0, 99, 100.0);
        assert_eq!(freqs.len(), 99);

        let m = detect_vibrato(&freqs, &times, &VibratoParams::default()).unwrap();
        assert_eq!(
            m,
            VibratoMetrics::NotDetected(VibratoRejection::TooFewVoicedFrames {
                found: 99,
                required: 100
            })
        );
        assert_eq!(m.coverage(), 0.0);
        assert!(m.frequency_hz().is_none());
    }

    #[test]
    fn rate_follows_voiced_frame_spacing() {
        // Every other frame unvoiced: 100 voiced frames spaced 20ms apart.
        // The rate must come from that spacing, not the 10ms grid.
        let (mut freqs, times) = sung(300.0, 6.0, 50.0, 200, 100.0);
        for f in freqs.iter_mut().skip(1).step_by(2) {
            *f = None;
        }

        let m = detect_vibrato(&freqs, &times, &VibratoParams::default()).unwrap();
        let rate = m.frequency_hz().expect("vibrato should be detected");
        assert!((rate - 6.0).abs() < 0.5, "Expected ~6 Hz, got {rate:.2}");
    }

    #[test]
    fn steady_tone_has_no_oscillation() {
        let times: Vec<f64> = (0..200).map(|i| i as f64 * 0.01).collect();
        let freqs = vec![Some(300.0); 200];

        let m = detect_vibrato(&freqs, &times, &VibratoParams::default()).unwrap();
        assert_eq!(m, VibratoMetrics::NotDetected(VibratoRejection::NoOscillation));
    }

    #[test]
    fn smooth_glide_has_no_oscillation() {
        let times: Vec<f64> = (0..200).map(|i| i as f64 * 0.01).collect();
        let freqs: Vec<Option<f64>> = times.iter().map(|t| Some(200.0 + 50.0 * t)).collect();

        let m = detect_vibrato(&freqs, &times, &VibratoParams::default()).unwrap();
        assert!(!m.detected());
    }

    #[test]
    fn random_jitter_has_no_periodic_peak() {
        // ±5 Hz of aperiodic wobble from a linear congruential generator
        let mut state: u32 = 12345;
        let times: Vec<f64> = (0..200).map(|i| i as f64 * 0.01).collect();
        let freqs: Vec<Option<f64>> = times
            .iter()
            .map(|_| {
                state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                let unit = (state >> 8) as f64 / (1u32 << 24) as f64;
                Some(300.0 + 10.0 * (unit - 0.5))
            })
            .collect();

        let m = detect_vibrato(&freqs, &times, &VibratoParams::default()).unwrap();
        assert_eq!(m, VibratoMetrics::NotDetected(VibratoRejection::NoPeriodicPeak));
    }

    #[test]
    fn fast_tremolo_is_out_of_band() {
        let (freqs, times) = sung(300.0, 12.0, 50.0, 200, 100.0);
        let m = detect_vibrato(&freqs, &times, &VibratoParams::default()).unwrap();

        match m {
            VibratoMetrics::NotDetected(VibratoRejection::RateOutOfBand { rate_hz }) => {
                assert!(rate_hz > 8.0, "Expected a fast rate, got {rate_hz:.2}");
            }
            other => panic!("Expected rate rejection, got {other:?}"),
        }
    }

    #[test]
    fn widened_band_accepts_tremolo() {
        let (freqs, times) = sung(300.0, 12.0, 50.0, 200, 100.0);
        let params = VibratoParams {
            max_rate_hz: 15.0,
            ..VibratoParams::default()
        };
        assert!(detect_vibrato(&freqs, &times, &params).unwrap().detected());
    }

    #[test]
    fn depth_gate_rejects() {
        let (freqs, times) = sung(300.0, 6.0, 50.0, 200, 100.0);
        let params = VibratoParams {
            min_depth_cents: 1.0e6,
            ..VibratoParams::default()
        };

        let m = detect_vibrato(&freqs, &times, &params).unwrap();
        assert!(matches!(
            m,
            VibratoMetrics::NotDetected(VibratoRejection::DepthTooShallow { .. })
        ));
    }

    #[test]
    fn coarse_sampling_shrinks_search_window() {
        // 16 frames per second: 0.5 s is only 8 lags
        let (freqs, times) = sung(300.0, 3.0, 50.0, 160, 16.0);
        let m = detect_vibrato(&freqs, &times, &VibratoParams::default()).unwrap();
        assert_eq!(
            m,
            VibratoMetrics::NotDetected(VibratoRejection::SearchWindowTooShort { max_lag: 8 })
        );
    }

    #[test]
    fn length_mismatch_is_an_error() {
        let err = detect_vibrato(&[Some(300.0); 3], &[0.0, 0.01], &VibratoParams::default()).unwrap_err();
        assert!(matches!(err, EngineError::ShapeMismatch { .. }));
    }

    #[test]
    fn serializes_flat_layout() {
        let m = VibratoMetrics::Detected(Vibrato {
            frequency_hz: 6.0,
            depth_cents: 45.0,
            coverage: 50.0,
        });
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["detected"], true);
        assert_eq!(json["frequency_hz"], 6.0);
        assert!(json.get("rejection").is_none());

        let back: VibratoMetrics = serde_json::from_value(json).unwrap();
        assert_eq!(back, m);
    }

    #[test]
    fn rejection_serializes_with_nulls() {
        let m = VibratoMetrics::NotDetected(VibratoRejection::NoOscillation);
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["detected"], false);
        assert!(json["frequency_hz"].is_null());
        assert_eq!(json["coverage"], 0.0);
        assert_eq!(json["rejection"]["reason"], "no_oscillation");
    }
}
