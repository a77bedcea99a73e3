use pitch_detection::detector::mcleod::McLeodDetector;
use pitch_detection::detector::PitchDetector;
use tracing::debug;

use super::contour::Contour;
use super::windowing;

/// Configuration for pitch extraction.
#[derive(Debug, Clone)]
pub struct PitchConfig {
    /// Minimum detectable frequency in Hz.
    /// 50 Hz sits below the lowest sung bass notes.
    pub pitch_floor_hz: f64,

    /// Maximum detectable frequency in Hz.
    pub pitch_ceiling_hz: f64,

    /// Analysis window duration in milliseconds.
    pub frame_size_ms: f64,

    /// How far to advance between frames, in milliseconds.
    /// 10ms hop gives 100 frames per second, plenty for vibrato analysis.
    pub hop_size_ms: f64,

    /// McLeod power threshold: filters out low-energy frames (noise).
    pub power_threshold: f64,

    /// McLeod clarity threshold: how "confident" the detector must be.
    /// Range 0.0-1.0. Frames below it are reported unvoiced.
    pub clarity_threshold: f64,
}

impl Default for PitchConfig {
    fn default() -> Self {
        Self {
            pitch_floor_hz: 50.0,
            pitch_ceiling_hz: 2000.0,
            frame_size_ms: 30.0,
            hop_size_ms: 10.0,
            power_threshold: 0.2,
            clarity_threshold: 0.5,
        }
    }
}

/// A single point in a pitch contour: a timestamp and an optional frequency.
/// `None` means the frame was unvoiced (no detectable pitch).
#[derive(Debug, Clone, PartialEq)]
pub struct PitchFrame {
    /// Time in seconds from the start of the audio.
    pub time: f64,

    /// Detected fundamental frequency, or None if unvoiced.
    pub frequency: Option<f64>,
}

/// Anything that turns raw audio into a pitch contour.
///
/// The analysis engine never looks inside the detector; any implementation
/// producing strictly increasing frame times works. Tests plug in fakes.
pub trait FrequencyDetector {
    fn detect(&self, samples: &[f32], sample_rate: u32) -> Contour;
}

/// Frequency detection with the McLeod Pitch Method.
#[derive(Debug, Clone, Default)]
pub struct McLeodContourDetector {
    pub config: PitchConfig,
}

impl McLeodContourDetector {
    pub fn new(config: PitchConfig) -> Self {
        Self { config }
    }
}

impl FrequencyDetector for McLeodContourDetector {
    fn detect(&self, samples: &[f32], sample_rate: u32) -> Contour {
        let frames = extract_pitch_contour(samples, sample_rate, &self.config);
        let contour = Contour::from_frames(&frames);
        debug!(
            frames = contour.len(),
            voiced = contour.voiced_count(),
            sample_rate,
            "extracted pitch contour"
        );
        contour
    }
}

/// Extract a pitch contour from audio samples.
///
/// This slides a window across the audio, runs the McLeod pitch detector on
/// each frame, and returns a sequence of (time, optional_frequency) pairs.
///
/// The McLeod Pitch Method works by computing a normalized autocorrelation
/// of the signal: comparing the signal with shifted copies of itself to
/// find the period of repetition. It's robust to harmonics and works well
/// with voice.
pub fn extract_pitch_contour(
    samples: &[f32],
    sample_rate: u32,
    config: &PitchConfig,
) -> Vec<PitchFrame> {
    let sr = sample_rate as f64;

    // Convert milliseconds to samples.
    // e.g., 30ms at 44100 Hz = 1323 samples
    let frame_size = (config.frame_size_ms / 1000.0 * sr) as usize;
    let hop_size = ((config.hop_size_ms / 1000.0 * sr) as usize).max(1);

    // The detector needs at least 2 full cycles of the lowest frequency.
    // At 50 Hz and 44100 Hz: period = 882 samples, 2x = 1764, rounded up
    // to the next power of 2 for FFT efficiency.
    let min_buffer = (2.0 * sr / config.pitch_floor_hz).ceil() as usize;
    let detector_size = min_buffer.next_power_of_two().max(frame_size);
    let padding = detector_size / 2;

    let mut detector = McLeodDetector::new(detector_size, padding);
    let mut contour = Vec::new();
    let mut pos = 0;

    while pos + detector_size <= samples.len() {
        let time = pos as f64 / sr;

        let windowed = windowing::hanning(&samples[pos..pos + detector_size]);
        let signal: Vec<f64> = windowed.iter().map(|&s| s as f64).collect();

        let pitch = detector.get_pitch(
            &signal,
            sample_rate as usize,
            config.power_threshold,
            config.clarity_threshold,
        );

        // Only accept pitches within the expected range.
        let frequency = pitch
            .map(|p| p.frequency)
            .filter(|&f| f >= config.pitch_floor_hz && f <= config.pitch_ceiling_hz);

        contour.push(PitchFrame { time, frequency });

        pos += hop_size;
    }

    contour
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    /// Generate a pure sine wave at a known frequency.
    fn sine_wave(freq_hz: f32, sample_rate: u32, duration_secs: f32) -> Vec<f32> {
        let num_samples = (sample_rate as f32 * duration_secs) as usize;
        (0..num_samples)
            .map(|i| {
                let t = i as f32 / sample_rate as f32;
                0.5 * (2.0 * PI * freq_hz * t).sin()
            })
            .collect()
    }

    fn mean_voiced(contour: &Contour) -> f64 {
        let voiced: Vec<f64> = contour.frequencies().iter().filter_map(|f| *f).collect();
        assert!(!voiced.is_empty(), "Expected voiced frames");
        voiced.iter().sum::<f64>() / voiced.len() as f64
    }

    #[test]
    fn detects_a4_sine() {
        let samples = sine_wave(440.0, 44100, 0.5);
        let contour = McLeodContourDetector::default().detect(&samples, 44100);

        let mean = mean_voiced(&contour);
        assert!(
            (mean - 440.0).abs() < 5.0,
            "Mean pitch should be ~440 Hz, got {mean:.1} Hz"
        );
    }

    #[test]
    fn detects_low_sung_note() {
        let samples = sine_wave(110.0, 44100, 1.0);
        let contour = McLeodContourDetector::default().detect(&samples, 44100);

        let mean = mean_voiced(&contour);
        assert!(
            (mean - 110.0).abs() < 3.0,
            "Mean pitch should be ~110 Hz, got {mean:.1} Hz"
        );
    }

    #[test]
    fn silence_is_unvoiced() {
        let samples = vec![0.0; 44100];
        let contour = McLeodContourDetector::default().detect(&samples, 44100);

        assert!(!contour.is_empty());
        assert!(
            contour.voiced_fraction() < 0.1,
            "Silence should be mostly unvoiced, got {:.2}",
            contour.voiced_fraction()
        );
    }

    #[test]
    fn contour_timestamps_increase() {
        let samples = sine_wave(220.0, 44100, 0.5);
        let frames = extract_pitch_contour(&samples, 44100, &PitchConfig::default());

        for pair in frames.windows(2) {
            assert!(
                pair[1].time > pair[0].time,
                "Timestamps should be strictly increasing"
            );
        }
    }

    #[test]
    fn hop_sets_frame_rate() {
        let samples = sine_wave(220.0, 44100, 1.0);
        let frames = extract_pitch_contour(&samples, 44100, &PitchConfig::default());

        // 10ms hop: consecutive frames are 441 samples apart
        let dt = frames[1].time - frames[0].time;
        assert!((dt - 0.01).abs() < 1e-9, "Expected 10ms hop, got {dt}");
    }

    #[test]
    fn too_short_input_yields_empty_contour() {
        let samples = vec![0.1; 100];
        let frames = extract_pitch_contour(&samples, 44100, &PitchConfig::default());
        assert!(frames.is_empty());
    }
}
