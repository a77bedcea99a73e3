use find_peaks::PeakFinder;
use rustfft::{num_complex::Complex, FftPlanner};

/// Autocorrelation of a zero-meaned signal for lags `0..max_lag`, computed
/// through the FFT (Wiener–Khinchin): r = IFFT(|FFT(x)|²).
///
/// The signal is zero-padded to at least twice its length so the result is
/// the linear (not circular) correlation:
///   r[k] = Σ x[i] * x[i + k]
///
/// Values are raw sums, not normalized.
pub fn autocorrelation(signal: &[f64], max_lag: usize) -> Vec<f64> {
    let n = signal.len();
    let max_lag = max_lag.min(n);
    if n == 0 || max_lag == 0 {
        return Vec::new();
    }

    let fft_size = (2 * n).next_power_of_two();

    let mut planner = FftPlanner::new();
    let forward = planner.plan_fft_forward(fft_size);
    let inverse = planner.plan_fft_inverse(fft_size);

    let mut buffer: Vec<Complex<f64>> = signal
        .iter()
        .map(|&x| Complex::new(x, 0.0))
        .chain(std::iter::repeat(Complex::new(0.0, 0.0)))
        .take(fft_size)
        .collect();

    forward.process(&mut buffer);
    for c in buffer.iter_mut() {
        *c = Complex::new(c.norm_sqr(), 0.0);
    }
    inverse.process(&mut buffer);

    // rustfft doesn't normalize the inverse transform
    let scale = 1.0 / fft_size as f64;
    buffer[..max_lag].iter().map(|c| c.re * scale).collect()
}

/// Autocorrelation scaled so lag 0 equals 1.0.
///
/// Returns None when the signal has no energy (lag 0 is zero or below
/// `min_energy`), since the normalization is meaningless then.
pub fn normalized_autocorrelation(signal: &[f64], max_lag: usize, min_energy: f64) -> Option<Vec<f64>> {
    let raw = autocorrelation(signal, max_lag);
    let energy = *raw.first()?;
    if !(energy > min_energy) {
        return None;
    }
    Some(raw.iter().map(|r| r / energy).collect())
}

/// Lag of the first local maximum strictly above `threshold`.
///
/// Flat-topped peaks report the middle of the plateau. The first and last
/// samples are never peaks, so lag 0 of an autocorrelation can't win.
pub fn first_peak_above(values: &[f64], threshold: f64) -> Option<usize> {
    let last = values.len().checked_sub(1)?;

    let mut finder = PeakFinder::new(values);
    finder.with_min_height(threshold);

    finder
        .find_peaks()
        .iter()
        .map(|p| p.middle_position())
        .filter(|&i| i > 0 && i < last && values[i] > threshold)
        .min()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    /// Direct O(n·lag) correlation to check the FFT path against.
    fn direct(signal: &[f64], max_lag: usize) -> Vec<f64> {
        (0..max_lag)
            .map(|k| {
                signal[..signal.len() - k]
                    .iter()
                    .zip(&signal[k..])
                    .map(|(a, b)| a * b)
                    .sum()
            })
            .collect()
    }

    #[test]
    fn fft_matches_direct_sum() {
        let signal: Vec<f64> = (0..137)
            .map(|i| (i as f64 * 0.37).sin() + 0.25 * (i as f64 * 1.3).cos())
            .collect();

        let fast = autocorrelation(&signal, 60);
        let slow = direct(&signal, 60);
        assert_eq!(fast.len(), 60);
        for (k, (f, s)) in fast.iter().zip(&slow).enumerate() {
            assert!((f - s).abs() < 1e-8, "Lag {k}: fft={f}, direct={s}");
        }
    }

    #[test]
    fn normalized_lag_zero_is_one() {
        let signal: Vec<f64> = (0..100).map(|i| (2.0 * PI * i as f64 / 20.0).sin()).collect();
        let r = normalized_autocorrelation(&signal, 50, 0.0).unwrap();
        assert!((r[0] - 1.0).abs() < 1e-12);
        assert!(r.iter().all(|v| *v <= 1.0 + 1e-12));
    }

    #[test]
    fn sinusoid_peaks_at_its_period() {
        // Period of 20 samples → first autocorrelation peak at lag 20
        let signal: Vec<f64> = (0..200).map(|i| (2.0 * PI * i as f64 / 20.0).sin()).collect();
        let r = normalized_autocorrelation(&signal, 100, 0.0).unwrap();
        assert_eq!(first_peak_above(&r, 0.3), Some(20));
    }

    #[test]
    fn silent_signal_has_no_normalization() {
        assert!(normalized_autocorrelation(&[0.0; 64], 32, 0.0).is_none());
        assert!(normalized_autocorrelation(&[], 32, 0.0).is_none());
    }

    #[test]
    fn max_lag_is_clamped_to_length() {
        assert_eq!(autocorrelation(&[1.0, 2.0, 3.0], 10).len(), 3);
    }

    #[test]
    fn plateau_reports_its_middle() {
        let values = [0.0, 0.2, 0.0, 2.0, 2.0, 2.0, 1.0, 3.0];
        // Index 1 is below the threshold, indices 3-5 a plateau (middle = 4),
        // the last sample is an edge and never counts.
        assert_eq!(first_peak_above(&values, 0.3), Some(4));
    }

    #[test]
    fn edges_are_not_peaks() {
        assert_eq!(first_peak_above(&[0.0, 1.0, 2.0, 3.0], 0.3), None);
        assert_eq!(first_peak_above(&[3.0, 2.0, 1.0, 0.0], 0.3), None);
        assert_eq!(first_peak_above(&[], 0.3), None);
    }

    #[test]
    fn threshold_skips_low_peaks() {
        let values = [1.0, 0.1, 0.2, 0.1, 0.5, 0.1];
        assert_eq!(first_peak_above(&values, 0.3), Some(4));
        assert_eq!(first_peak_above(&values, 0.6), None);
    }

    #[test]
    fn earliest_peak_wins_over_tallest() {
        let values = [1.0, 0.0, 0.4, 0.0, 0.9, 0.0];
        assert_eq!(first_peak_above(&values, 0.3), Some(2));
    }
}
