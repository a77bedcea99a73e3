use std::f32::consts::PI;

/// Hann window coefficients of length `n`.
///
/// w(i) = 0.5 * (1 - cos(2π * i / (n - 1)))
///
/// Zero at both edges, 1.0 at the center of an odd-length window.
pub fn hann(n: usize) -> Vec<f32> {
    if n <= 1 {
        return vec![1.0; n];
    }

    let scale = 2.0 * PI / (n - 1) as f32;
    (0..n)
        .map(|i| 0.5 * (1.0 - (scale * i as f32).cos()))
        .collect()
}

/// Taper a frame with a Hann window before pitch detection, so the
/// detector doesn't see the abrupt cut at the frame edges.
pub fn hanning(samples: &[f32]) -> Vec<f32> {
    samples
        .iter()
        .zip(hann(samples.len()))
        .map(|(&s, w)| s * w)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_edges_and_center() {
        let w = hann(101);
        assert!(w[0].abs() < 1e-6);
        assert!(w[100].abs() < 1e-6);
        assert!((w[50] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn window_is_symmetric() {
        let w = hann(64);
        for i in 0..32 {
            assert!((w[i] - w[63 - i]).abs() < 1e-6, "Asymmetry at index {i}");
        }
    }

    #[test]
    fn tapering_keeps_length_and_silence() {
        let windowed = hanning(&[0.0; 50]);
        assert_eq!(windowed.len(), 50);
        assert!(windowed.iter().all(|&s| s == 0.0));
    }

    #[test]
    fn degenerate_lengths() {
        assert!(hanning(&[]).is_empty());
        assert_eq!(hanning(&[0.5]), vec![0.5]);
    }
}
