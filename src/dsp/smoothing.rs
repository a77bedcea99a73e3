use nalgebra::{DMatrix, DVector};

/// Savitzky–Golay smoothing: fit a polynomial to each window of samples by
/// least squares and keep the fitted value.
///
/// Interior samples use the fit centered on them. The first and last
/// `window / 2` samples are taken from the polynomial fitted to the first
/// and last full window, so the output has no shrunken edges and
/// polynomials up to `degree` pass through unchanged.
///
/// Returns None when the parameters can't produce a fit: even or zero
/// window, `degree >= window`, or a signal shorter than the window.
pub fn savitzky_golay(signal: &[f64], window: usize, degree: usize) -> Option<Vec<f64>> {
    if window == 0 || window % 2 == 0 || degree >= window || signal.len() < window {
        return None;
    }

    let half = window / 2;
    let projection = fit_projection(window, degree)?;
    let n = signal.len();
    let mut smoothed = vec![0.0; n];

    // Interior: the fitted value at offset 0 is a fixed linear combination
    // of the window samples (the first row of the projection).
    for center in half..n - half {
        let start = center - half;
        smoothed[center] = projection
            .row(0)
            .iter()
            .zip(&signal[start..start + window])
            .map(|(w, y)| w * y)
            .sum();
    }

    // Edges: evaluate the polynomial fitted to the outermost window.
    let head = fit_window(&projection, &signal[..window]);
    for (i, value) in smoothed.iter_mut().enumerate().take(half) {
        *value = eval_poly(&head, i as f64 - half as f64);
    }

    let tail = fit_window(&projection, &signal[n - window..]);
    for i in window - half..window {
        smoothed[n - window + i] = eval_poly(&tail, i as f64 - half as f64);
    }

    Some(smoothed)
}

/// Window length for contour smoothing: about half the number of samples,
/// forced odd, capped at `max_window`.
pub fn smoothing_window(len: usize, max_window: usize) -> usize {
    ((len / 2) | 1).min(max_window)
}

/// The least-squares projection P = (AᵀA)⁻¹Aᵀ for a window centered on 0,
/// where A[i][j] = (i - half)^j. Row j of P maps window samples to the
/// j-th polynomial coefficient.
fn fit_projection(window: usize, degree: usize) -> Option<DMatrix<f64>> {
    let half = window as f64 / 2.0 - 0.5;
    let design = DMatrix::from_fn(window, degree + 1, |i, j| (i as f64 - half).powi(j as i32));

    let normal = design.transpose() * &design;
    let inverse = normal.try_inverse()?;

    Some(inverse * design.transpose())
}

fn fit_window(projection: &DMatrix<f64>, samples: &[f64]) -> DVector<f64> {
    projection * DVector::from_column_slice(samples)
}

/// Horner evaluation of Σ c_j x^j.
fn eval_poly(coefficients: &DVector<f64>, x: f64) -> f64 {
    coefficients.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}
