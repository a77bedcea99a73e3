use thiserror::Error;

/// Contract violations raised by the analysis engine.
///
/// These are the only fatal outcomes of the engine. "Not enough signal"
/// situations (too few voiced frames, no overlap, no vibrato) are not errors;
/// they come back as well-formed degraded results instead.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("shape mismatch: {what} has {actual} entries, expected {expected}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("malformed time grid at index {index}: {reason}")]
    MalformedTimeGrid { index: usize, reason: &'static str },
}

impl EngineError {
    pub(crate) fn shape(what: &'static str, expected: usize, actual: usize) -> Self {
        Self::ShapeMismatch {
            what,
            expected,
            actual,
        }
    }
}

/// Fail with `ShapeMismatch` unless `actual == expected`.
pub(crate) fn ensure_len(what: &'static str, expected: usize, actual: usize) -> Result<(), EngineError> {
    if expected == actual {
        Ok(())
    } else {
        Err(EngineError::shape(what, expected, actual))
    }
}

/// Check that a time grid is finite and strictly increasing.
pub(crate) fn ensure_time_grid(times: &[f64]) -> Result<(), EngineError> {
    for (index, &t) in times.iter().enumerate() {
        if !t.is_finite() {
            return Err(EngineError::MalformedTimeGrid {
                index,
                reason: "time is not finite",
            });
        }
        if index > 0 && t <= times[index - 1] {
            return Err(EngineError::MalformedTimeGrid {
                index,
                reason: "times must be strictly increasing",
            });
        }
    }
    Ok(())
}
