//! The three entry points the application uses.
//!
//! Everything here is a pure function over its inputs: no I/O, no shared
//! state, safe to call from any thread.

use super::report::ScoreReport;
use super::scoring::{self, AnalysisParams, BaseScorer};
use crate::error::EngineError;

pub use super::align::align;

/// Full analysis of a performance already aligned onto `times`.
///
/// The base score is the cents accuracy percentage.
pub fn analyze(
    user: &[Option<f64>],
    target: &[Option<f64>],
    times: &[f64],
    params: &AnalysisParams,
) -> Result<ScoreReport, EngineError> {
    scoring::score(user, target, times, None, params)
}

/// Like [`analyze`], with the base score supplied by `scorer`.
pub fn analyze_with_scorer(
    user: &[Option<f64>],
    target: &[Option<f64>],
    times: &[f64],
    scorer: &dyn BaseScorer,
    params: &AnalysisParams,
) -> Result<ScoreReport, EngineError> {
    scoring::score(user, target, times, Some(scorer), params)
}

/// The cheap mean-Hz-error score on its own, 0-100.
pub fn quick_score(user: &[Option<f64>], target: &[Option<f64>]) -> Result<f64, EngineError> {
    scoring::quick_score(user, target)
}
