//! Sung performance scoring.
//!
//! The heart of the crate is [`analysis::engine`]: align a singer's pitch
//! contour onto a reference melody's time grid, then score it for pitch
//! accuracy, steadiness and vibrato. Everything around it (WAV decoding,
//! pitch detection, config, history, console output) supports the
//! `singscore` binary.

pub mod analysis;
pub mod audio;
pub mod config;
pub mod dsp;
pub mod error;
pub mod logging;
pub mod paths;
pub mod report;
pub mod storage;
pub mod util;

pub use analysis::engine::{align, analyze, analyze_with_scorer, quick_score};
pub use analysis::report::{Feedback, ScoreReport};
pub use analysis::scoring::{AnalysisParams, BaseScorer};
pub use dsp::contour::Contour;
pub use error::EngineError;
