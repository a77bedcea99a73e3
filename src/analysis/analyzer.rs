use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use super::align::{align_contour, Alignment};
use super::engine;
use super::report::ScoreReport;
use super::scoring::{AnalysisParams, MeanErrorScorer};
use crate::audio::wav;
use crate::config::{AppConfig, BaseScore};
use crate::dsp::contour::Contour;
use crate::dsp::pitch::{FrequencyDetector, McLeodContourDetector, PitchConfig};
use crate::storage::contour_file;
use crate::storage::session_data::SessionResult;
use crate::storage::store;
use crate::util;

/// Recordings longer than this get a spinner while pitch detection runs.
const SPINNER_MIN_SECS: f64 = 5.0;

/// Runs the whole pipeline for the CLI: decode, detect, align, score.
///
/// Status lines go to stderr so stdout only ever carries the report.
pub struct Analyzer<D = McLeodContourDetector> {
    detector: D,
    params: AnalysisParams,
    base: BaseScore,
}

impl Analyzer {
    pub fn from_config(config: &AppConfig) -> Self {
        let pitch: PitchConfig = (&config.detection).into();
        Self::new(McLeodContourDetector::new(pitch), (&config.analysis).into(), config.scoring.base)
    }
}

impl<D: FrequencyDetector> Analyzer<D> {
    pub fn new(detector: D, params: AnalysisParams, base: BaseScore) -> Self {
        Self { detector, params, base }
    }

    /// Contour from either a JSON contour file or a WAV recording.
    pub fn load_contour(&self, path: &Path) -> Result<Contour> {
        if is_contour_file(path) {
            let contour = contour_file::load_contour(path)?;
            eprintln!(
                "  {} {} ({} frames)",
                style(">>").cyan(),
                path.display(),
                contour.len()
            );
            return Ok(contour);
        }
        self.detect_file(path)
    }

    /// Decode a WAV file and run pitch detection on it.
    pub fn detect_file(&self, path: &Path) -> Result<Contour> {
        let audio = wav::load_samples(path).with_context(|| format!("Failed to load {}", path.display()))?;

        eprintln!(
            "  {} {}: {:.1}s, {} Hz",
            style(">>").cyan(),
            path.display(),
            audio.duration_secs(),
            audio.sample_rate
        );
        if audio.channels > 1 {
            info!(channels = audio.channels, "downmixed to mono");
        }
        if util::is_silent(&audio.samples) {
            warn!(
                path = %path.display(),
                rms_db = util::rms_db(&audio.samples),
                peak_db = util::peak_db(&audio.samples),
                "recording looks silent"
            );
        }

        let spinner = (audio.duration_secs() > SPINNER_MIN_SECS).then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::with_template("  {spinner:.green} Detecting pitch {elapsed_precise}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.enable_steady_tick(Duration::from_millis(100));
            pb
        });

        let contour = self.detector.detect(&audio.samples, audio.sample_rate);

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        eprintln!(
            "     Voiced: {:.0}% of {} frames",
            contour.voiced_fraction() * 100.0,
            contour.len()
        );
        Ok(contour)
    }

    /// Resample `source` onto the time grid of `grid`.
    pub fn align_to(&self, source: &Contour, grid: &Contour) -> Result<Contour> {
        if source.shares_grid_with(grid) {
            return Ok(source.clone());
        }

        let alignment = align_contour(source.times(), source.frequencies(), grid.times())?;
        if let Alignment::Insufficient { voiced_points, .. } = alignment {
            warn!(voiced_points, "too little voiced pitch to align, treating the take as silent");
        }
        Ok(grid.with_frequencies(alignment.into_frequencies())?)
    }

    /// Full report for a performance against a reference.
    pub fn score(&self, user_path: &Path, reference_path: &Path) -> Result<ScoreReport> {
        let (user, reference) = self.load_pair(user_path, reference_path)?;
        self.score_contours(&user, &reference)
    }

    pub fn score_contours(&self, user: &Contour, reference: &Contour) -> Result<ScoreReport> {
        let aligned = self.align_to(user, reference)?;

        let report = match self.base {
            BaseScore::Accuracy => engine::analyze(
                aligned.frequencies(),
                reference.frequencies(),
                reference.times(),
                &self.params,
            )?,
            BaseScore::MeanError => engine::analyze_with_scorer(
                aligned.frequencies(),
                reference.frequencies(),
                reference.times(),
                &MeanErrorScorer,
                &self.params,
            )?,
        };

        info!(total_score = report.total_score, "analysis complete");
        Ok(report)
    }

    /// Just the quick mean-error score.
    pub fn quick_score(&self, user_path: &Path, reference_path: &Path) -> Result<f64> {
        let (user, reference) = self.load_pair(user_path, reference_path)?;
        let aligned = self.align_to(&user, &reference)?;
        Ok(engine::quick_score(aligned.frequencies(), reference.frequencies())?)
    }

    fn load_pair(&self, user_path: &Path, reference_path: &Path) -> Result<(Contour, Contour)> {
        let reference = self
            .load_contour(reference_path)
            .context("Failed to load reference melody")?;
        let user = self.load_contour(user_path).context("Failed to load performance")?;

        if reference.voiced_count() == 0 {
            anyhow::bail!("Reference {} has no voiced frames", reference_path.display());
        }
        Ok((user, reference))
    }
}

/// Song identifier derived from the reference file name.
pub fn song_id_for(reference_path: &Path) -> String {
    reference_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("unknown")
        .to_string()
}

/// Store the report in today's session for `username`.
pub fn save_to_history(report: &ScoreReport, song_id: &str, song_title: &str, username: &str) -> Result<String> {
    let now = chrono::Local::now();
    let result = SessionResult::from_report(song_id, song_title, util::timestamp(&now), report);
    store::save_result(username, now.date_naive(), &result)
}

fn is_contour_file(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"))
}
