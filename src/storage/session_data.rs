use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analysis::report::ScoreReport;

/// One scored performance of a song.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    pub song_id: String,
    pub song_title: String,
    /// ISO-8601 time the performance was scored.
    pub timestamp: String,
    pub score: f64,
    /// Percent of frames within tolerance.
    pub accuracy: f64,
    /// 0-1
    pub stability: f64,
    /// Seconds
    pub duration: f64,
    /// Feedback text by category.
    #[serde(default)]
    pub notes: BTreeMap<String, String>,
}

impl SessionResult {
    /// Summarize a report for the history.
    pub fn from_report(song_id: &str, song_title: &str, timestamp: String, report: &ScoreReport) -> Self {
        Self {
            song_id: song_id.to_string(),
            song_title: song_title.to_string(),
            timestamp,
            score: report.total_score,
            accuracy: report.pitch_metrics.accuracy,
            stability: report.pitch_metrics.stability,
            duration: report.duration,
            notes: report
                .notes
                .entries()
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }
}

/// All performances of one user on one day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub username: String,
    pub start_time: String,
    pub results: Vec<SessionResult>,
}

impl Session {
    pub fn average_score(&self) -> f64 {
        average(self.results.iter().map(|r| r.score))
    }

    pub fn average_accuracy(&self) -> f64 {
        average(self.results.iter().map(|r| r.accuracy))
    }
}

/// One line of the session listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub username: String,
    pub start_time: String,
    pub num_songs: usize,
    pub average_score: f64,
    pub average_accuracy: f64,
}

/// Lifetime numbers for one user. All zero without history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserStats {
    pub username: String,
    pub total_sessions: usize,
    pub total_songs: usize,
    pub average_score: f64,
    pub average_accuracy: f64,
    pub best_score: f64,
    pub worst_score: f64,
}

impl UserStats {
    pub fn empty(username: &str) -> Self {
        Self {
            username: username.to_string(),
            total_sessions: 0,
            total_songs: 0,
            average_score: 0.0,
            average_accuracy: 0.0,
            best_score: 0.0,
            worst_score: 0.0,
        }
    }
}

/// Per-song aggregate for the top songs listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SongStats {
    pub song_id: String,
    pub song_title: String,
    pub attempts: usize,
    pub avg_score: f64,
    pub best_score: f64,
}

fn average(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
