//! Console rendering of reports and history.

use console::{style, StyledObject};

use crate::analysis::report::ScoreReport;
use crate::analysis::vibrato::{VibratoMetrics, VibratoRejection};
use crate::storage::session_data::{Session, SessionSummary, SongStats, UserStats};

/// Print a full score report.
pub fn print_report(title: &str, report: &ScoreReport) {
    println!("{}", style(format!("=== {title} ===")).bold());
    println!();
    println!(
        "  Score:      {} / 100",
        score_style(report.total_score, format!("{:.1}", report.total_score)).bold()
    );
    println!("  Duration:   {:.1}s", report.duration);
    println!();

    let p = &report.pitch_metrics;
    println!("{}", style("  Pitch").bold());
    println!("    Accuracy:   {:.1}%", p.accuracy);
    println!("    Stability:  {:.2}", p.stability);
    println!("    Mean error: {}", format_hz(p.mean_error_hz));
    println!("    Error std:  {}", format_hz(p.std_error_hz));
    println!("    Compared:   {} of {} frames", p.voiced_frames, p.total_frames);
    println!();

    println!("{}", style("  Vibrato").bold());
    match &report.vibrato_metrics {
        VibratoMetrics::Detected(v) => {
            println!("    Rate:       {:.1} Hz", v.frequency_hz);
            println!("    Depth:      {:.0} cents", v.depth_cents);
            println!("    Coverage:   {:.0}%", v.coverage);
        }
        VibratoMetrics::NotDetected(reason) => {
            println!("    {}", style(rejection_text(reason)).dim());
        }
    }
    println!();

    println!("{}", style("  Feedback").bold());
    for (_, text) in report.notes.entries() {
        println!("    {} {text}", style("•").cyan());
    }
}

/// Print the quick score on its own.
pub fn print_quick_score(score: f64) {
    println!(
        "Quick score: {} / 100",
        score_style(score, format!("{score:.1}")).bold()
    );
}

pub fn print_sessions(sessions: &[SessionSummary]) {
    if sessions.is_empty() {
        println!("No sessions recorded yet.");
        return;
    }

    println!(
        "  {:<28} {:>6} {:>10} {:>10}",
        style("Session").bold(),
        style("Songs").bold(),
        style("Avg score").bold(),
        style("Avg acc.").bold()
    );
    for s in sessions {
        println!(
            "  {:<28} {:>6} {:>10} {:>9.1}%",
            style(&s.session_id).cyan(),
            s.num_songs,
            score_style(s.average_score, format!("{:.1}", s.average_score)),
            s.average_accuracy
        );
    }
}

pub fn print_session(session: &Session) {
    println!(
        "{} {}  (started {})",
        style("Session").bold(),
        style(&session.session_id).cyan(),
        session.start_time
    );
    println!();
    for r in &session.results {
        println!(
            "  {:<30} {:>8}  acc {:>5.1}%  stab {:.2}  {:.1}s",
            r.song_title,
            score_style(r.score, format!("{:.1}", r.score)),
            r.accuracy,
            r.stability,
            r.duration
        );
    }
    println!();
    println!(
        "  Average score {:.1}, average accuracy {:.1}%",
        session.average_score(),
        session.average_accuracy()
    );
}

pub fn print_stats(stats: &UserStats) {
    println!("{} {}", style("Statistics for").bold(), style(&stats.username).cyan());
    println!();
    if stats.total_songs == 0 {
        println!("  No performances recorded yet.");
        return;
    }
    println!("  Sessions:       {}", stats.total_sessions);
    println!("  Songs sung:     {}", stats.total_songs);
    println!("  Average score:  {:.1}", stats.average_score);
    println!("  Average acc.:   {:.1}%", stats.average_accuracy);
    println!(
        "  Best / worst:   {} / {}",
        score_style(stats.best_score, format!("{:.1}", stats.best_score)),
        score_style(stats.worst_score, format!("{:.1}", stats.worst_score))
    );
}

pub fn print_top_songs(username: &str, songs: &[SongStats]) {
    println!("{} {}", style("Top songs for").bold(), style(username).cyan());
    println!();
    if songs.is_empty() {
        println!("  No performances recorded yet.");
        return;
    }
    for (rank, s) in songs.iter().enumerate() {
        println!(
            "  {:>2}. {:<30} best {:>8}  avg {:>5.1}  ({} attempt{})",
            rank + 1,
            s.song_title,
            score_style(s.best_score, format!("{:.1}", s.best_score)),
            s.avg_score,
            s.attempts,
            if s.attempts == 1 { "" } else { "s" }
        );
    }
}

/// Green for strong scores, yellow for middling, red below 60.
fn score_style(score: f64, text: String) -> StyledObject<String> {
    if score >= 75.0 {
        style(text).green()
    } else if score >= 60.0 {
        style(text).yellow()
    } else {
        style(text).red()
    }
}

fn format_hz(value: Option<f64>) -> String {
    match value {
        Some(hz) => format!("{hz:.1} Hz"),
        None => "n/a".into(),
    }
}

fn rejection_text(reason: &VibratoRejection) -> String {
    match reason {
        VibratoRejection::TooFewVoicedFrames { found, required } => {
            format!("Not detected: {found} voiced frames, need {required}")
        }
        VibratoRejection::SearchWindowTooShort { max_lag } => {
            format!("Not detected: contour too short to search ({max_lag} lags)")
        }
        VibratoRejection::NoOscillation => "Not detected: pitch is perfectly smooth".into(),
        VibratoRejection::NoPeriodicPeak => "Not detected: no periodic modulation".into(),
        VibratoRejection::RateOutOfBand { rate_hz } => {
            format!("Not detected: modulation at {rate_hz:.1} Hz is outside the vibrato band")
        }
        VibratoRejection::DepthTooShallow { depth_cents } => {
            format!("Not detected: modulation too shallow ({depth_cents:.0} cents)")
        }
        VibratoRejection::DegenerateCenter => "Not detected: no usable center pitch".into(),
    }
}
