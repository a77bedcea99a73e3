use chrono::{DateTime, Local, NaiveDate};

/// Below this RMS level a recording is treated as silence.
pub const SILENCE_RMS_DB: f32 = -60.0;

/// History key for one user's performances on one day: `{username}_{YYYYMMDD}`.
pub fn session_key(username: &str, date: NaiveDate) -> String {
    format!("{username}_{}", date.format("%Y%m%d"))
}

/// ISO-8601 timestamp with local offset, e.g. `2026-03-01T19:04:11+01:00`.
pub fn timestamp(at: &DateTime<Local>) -> String {
    at.to_rfc3339_opts(chrono::SecondsFormat::Secs, false)
}

/// Compute peak amplitude in dB (relative to full scale).
/// Returns -infinity for all-zero input.
pub fn peak_db(samples: &[f32]) -> f32 {
    let peak = samples.iter().fold(0.0_f32, |max, &s| max.max(s.abs()));

    if peak == 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * peak.log10()
    }
}

/// Compute RMS level in dB (relative to full scale).
/// Returns -infinity for all-zero input.
pub fn rms_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return f32::NEG_INFINITY;
    }

    let sum_sq: f32 = samples.iter().map(|&s| s * s).sum();
    let rms = (sum_sq / samples.len() as f32).sqrt();

    if rms == 0.0 {
        f32::NEG_INFINITY
    } else {
        20.0 * rms.log10()
    }
}

/// True when a recording is too quiet to carry any pitch.
pub fn is_silent(samples: &[f32]) -> bool {
    rms_db(samples) < SILENCE_RMS_DB
}
