use anyhow::Result;
use chrono::NaiveDate;

use super::db;
use super::session_data::{Session, SessionResult, SessionSummary, SongStats, UserStats};

/// Record a performance in the history database.
pub fn save_result(username: &str, date: NaiveDate, result: &SessionResult) -> Result<String> {
    let conn = db::open_db()?;
    db::save_result(&conn, username, date, result)
}

/// Load a session by key (`{username}_{YYYYMMDD}`).
pub fn load_session(session_key: &str) -> Result<Session> {
    let conn = db::open_db()?;
    db::load_session(&conn, session_key)
}

/// List sessions, optionally for one user.
pub fn list_sessions(username: Option<&str>) -> Result<Vec<SessionSummary>> {
    let conn = db::open_db()?;
    db::list_sessions(&conn, username)
}

pub fn user_stats(username: &str) -> Result<UserStats> {
    let conn = db::open_db()?;
    db::user_stats(&conn, username)
}

pub fn top_songs(username: &str, limit: usize) -> Result<Vec<SongStats>> {
    let conn = db::open_db()?;
    db::top_songs(&conn, username, limit)
}
