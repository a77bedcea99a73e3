use anyhow::{Context, Result};
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension};
use tracing::debug;

use super::session_data::*;
use crate::util;

/// Open (or create) the SQLite database at the configured path.
pub fn open_db() -> Result<Connection> {
    let path = crate::paths::db_path();

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let conn = Connection::open(&path)
        .with_context(|| format!("Failed to open database: {}", path.display()))?;

    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
        .context("Failed to set database pragmas")?;

    init_schema(&conn)?;
    Ok(conn)
}

/// Create tables if they don't exist. Idempotent.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS sessions (
            id INTEGER PRIMARY KEY,
            session_key TEXT NOT NULL UNIQUE,
            username TEXT NOT NULL,
            start_time TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS results (
            id INTEGER PRIMARY KEY,
            session_id INTEGER NOT NULL REFERENCES sessions(id),
            song_id TEXT NOT NULL,
            song_title TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            score REAL NOT NULL,
            accuracy REAL NOT NULL,
            stability REAL NOT NULL,
            duration REAL NOT NULL,
            notes TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sessions_username ON sessions(username);
        CREATE INDEX IF NOT EXISTS idx_results_session ON results(session_id);",
    )
    .context("Failed to initialize database schema")?;

    Ok(())
}

/// Record a performance under the user's session for `date`, creating the
/// session on first use. Returns the session key.
pub fn save_result(conn: &Connection, username: &str, date: NaiveDate, result: &SessionResult) -> Result<String> {
    let key = util::session_key(username, date);

    // The first result of the day sets the session's start time
    conn.execute(
        "INSERT INTO sessions (session_key, username, start_time)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(session_key) DO NOTHING",
        rusqlite::params![key, username, result.timestamp],
    )
    .context("Failed to upsert session")?;

    let session_id: i64 = conn
        .query_row("SELECT id FROM sessions WHERE session_key = ?1", [&key], |row| row.get(0))
        .context("Failed to get session id")?;

    let notes = serde_json::to_string(&result.notes).context("Failed to serialize notes")?;

    conn.execute(
        "INSERT INTO results
            (session_id, song_id, song_title, timestamp, score, accuracy, stability, duration, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            session_id,
            result.song_id,
            result.song_title,
            result.timestamp,
            result.score,
            result.accuracy,
            result.stability,
            result.duration,
            notes,
        ],
    )
    .with_context(|| format!("Failed to save result for {}", result.song_id))?;

    debug!(session = %key, song = %result.song_id, score = result.score, "saved result");
    Ok(key)
}

/// Load a session and all its results, oldest first.
pub fn load_session(conn: &Connection, session_key: &str) -> Result<Session> {
    let row = conn
        .query_row(
            "SELECT id, username, start_time FROM sessions WHERE session_key = ?1",
            [session_key],
            |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?)),
        )
        .optional()
        .context("Failed to query session")?;

    let Some((id, username, start_time)) = row else {
        anyhow::bail!("No session found: {session_key}");
    };

    let mut stmt = conn
        .prepare(
            "SELECT song_id, song_title, timestamp, score, accuracy, stability, duration, notes
             FROM results WHERE session_id = ?1 ORDER BY id",
        )
        .context("Failed to prepare results query")?;

    let rows = stmt
        .query_map([id], |row| {
            Ok((
                SessionResult {
                    song_id: row.get(0)?,
                    song_title: row.get(1)?,
                    timestamp: row.get(2)?,
                    score: row.get(3)?,
                    accuracy: row.get(4)?,
                    stability: row.get(5)?,
                    duration: row.get(6)?,
                    notes: Default::default(),
                },
                row.get::<_, String>(7)?,
            ))
        })
        .context("Failed to load results")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read result row")?;

    let results = rows
        .into_iter()
        .map(|(mut result, notes)| {
            result.notes = serde_json::from_str(&notes)
                .with_context(|| format!("Failed to parse notes for {}", result.song_id))?;
            Ok(result)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Session {
        session_id: session_key.to_string(),
        username,
        start_time,
        results,
    })
}

/// List sessions (optionally for one user) with per-session aggregates,
/// in chronological order.
pub fn list_sessions(conn: &Connection, username: Option<&str>) -> Result<Vec<SessionSummary>> {
    let mut stmt = conn
        .prepare(
            "SELECT s.session_key, s.username, s.start_time,
                    COUNT(r.id), COALESCE(AVG(r.score), 0.0), COALESCE(AVG(r.accuracy), 0.0)
             FROM sessions s LEFT JOIN results r ON r.session_id = s.id
             WHERE ?1 IS NULL OR s.username = ?1
             GROUP BY s.id
             ORDER BY s.start_time, s.session_key",
        )
        .context("Failed to prepare list query")?;

    let sessions = stmt
        .query_map([username], |row| {
            Ok(SessionSummary {
                session_id: row.get(0)?,
                username: row.get(1)?,
                start_time: row.get(2)?,
                num_songs: row.get::<_, i64>(3)? as usize,
                average_score: row.get(4)?,
                average_accuracy: row.get(5)?,
            })
        })
        .context("Failed to list sessions")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read session row")?;

    Ok(sessions)
}

/// Lifetime statistics for a user. All zeros when there's no history.
pub fn user_stats(conn: &Connection, username: &str) -> Result<UserStats> {
    let total_sessions: i64 = conn
        .query_row("SELECT COUNT(*) FROM sessions WHERE username = ?1", [username], |row| {
            row.get(0)
        })
        .context("Failed to count sessions")?;

    if total_sessions == 0 {
        return Ok(UserStats::empty(username));
    }

    let (total_songs, average_score, average_accuracy, best_score, worst_score) = conn
        .query_row(
            "SELECT COUNT(r.id),
                    COALESCE(AVG(r.score), 0.0), COALESCE(AVG(r.accuracy), 0.0),
                    COALESCE(MAX(r.score), 0.0), COALESCE(MIN(r.score), 0.0)
             FROM results r JOIN sessions s ON s.id = r.session_id
             WHERE s.username = ?1",
            [username],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, f64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            },
        )
        .context("Failed to aggregate results")?;

    Ok(UserStats {
        username: username.to_string(),
        total_sessions: total_sessions as usize,
        total_songs: total_songs as usize,
        average_score,
        average_accuracy,
        best_score,
        worst_score,
    })
}

/// A user's songs ranked by best score, highest first.
pub fn top_songs(conn: &Connection, username: &str, limit: usize) -> Result<Vec<SongStats>> {
    let mut stmt = conn
        .prepare(
            "SELECT r.song_id,
                    (SELECT r2.song_title FROM results r2
                       JOIN sessions s2 ON s2.id = r2.session_id
                      WHERE r2.song_id = r.song_id AND s2.username = ?1
                      ORDER BY r2.id LIMIT 1),
                    COUNT(*), AVG(r.score), MAX(r.score)
             FROM results r JOIN sessions s ON s.id = r.session_id
             WHERE s.username = ?1
             GROUP BY r.song_id
             ORDER BY MAX(r.score) DESC, r.song_id
             LIMIT ?2",
        )
        .context("Failed to prepare top songs query")?;

    let songs = stmt
        .query_map(rusqlite::params![username, limit as i64], |row| {
            Ok(SongStats {
                song_id: row.get(0)?,
                song_title: row.get(1)?,
                attempts: row.get::<_, i64>(2)? as usize,
                avg_score: row.get(3)?,
                best_score: row.get(4)?,
            })
        })
        .context("Failed to query top songs")?
        .collect::<rusqlite::Result<Vec<_>>>()
        .context("Failed to read song row")?;

    Ok(songs)
}
