//! SQLite-based session storage.
//!
//! Provides persistent storage for:
//! - Finished breathing sessions
//! - Favorite patterns
//! - Statistics derived from the session history

use std::path::Path;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use serde::{Deserialize, Serialize};

use super::{data_dir, migrations};
use crate::error::{DatabaseError, Result};
use crate::persistence::{SessionSink, SessionSummary};
use crate::stats::{self, SessionStats};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: i64,
    pub pattern: String,
    pub duration: u64,
    pub breath_count: u64,
    #[serde(default)]
    pub hold_count: u64,
    #[serde(default)]
    pub total_hold_time: u64,
    #[serde(default)]
    pub longest_hold: u64,
    #[serde(alias = "createdAt")]
    pub completed_at: DateTime<Utc>,
}

impl SessionRecord {
    /// UTC calendar day the session finished on.
    pub fn completed_on(&self) -> NaiveDate {
        self.completed_at.date_naive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoritePattern {
    pub id: i64,
    pub name: String,
    /// Pattern key, e.g. `"4-7-8"`.
    pub pattern: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/breathwork.db`.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("breathwork.db");
        Self::open_at(&path)
    }

    /// Open (or create) the database at `path`.
    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        Self::with_connection(conn)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Record a finished session.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub fn record_session(
        &self,
        summary: &SessionSummary,
        completed_at: DateTime<Utc>,
    ) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO sessions (pattern, duration, breath_count, hold_count, total_hold_time, longest_hold, completed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                summary.pattern,
                summary.duration,
                summary.breath_count,
                summary.hold_count,
                summary.total_hold_time,
                summary.longest_hold,
                completed_at.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Sessions finished on the given UTC day, oldest first.
    pub fn sessions_on(&self, date: NaiveDate) -> Result<Vec<SessionRecord>> {
        let next = date + Duration::days(1);
        self.query_sessions(
            "SELECT id, pattern, duration, breath_count, hold_count, total_hold_time, longest_hold, completed_at
             FROM sessions
             WHERE completed_at >= ?1 AND completed_at < ?2
             ORDER BY completed_at ASC",
            params![day_start(date), day_start(next)],
        )
    }

    /// Most recent sessions first.
    pub fn recent_sessions(&self, limit: u32) -> Result<Vec<SessionRecord>> {
        self.query_sessions(
            "SELECT id, pattern, duration, breath_count, hold_count, total_hold_time, longest_hold, completed_at
             FROM sessions
             ORDER BY completed_at DESC, id DESC
             LIMIT ?1",
            params![limit],
        )
    }

    pub fn all_sessions(&self) -> Result<Vec<SessionRecord>> {
        self.query_sessions(
            "SELECT id, pattern, duration, breath_count, hold_count, total_hold_time, longest_hold, completed_at
             FROM sessions
             ORDER BY completed_at ASC",
            [],
        )
    }

    /// All-time statistics with streaks as of `today`.
    pub fn stats(&self, today: NaiveDate) -> Result<SessionStats> {
        Ok(stats::summarize(&self.all_sessions()?, today))
    }

    pub fn add_favorite(&self, name: &str, pattern: &str) -> Result<FavoritePattern> {
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO favorites (name, pattern, created_at) VALUES (?1, ?2, ?3)",
            params![name, pattern, created_at.to_rfc3339()],
        )?;
        Ok(FavoritePattern {
            id: self.conn.last_insert_rowid(),
            name: name.to_string(),
            pattern: pattern.to_string(),
            created_at: Some(created_at),
        })
    }

    pub fn list_favorites(&self) -> Result<Vec<FavoritePattern>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, pattern, created_at FROM favorites ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(FavoritePattern {
                id: row.get(0)?,
                name: row.get(1)?,
                pattern: row.get(2)?,
                created_at: Some(parse_timestamp(row, 3)?),
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    /// Returns false if no favorite had that id.
    pub fn delete_favorite(&self, id: i64) -> Result<bool> {
        let n = self
            .conn
            .execute("DELETE FROM favorites WHERE id = ?1", params![id])?;
        Ok(n > 0)
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn query_sessions<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<SessionRecord>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(SessionRecord {
                id: row.get(0)?,
                pattern: row.get(1)?,
                duration: row.get(2)?,
                breath_count: row.get(3)?,
                hold_count: row.get(4)?,
                total_hold_time: row.get(5)?,
                longest_hold: row.get(6)?,
                completed_at: parse_timestamp(row, 7)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl SessionSink for Database {
    fn save(&mut self, summary: &SessionSummary) -> Result<()> {
        let id = self.record_session(summary, Utc::now())?;
        tracing::debug!(id, pattern = %summary.pattern, "session stored locally");
        Ok(())
    }
}

fn day_start(date: NaiveDate) -> String {
    format!("{}T00:00:00+00:00", date.format("%Y-%m-%d"))
}

fn parse_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
        })
}
