//! Storage layer for imported rowing activities.
//!
//! Provides persistence for activities and their samples using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! An import opens its own `Database` and drops it when done; the connection is
//! closed on drop regardless of how the import ended.
//!
//! # Schema
//!
//! Activities are keyed by their start time in milliseconds, which is also what
//! names the archived raw log. A second activity with the same start time is
//! rejected as a duplicate, so re-importing a log never creates two rows.
//!
//! `start_time` and `imported_at` are stored as TEXT in RFC 3339 format
//! (e.g., `2024-03-01T07:30:00Z`) for readability; `start_time_ms` is the key.

use std::fmt::Display;
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use erg_core::{Activity, Sample};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, params};
use thiserror::Error;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// An activity with the same start time is already stored.
    #[error("activity starting at {start_time_ms} already exists")]
    DuplicateActivity { start_time_ms: i64 },
    /// The activity cannot be stored as given.
    #[error("invalid activity starting at {start_time_ms}: {message}")]
    InvalidActivity { start_time_ms: i64, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Summary row for a stored activity.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityRecord {
    pub id: i64,
    pub start_time_ms: i64,
    pub start_time: String,
    pub duration_ms: i64,
    pub distance_m: i64,
    pub calories: i64,
    pub sample_count: i64,
    pub imported_at: String,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS activities (
                id INTEGER PRIMARY KEY,
                start_time_ms INTEGER NOT NULL UNIQUE,
                start_time TEXT NOT NULL,
                duration_ms INTEGER NOT NULL,
                distance_m INTEGER NOT NULL,
                calories INTEGER NOT NULL,
                sample_count INTEGER NOT NULL,
                imported_at TEXT NOT NULL
            );

            -- One row per aggregate sample, seq preserves emission order
            CREATE TABLE IF NOT EXISTS samples (
                activity_id INTEGER NOT NULL,
                seq INTEGER NOT NULL,
                time_ms INTEGER NOT NULL,
                start_distance_m INTEGER NOT NULL,
                total_distance_m INTEGER NOT NULL,
                stroke_rate INTEGER NOT NULL,
                total_strokes INTEGER NOT NULL,
                watts INTEGER NOT NULL,
                calories INTEGER NOT NULL,
                heart_rate INTEGER NOT NULL,
                speed_m_s REAL NOT NULL,
                PRIMARY KEY (activity_id, seq),
                FOREIGN KEY (activity_id) REFERENCES activities(id) ON DELETE CASCADE
            );
            ",
        )?;
        Ok(())
    }

    /// Inserts an activity with all of its samples in one transaction.
    ///
    /// Returns the new row id. Nothing is written if any part fails.
    pub fn insert_activity(&mut self, activity: &Activity) -> Result<i64, DbError> {
        let start_time_ms = activity.start_time_ms;
        let start_time = activity
            .start_time()
            .ok_or_else(|| DbError::InvalidActivity {
                start_time_ms,
                message: "start time out of range".to_string(),
            })?
            .to_rfc3339_opts(SecondsFormat::Secs, true);
        let imported_at = Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true);
        let int = |field: &str, value: u64| to_sql_int(value, start_time_ms, field);

        let tx = self.conn.transaction()?;
        let inserted = tx.execute(
            "
            INSERT INTO activities
            (start_time_ms, start_time, duration_ms, distance_m, calories, sample_count, imported_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
            params![
                start_time_ms,
                start_time,
                activity.duration_ms(),
                int("distance_m", activity.distance_m())?,
                int("calories", activity.calories())?,
                to_sql_int(activity.samples.len(), start_time_ms, "sample_count")?,
                imported_at,
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation =>
            {
                return Err(DbError::DuplicateActivity { start_time_ms });
            }
            Err(err) => return Err(err.into()),
        }
        let id = tx.last_insert_rowid();
        {
            let mut stmt = tx.prepare(
                "
                INSERT INTO samples
                (activity_id, seq, time_ms, start_distance_m, total_distance_m, stroke_rate,
                 total_strokes, watts, calories, heart_rate, speed_m_s)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                ",
            )?;
            for (seq, sample) in activity.samples.iter().enumerate() {
                stmt.execute(params![
                    id,
                    to_sql_int(seq, start_time_ms, "seq")?,
                    sample.time_ms,
                    int("start_distance_m", sample.start_distance_m)?,
                    int("total_distance_m", sample.total_distance_m)?,
                    int("stroke_rate", sample.stroke_rate)?,
                    int("total_strokes", sample.total_strokes)?,
                    int("watts", sample.watts)?,
                    int("calories", sample.calories)?,
                    int("heart_rate", sample.heart_rate)?,
                    sample.speed_m_s,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(id, start_time_ms, samples = activity.samples.len(), "activity inserted");
        Ok(id)
    }

    /// Lists all activities ordered by start time.
    pub fn list_activities(&self) -> Result<Vec<ActivityRecord>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, start_time_ms, start_time, duration_ms, distance_m, calories,
                   sample_count, imported_at
            FROM activities
            ORDER BY start_time_ms ASC
            ",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ActivityRecord {
                id: row.get(0)?,
                start_time_ms: row.get(1)?,
                start_time: row.get(2)?,
                duration_ms: row.get(3)?,
                distance_m: row.get(4)?,
                calories: row.get(5)?,
                sample_count: row.get(6)?,
                imported_at: row.get(7)?,
            })
        })?;
        let mut activities = Vec::new();
        for row in rows {
            activities.push(row?);
        }
        Ok(activities)
    }

    /// Loads a stored activity with its samples, if present.
    pub fn load_activity(&self, start_time_ms: i64) -> Result<Option<Activity>, DbError> {
        let id: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM activities WHERE start_time_ms = ?",
                [start_time_ms],
                |row| row.get(0),
            )
            .optional()?;
        let Some(id) = id else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "
            SELECT time_ms, start_distance_m, total_distance_m, stroke_rate, total_strokes,
                   watts, calories, heart_rate, speed_m_s
            FROM samples
            WHERE activity_id = ?
            ORDER BY seq ASC
            ",
        )?;
        let rows = stmt.query_map([id], |row| {
            Ok(Sample {
                time_ms: row.get(0)?,
                start_distance_m: column_u64(row, 1)?,
                total_distance_m: column_u64(row, 2)?,
                stroke_rate: column_u64(row, 3)?,
                total_strokes: column_u64(row, 4)?,
                watts: column_u64(row, 5)?,
                calories: column_u64(row, 6)?,
                heart_rate: column_u64(row, 7)?,
                speed_m_s: row.get(8)?,
            })
        })?;
        let mut samples = Vec::new();
        for row in rows {
            samples.push(row?);
        }
        Ok(Some(Activity {
            start_time_ms,
            samples,
        }))
    }

    /// Counts stored activities.
    pub fn count_activities(&self) -> Result<i64, DbError> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM activities", [], |row| row.get(0))?;
        Ok(count)
    }
}

/// Converts an unsigned counter to SQLite's signed integer.
///
/// Values above `i64::MAX` cannot be stored without loss and are rejected.
fn to_sql_int<T>(value: T, start_time_ms: i64, field: &str) -> Result<i64, DbError>
where
    T: TryInto<i64> + Copy + Display,
{
    value.try_into().map_err(|_| DbError::InvalidActivity {
        start_time_ms,
        message: format!("{field} {value} exceeds the storable integer range"),
    })
}

/// Reads a non-negative integer column as an unsigned counter.
fn column_u64(row: &Row<'_>, idx: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(idx)?;
    u64::try_from(value).map_err(|_| rusqlite::Error::IntegralValueOutOfRange(idx, value))
}
