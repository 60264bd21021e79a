//! SQLite storage adapter.
//!
//! Schema:
//! - scores: permanent append-only score log
//! - players: reserved for account support, nothing writes it yet
//! - stats_beginner / stats_normal / stats_expert: rolling windows, at most
//!   200 rows each, trimmed on every insert

use anyhow::{anyhow, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

use super::{Difficulty, ScoreRecord, ScoreSubmission, StatSample, Storage, WINDOW_CAP};

/// SQLite-backed score and stats storage.
///
/// A single connection behind a mutex: each trait method is one critical
/// section, which is all the atomicity the API needs.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open or create the database at `path` and ensure the schema exists.
    pub fn open_at<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path.as_ref())?;

        // WAL mode for better concurrent access
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS scores (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                player_name TEXT DEFAULT 'Anonymous',
                score INTEGER NOT NULL,
                wave INTEGER NOT NULL,
                accuracy REAL,
                difficulty TEXT,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_scores_score ON scores(score DESC);

            CREATE TABLE IF NOT EXISTS players (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS stats_beginner (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                accuracy REAL NOT NULL,
                score INTEGER NOT NULL,
                wave INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS stats_normal (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                accuracy REAL NOT NULL,
                score INTEGER NOT NULL,
                wave INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS stats_expert (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                accuracy REAL NOT NULL,
                score INTEGER NOT NULL,
                wave INTEGER NOT NULL,
                created_at TEXT NOT NULL
            );
            "#,
        )?;

        info!("SQLite database ready: {}", path.as_ref().display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("storage connection lock poisoned"))
    }
}

fn score_from_row(row: &Row<'_>) -> rusqlite::Result<ScoreRecord> {
    Ok(ScoreRecord {
        id: row.get(0)?,
        player_name: row.get(1)?,
        score: row.get(2)?,
        wave: row.get(3)?,
        accuracy: row.get(4)?,
        difficulty: row.get(5)?,
        created_at: row.get(6)?,
    })
}

const SCORE_COLUMNS: &str = "id, player_name, score, wave, accuracy, difficulty, created_at";

impl Storage for SqliteStore {
    fn save_score(&self, submission: &ScoreSubmission) -> Result<i64> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO scores (player_name, score, wave, accuracy, difficulty, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                submission.player_name.as_deref().unwrap_or("Anonymous"),
                submission.score,
                submission.wave,
                submission.accuracy,
                submission.difficulty,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    fn top_scores(&self, limit: u32, difficulty: Option<&str>) -> Result<Vec<ScoreRecord>> {
        let conn = self.conn()?;

        let mut results = Vec::new();
        match difficulty {
            Some(d) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SCORE_COLUMNS} FROM scores
                     WHERE difficulty = ?1
                     ORDER BY score DESC
                     LIMIT ?2"
                ))?;
                let rows = stmt.query_map(params![d, limit], score_from_row)?;
                for row in rows {
                    results.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {SCORE_COLUMNS} FROM scores
                     ORDER BY score DESC
                     LIMIT ?1"
                ))?;
                let rows = stmt.query_map(params![limit], score_from_row)?;
                for row in rows {
                    results.push(row?);
                }
            }
        }
        Ok(results)
    }

    fn global_best(&self) -> Result<Option<ScoreRecord>> {
        let conn = self.conn()?;
        let best = conn
            .query_row(
                &format!("SELECT {SCORE_COLUMNS} FROM scores ORDER BY score DESC LIMIT 1"),
                [],
                score_from_row,
            )
            .optional()?;
        Ok(best)
    }

    fn player_best(&self, name: &str) -> Result<Option<ScoreRecord>> {
        let conn = self.conn()?;
        let best = conn
            .query_row(
                &format!(
                    "SELECT {SCORE_COLUMNS} FROM scores
                     WHERE player_name = ?1
                     ORDER BY score DESC
                     LIMIT 1"
                ),
                params![name],
                score_from_row,
            )
            .optional()?;
        Ok(best)
    }

    fn append_sample(&self, difficulty: &str, accuracy: f64, score: i64, wave: i64) -> Result<()> {
        // Unrecognized tiers get no window; the submission itself already
        // landed in the permanent log.
        let Some(tier) = Difficulty::parse(difficulty) else {
            return Ok(());
        };
        let table = tier.table();

        let conn = self.conn()?;
        conn.execute(
            &format!(
                "INSERT INTO {table} (accuracy, score, wave, created_at)
                 VALUES (?1, ?2, ?3, ?4)"
            ),
            params![accuracy, score, wave, Utc::now().to_rfc3339()],
        )?;

        // Keep the newest WINDOW_CAP rows, ties broken by insertion order.
        conn.execute(
            &format!(
                "DELETE FROM {table} WHERE id NOT IN (
                     SELECT id FROM {table}
                     ORDER BY created_at DESC, id DESC
                     LIMIT ?1
                 )"
            ),
            params![WINDOW_CAP as i64],
        )?;

        Ok(())
    }

    fn snapshot(&self, difficulty: Difficulty) -> Result<Vec<StatSample>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT accuracy, score, wave, created_at FROM {}
             ORDER BY created_at DESC, id DESC",
            difficulty.table()
        ))?;

        let rows = stmt.query_map([], |row| {
            Ok(StatSample {
                accuracy: row.get(0)?,
                score: row.get(1)?,
                wave: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?;

        let mut samples = Vec::new();
        for row in rows {
            samples.push(row?);
        }
        Ok(samples)
    }
}
