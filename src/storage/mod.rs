//! Storage layer: permanent score log plus per-difficulty rolling stat windows.
//!
//! The `Storage` trait is the seam between the HTTP surface and the concrete
//! backend. One adapter exists today (`SqliteStore`); swapping engines means
//! writing another adapter, not touching the aggregator or the routes.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod sqlite;

pub use sqlite::SqliteStore;

/// Maximum samples retained per difficulty window.
pub const WINDOW_CAP: usize = 200;

/// The three fixed difficulty tiers that get a rolling stats window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Beginner,
    Normal,
    Expert,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Beginner, Difficulty::Normal, Difficulty::Expert];

    /// Parse a difficulty string as sent by clients. Anything else is
    /// unrecognized and gets no stats window.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "beginner" => Some(Difficulty::Beginner),
            "normal" => Some(Difficulty::Normal),
            "expert" => Some(Difficulty::Expert),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Normal => "normal",
            Difficulty::Expert => "expert",
        }
    }

    /// Rolling-window table for this tier. Fixed set, so table names never
    /// come from user input.
    pub(crate) fn table(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "stats_beginner",
            Difficulty::Normal => "stats_normal",
            Difficulty::Expert => "stats_expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A permanent score row. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub id: i64,
    pub player_name: String,
    pub score: i64,
    pub wave: i64,
    pub accuracy: Option<f64>,
    pub difficulty: Option<String>,
    pub created_at: String,
}

/// A validated score submission, ready to insert.
#[derive(Debug, Clone)]
pub struct ScoreSubmission {
    pub player_name: Option<String>,
    pub score: i64,
    pub wave: i64,
    pub accuracy: Option<f64>,
    pub difficulty: Option<String>,
}

/// One entry in a difficulty's rolling window.
#[derive(Debug, Clone)]
pub struct StatSample {
    pub accuracy: f64,
    pub score: i64,
    pub wave: i64,
    pub created_at: String,
}

/// Abstract storage backend.
///
/// Every method is a single atomic logical operation; callers never see a
/// half-written record or a partially evicted window. There are no
/// cross-method transactions: a score insert and its window append are
/// independent operations.
pub trait Storage: Send + Sync {
    /// Append a score to the permanent log. Returns the new row id.
    fn save_score(&self, submission: &ScoreSubmission) -> Result<i64>;

    /// Top scores, highest first, optionally restricted to one difficulty
    /// string (exact match against the stored value).
    fn top_scores(&self, limit: u32, difficulty: Option<&str>) -> Result<Vec<ScoreRecord>>;

    /// The single highest score across all difficulties.
    fn global_best(&self) -> Result<Option<ScoreRecord>>;

    /// A player's highest score. Name match is exact and case-sensitive.
    fn player_best(&self, name: &str) -> Result<Option<ScoreRecord>>;

    /// Insert into the rolling window for `difficulty`, then evict everything
    /// but the newest `WINDOW_CAP` samples. Unrecognized difficulty strings
    /// are silently ignored.
    fn append_sample(&self, difficulty: &str, accuracy: f64, score: i64, wave: i64) -> Result<()>;

    /// Current window contents for a tier, newest first.
    fn snapshot(&self, difficulty: Difficulty) -> Result<Vec<StatSample>>;
}
