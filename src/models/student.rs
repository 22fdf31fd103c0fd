// src/models/student.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// Represents the 'students' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,

    /// Map keyed by test record id. Accumulate-only: entries are added
    /// per attempt, never overwritten or truncated.
    pub test_history: Json<BTreeMap<String, HistoryEntry>>,

    /// Map keyed by test id, tracking latest/best score per test.
    pub test_scores: Json<BTreeMap<String, ScoreTracker>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Brief outcome stored in a student's test history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub test_id: i64,
    pub test_name: String,
    pub date: chrono::DateTime<chrono::Utc>,
    pub score: i32,
    pub passed: bool,
    pub time_spent: i64,
}

/// Per-test score tracker. `best_score` is a monotone max,
/// `attempts` only ever increments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTracker {
    pub latest_score: i32,
    pub best_score: i32,
    pub attempts: u32,
    pub last_attempt: chrono::DateTime<chrono::Utc>,
}

/// The two aggregate maps the submission pipeline reads, merges and
/// writes back as a unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentAggregates {
    pub test_history: BTreeMap<String, HistoryEntry>,
    pub test_scores: BTreeMap<String, ScoreTracker>,
}
