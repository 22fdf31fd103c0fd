// src/models/test_record.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// Represents the 'test_records' table in the database.
/// One row per completed attempt; the answer script is the full
/// immutable snapshot, the top-level columns exist for querying
/// without decoding it.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TestRecord {
    pub id: i64,
    pub student: i64,
    pub test: i64,
    pub score: String,
    pub passing_score: String,
    pub passed: bool,
    pub time_completed: chrono::DateTime<chrono::Utc>,
    pub time_limit: i32,
    pub answer_script: Json<AnswerScript>,
    pub performance_data: Json<PerformanceData>,
}

/// Insert DTO for a new test record (id assigned by the database).
#[derive(Debug, Clone)]
pub struct NewTestRecord {
    pub student: i64,
    pub test: i64,
    pub score: String,
    pub passing_score: String,
    pub passed: bool,
    pub time_completed: chrono::DateTime<chrono::Utc>,
    pub time_limit: i32,
    pub answer_script: AnswerScript,
    pub performance_data: PerformanceData,
}

/// Row shape for listing a student's results without the script blobs.
#[derive(Debug, Serialize, FromRow)]
pub struct TestRecordSummary {
    pub id: i64,
    pub test: i64,
    pub score: String,
    pub passed: bool,
    pub time_completed: chrono::DateTime<chrono::Utc>,
}

/// The full immutable record of one attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerScript {
    pub test_id: i64,
    pub test_name: String,
    pub student_id: i64,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub completed_at: chrono::DateTime<chrono::Utc>,
    /// Seconds spent, derived as time_limit - remaining at submission.
    pub time_spent: i64,
    pub questions: Vec<ScriptQuestion>,
    pub summary: ScriptSummary,
}

/// Per-question outcome inside an answer script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptQuestion {
    pub question_id: i64,
    pub question_text: String,
    pub options: ScriptOptions,
    pub correct_answer: String,
    pub selected_answer: Option<String>,
    pub is_correct: bool,
    pub marked_for_review: bool,
    pub image: Option<String>,
    pub explanation: Option<String>,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptOptions {
    pub a: String,
    pub b: String,
    pub c: String,
}

/// Aggregate block of an answer script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptSummary {
    pub total_questions: usize,
    pub answered: usize,
    pub correct: usize,
    pub marked_for_review: usize,
    pub score: i32,
    pub passed: bool,
}

/// Per-category breakdown persisted alongside the script.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceData {
    pub by_category: BTreeMap<String, CategoryBreakdown>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub correct: u32,
    pub total: u32,
}
