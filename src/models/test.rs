// src/models/test.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'tests' table in the database.
/// A test is immutable for the lifetime of a session; the session
/// orchestrator keeps its own copy.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Test {
    pub id: i64,

    pub name: String,

    pub description: Option<String>,

    /// Minimum score percent (0..=100) required to pass.
    pub passing_score: i32,

    /// Time limit in minutes.
    pub time_limit: i32,

    /// Inactive tests are hidden from students and cannot be started.
    pub is_active: bool,

    /// Ordered list of question ids, stored as a JSON array.
    pub questions: Json<Vec<i64>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Test {
    /// Total time budget for one attempt, in seconds.
    pub fn time_limit_seconds(&self) -> i64 {
        self.time_limit as i64 * 60
    }
}

/// DTO for listing tests to students (hides the question id list).
#[derive(Debug, Serialize)]
pub struct TestSummary {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub passing_score: i32,
    pub time_limit: i32,
    pub question_count: usize,
}

impl From<&Test> for TestSummary {
    fn from(t: &Test) -> Self {
        TestSummary {
            id: t.id,
            name: t.name.clone(),
            description: t.description.clone(),
            passing_score: t.passing_score,
            time_limit: t.time_limit,
            question_count: t.questions.0.len(),
        }
    }
}

/// DTO for creating a new test.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateTestRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
    #[validate(range(min = 0, max = 100))]
    pub passing_score: i32,
    #[validate(range(min = 1, max = 600))]
    pub time_limit: i32,
    #[validate(custom(function = validate_question_ids))]
    pub questions: Vec<i64>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

fn validate_question_ids(questions: &[i64]) -> Result<(), validator::ValidationError> {
    if questions.is_empty() {
        return Err(validator::ValidationError::new("questions_cannot_be_empty"));
    }
    Ok(())
}

/// DTO for updating a test. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateTestRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub passing_score: Option<i32>,
    pub time_limit: Option<i32>,
    pub questions: Option<Vec<i64>>,
    pub is_active: Option<bool>,
}
