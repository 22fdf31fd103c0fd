// src/models/question.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;
use validator::Validate;

/// One of the three option labels a question offers.
///
/// Client answers are deserialized into this enum, so an out-of-domain
/// label is rejected at the boundary instead of travelling through the
/// session as a raw string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerOption {
    #[serde(rename = "option_a")]
    A,
    #[serde(rename = "option_b")]
    B,
    #[serde(rename = "option_c")]
    C,
}

impl AnswerOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnswerOption::A => "option_a",
            AnswerOption::B => "option_b",
            AnswerOption::C => "option_c",
        }
    }
}

impl fmt::Display for AnswerOption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnswerOption {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "option_a" => Ok(AnswerOption::A),
            "option_b" => Ok(AnswerOption::B),
            "option_c" => Ok(AnswerOption::C),
            other => Err(format!("'{}' is not a valid answer option", other)),
        }
    }
}

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The prompt text of the question.
    pub question_text: String,

    pub option_a: String,
    pub option_b: String,
    pub option_c: String,

    /// Correct option label: 'option_a', 'option_b' or 'option_c'.
    /// Enforced by a CHECK constraint in the database.
    pub correct_answer: String,

    /// Category tag (e.g. 'road_signs', 'right_of_way').
    pub category: String,

    /// Explanation shown when reviewing an answer script.
    pub explanation: Option<String>,

    /// Reference to an illustration, if any.
    pub image: Option<String>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl Question {
    /// The correct answer as a typed option. `None` only if the stored
    /// label is corrupt, which the CHECK constraint should prevent.
    pub fn correct_option(&self) -> Option<AnswerOption> {
        self.correct_answer.parse().ok()
    }

    pub fn option_text(&self, option: AnswerOption) -> &str {
        match option {
            AnswerOption::A => &self.option_a,
            AnswerOption::B => &self.option_b,
            AnswerOption::C => &self.option_c,
        }
    }
}

/// DTO for sending a question to a student mid-session
/// (excludes correct_answer and explanation).
#[derive(Debug, Serialize)]
pub struct PublicQuestion {
    pub id: i64,
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub category: String,
    pub image: Option<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(q: &Question) -> Self {
        PublicQuestion {
            id: q.id,
            question_text: q.question_text.clone(),
            option_a: q.option_a.clone(),
            option_b: q.option_b.clone(),
            option_c: q.option_c.clone(),
            category: q.category.clone(),
            image: q.image.clone(),
        }
    }
}

/// DTO for creating a new question.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub question_text: String,
    #[validate(length(min = 1, max = 500))]
    pub option_a: String,
    #[validate(length(min = 1, max = 500))]
    pub option_b: String,
    #[validate(length(min = 1, max = 500))]
    pub option_c: String,
    pub correct_answer: AnswerOption,
    #[validate(length(min = 1, max = 50))]
    pub category: String,
    #[validate(length(max = 2000))]
    pub explanation: Option<String>,
    pub image: Option<String>,
}

/// DTO for updating a question. Fields are optional.
#[derive(Debug, Deserialize)]
pub struct UpdateQuestionRequest {
    pub question_text: Option<String>,
    pub option_a: Option<String>,
    pub option_b: Option<String>,
    pub option_c: Option<String>,
    pub correct_answer: Option<AnswerOption>,
    pub category: Option<String>,
    pub explanation: Option<String>,
    pub image: Option<String>,
}
