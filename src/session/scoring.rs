// src/session/scoring.rs

use std::collections::BTreeMap;

use crate::error::AppError;
use crate::models::question::{AnswerOption, Question};

/// Result of scoring one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: usize,
    /// Rounded percent, 0..=100.
    pub score: i32,
}

/// Whether the recorded answer for `question` is correct.
/// An unanswered question is never correct.
pub fn is_correct(question: &Question, answers: &BTreeMap<i64, AnswerOption>) -> bool {
    answers
        .get(&question.id)
        .map(|selected| selected.as_str() == question.correct_answer)
        .unwrap_or(false)
}

/// Pure scoring over (questions, answers).
///
/// `score = round(correct / total * 100)`. A test with no questions is
/// a configuration error and is rejected up front rather than dividing
/// by zero.
pub fn score_answers(
    questions: &[Question],
    answers: &BTreeMap<i64, AnswerOption>,
) -> Result<Score, AppError> {
    if questions.is_empty() {
        return Err(AppError::ConfigError(
            "Cannot score a test with no questions".to_string(),
        ));
    }

    let correct = questions.iter().filter(|q| is_correct(q, answers)).count();
    let score = ((correct as f64 / questions.len() as f64) * 100.0).round() as i32;

    Ok(Score { correct, score })
}

/// Per-category correct/total tally used for performance_data.
pub fn category_breakdown(
    questions: &[Question],
    answers: &BTreeMap<i64, AnswerOption>,
) -> BTreeMap<String, crate::models::test_record::CategoryBreakdown> {
    let mut by_category: BTreeMap<String, crate::models::test_record::CategoryBreakdown> =
        BTreeMap::new();
    for q in questions {
        let entry = by_category.entry(q.category.clone()).or_default();
        entry.total += 1;
        if is_correct(q, answers) {
            entry.correct += 1;
        }
    }
    by_category
}
