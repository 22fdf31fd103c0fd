// src/session/pipeline.rs

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::error::AppError;
use crate::models::student::{HistoryEntry, ScoreTracker};
use crate::models::test_record::{
    AnswerScript, NewTestRecord, PerformanceData, ScriptOptions, ScriptQuestion, ScriptSummary,
};
use crate::store::SessionStore;

use super::engine::TestSession;
use super::registry::SessionKey;
use super::scoring;

/// What the student sees once an attempt is committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubmissionOutcome {
    pub record_id: i64,
    pub score: i32,
    pub passed: bool,
}

/// Runs the submission pipeline for a session, exactly once.
///
/// Invoking this again after a successful submission returns the
/// recorded outcome without touching the store, so a timer expiry
/// racing a manual finalize can never create two test records.
///
/// Write order is fixed: the test record is created first (its id keys
/// the history entry), then the student aggregates are merged, and the
/// resume snapshot is deleted only after those writes committed. On
/// failure the snapshot is kept and the session is released for a
/// manual retry.
pub async fn submit(
    store: &dyn SessionStore,
    session: &mut TestSession,
    now: DateTime<Utc>,
) -> Result<SubmissionOutcome, AppError> {
    if let Some(outcome) = session.outcome() {
        return Ok(*outcome);
    }
    session.begin_submit()?;

    match run(store, session, now).await {
        Ok(outcome) => {
            session.complete_submit(outcome);

            // Best-effort cleanup; the attempt is already durable.
            let key = SessionKey::for_session(session);
            if let Err(e) = store.delete_snapshot(key).await {
                tracing::warn!(
                    student_id = key.student_id,
                    test_id = key.test_id,
                    "failed to delete resume snapshot after submission: {}",
                    e
                );
            }

            Ok(outcome)
        }
        Err(e) => {
            tracing::error!(
                student_id = session.student_id(),
                test_id = session.test().id,
                "submission failed: {}",
                e
            );
            session.fail_submit();
            Err(e)
        }
    }
}

async fn run(
    store: &dyn SessionStore,
    session: &TestSession,
    now: DateTime<Utc>,
) -> Result<SubmissionOutcome, AppError> {
    let test = session.test();
    let questions = session.questions();
    let answers = session.answers();

    let score = scoring::score_answers(questions, answers)?;
    let passed = score.score >= test.passing_score;

    let time_spent = test.time_limit_seconds() - session.remaining_secs();
    let started_at = now - Duration::seconds(time_spent);

    let script_questions: Vec<ScriptQuestion> = questions
        .iter()
        .map(|q| ScriptQuestion {
            question_id: q.id,
            question_text: q.question_text.clone(),
            options: ScriptOptions {
                a: q.option_a.clone(),
                b: q.option_b.clone(),
                c: q.option_c.clone(),
            },
            correct_answer: q.correct_answer.clone(),
            selected_answer: session.selected_answer(q.id).map(|o| o.as_str().to_string()),
            is_correct: scoring::is_correct(q, answers),
            marked_for_review: session.is_marked(q.id),
            image: q.image.clone(),
            explanation: q.explanation.clone(),
            category: q.category.clone(),
        })
        .collect();

    let script = AnswerScript {
        test_id: test.id,
        test_name: test.name.clone(),
        student_id: session.student_id(),
        started_at,
        completed_at: now,
        time_spent,
        questions: script_questions,
        summary: ScriptSummary {
            total_questions: questions.len(),
            answered: answers.len(),
            correct: score.correct,
            marked_for_review: session.marked().len(),
            score: score.score,
            passed,
        },
    };

    let performance = PerformanceData {
        by_category: scoring::category_breakdown(questions, answers),
    };

    let record = NewTestRecord {
        student: session.student_id(),
        test: test.id,
        score: score.score.to_string(),
        passing_score: test.passing_score.to_string(),
        passed,
        time_completed: now,
        time_limit: test.time_limit,
        answer_script: script,
        performance_data: performance,
    };

    // The record id keys the history entry, so this write must come
    // before the aggregate read-modify-write.
    let record_id = store.create_test_record(record).await?;

    let mut aggregates = store.load_student_aggregates(session.student_id()).await?;

    aggregates.test_history.insert(
        record_id.to_string(),
        HistoryEntry {
            test_id: test.id,
            test_name: test.name.clone(),
            date: now,
            score: score.score,
            passed,
            time_spent,
        },
    );

    let tracker_key = test.id.to_string();
    let previous = aggregates.test_scores.get(&tracker_key);
    let tracker = ScoreTracker {
        latest_score: score.score,
        best_score: previous
            .map(|p| p.best_score.max(score.score))
            .unwrap_or(score.score),
        attempts: previous.map(|p| p.attempts).unwrap_or(0) + 1,
        last_attempt: now,
    };
    aggregates.test_scores.insert(tracker_key, tracker);

    store
        .save_student_aggregates(session.student_id(), &aggregates)
        .await?;

    tracing::info!(
        student_id = session.student_id(),
        test_id = test.id,
        record_id,
        score = score.score,
        passed,
        "test submitted"
    );

    Ok(SubmissionOutcome {
        record_id,
        score: score.score,
        passed,
    })
}
