// src/session/engine.rs

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::error::AppError;
use crate::models::question::{AnswerOption, Question};
use crate::models::test::Test;

use super::pipeline::SubmissionOutcome;
use super::snapshot::SessionSnapshot;

/// Page-level phase of a session.
///
/// `Reviewing` is the non-modal question-map overlay: entering or
/// leaving it never touches the timer or the answers. `Finalizing`
/// shows the same map with a confirm/back choice. `Submitted` is
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    InProgress,
    Reviewing,
    Finalizing,
    Submitted,
}

/// Single-writer guard around the submission pipeline. A session moves
/// `Idle -> Submitting -> Submitted` exactly once; any attempt to
/// submit while `Submitting` or `Submitted` is rejected or answered
/// with the recorded outcome, so a timer expiry racing a manual
/// finalize can never double-write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitStatus {
    Idle,
    Submitting,
    Submitted,
}

/// Result of one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still running; carries the remaining seconds.
    Running(i64),
    /// The clock just hit zero: the caller must submit now.
    Expired,
    /// The session is submitted or submitting; the ticker should stop.
    Halted,
}

/// One in-progress attempt at a test by one student.
///
/// Owns all mutable session state. The test and its questions are
/// immutable for the lifetime of the session.
#[derive(Debug)]
pub struct TestSession {
    test: Test,
    questions: Vec<Question>,
    student_id: i64,
    cursor: usize,
    answers: BTreeMap<i64, AnswerOption>,
    marked: BTreeSet<i64>,
    remaining_secs: i64,
    phase: Phase,
    status: SubmitStatus,
    outcome: Option<SubmissionOutcome>,
}

impl TestSession {
    /// Starts a fresh session seeded from the test's time limit.
    pub fn new(test: Test, questions: Vec<Question>, student_id: i64) -> Result<Self, AppError> {
        if questions.is_empty() {
            return Err(AppError::ConfigError(format!(
                "Test {} has no questions",
                test.id
            )));
        }
        let remaining_secs = test.time_limit_seconds();
        Ok(TestSession {
            test,
            questions,
            student_id,
            cursor: 0,
            answers: BTreeMap::new(),
            marked: BTreeSet::new(),
            remaining_secs,
            phase: Phase::InProgress,
            status: SubmitStatus::Idle,
            outcome: None,
        })
    }

    /// Resumes a session from a persisted snapshot instead of defaults.
    ///
    /// The snapshot must reproduce the state exactly: cursor, selected
    /// answers, marks and remaining seconds. Entries referring to
    /// questions no longer on the test are dropped with a warning.
    pub fn resume(
        test: Test,
        questions: Vec<Question>,
        student_id: i64,
        snapshot: SessionSnapshot,
    ) -> Result<Self, AppError> {
        let mut session = TestSession::new(test, questions, student_id)?;

        session.cursor = snapshot.index.min(session.questions.len() - 1);
        session.remaining_secs = snapshot.time.clamp(0, session.test.time_limit_seconds());

        for (question_id, option) in snapshot.answers {
            if session.question(question_id).is_some() {
                session.answers.insert(question_id, option);
            } else {
                tracing::warn!(
                    question_id,
                    test_id = session.test.id,
                    "dropping snapshot answer for unknown question"
                );
            }
        }
        for question_id in snapshot.marked {
            if session.question(question_id).is_some() {
                session.marked.insert(question_id);
            }
        }

        Ok(session)
    }

    // --- accessors -------------------------------------------------

    pub fn test(&self) -> &Test {
        &self.test
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn student_id(&self) -> i64 {
        self.student_id
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.cursor]
    }

    pub fn answers(&self) -> &BTreeMap<i64, AnswerOption> {
        &self.answers
    }

    pub fn selected_answer(&self, question_id: i64) -> Option<AnswerOption> {
        self.answers.get(&question_id).copied()
    }

    pub fn is_marked(&self, question_id: i64) -> bool {
        self.marked.contains(&question_id)
    }

    pub fn marked(&self) -> &BTreeSet<i64> {
        &self.marked
    }

    pub fn remaining_secs(&self) -> i64 {
        self.remaining_secs
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> SubmitStatus {
        self.status
    }

    pub fn outcome(&self) -> Option<&SubmissionOutcome> {
        self.outcome.as_ref()
    }

    fn question(&self, question_id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }

    /// Rejects mutation once a submission has started or finished.
    fn ensure_mutable(&self) -> Result<(), AppError> {
        match self.status {
            SubmitStatus::Idle => Ok(()),
            SubmitStatus::Submitting => Err(AppError::Conflict(
                "Submission already in progress".to_string(),
            )),
            SubmitStatus::Submitted => {
                Err(AppError::Conflict("Session already submitted".to_string()))
            }
        }
    }

    // --- answer tracker --------------------------------------------

    /// Records or overwrites the answer for a question. The option
    /// label is already validated by the `AnswerOption` type; the
    /// question must belong to this test.
    pub fn select_option(
        &mut self,
        question_id: i64,
        option: AnswerOption,
    ) -> Result<(), AppError> {
        self.ensure_mutable()?;
        if self.question(question_id).is_none() {
            return Err(AppError::BadRequest(format!(
                "Question {} is not part of this test",
                question_id
            )));
        }
        self.answers.insert(question_id, option);
        Ok(())
    }

    /// Flips the marked-for-review flag. Informational only; marks
    /// never affect scoring. Returns the new state of the flag.
    pub fn toggle_review(&mut self, question_id: i64) -> Result<bool, AppError> {
        self.ensure_mutable()?;
        if self.question(question_id).is_none() {
            return Err(AppError::BadRequest(format!(
                "Question {} is not part of this test",
                question_id
            )));
        }
        if self.marked.remove(&question_id) {
            Ok(false)
        } else {
            self.marked.insert(question_id);
            Ok(true)
        }
    }

    // --- navigation controller -------------------------------------

    /// Moves the cursor, clamping to [0, count-1]. Jumping from the
    /// question map also closes the overlay.
    pub fn go_to(&mut self, index: usize) -> Result<usize, AppError> {
        self.ensure_mutable()?;
        self.cursor = index.min(self.questions.len() - 1);
        if matches!(self.phase, Phase::Reviewing | Phase::Finalizing) {
            self.phase = Phase::InProgress;
        }
        Ok(self.cursor)
    }

    /// No-op at the last question (no wraparound).
    pub fn next(&mut self) -> Result<usize, AppError> {
        self.ensure_mutable()?;
        if self.cursor + 1 < self.questions.len() {
            self.go_to(self.cursor + 1)
        } else {
            Ok(self.cursor)
        }
    }

    /// No-op at the first question.
    pub fn previous(&mut self) -> Result<usize, AppError> {
        self.ensure_mutable()?;
        if self.cursor > 0 {
            self.go_to(self.cursor - 1)
        } else {
            Ok(self.cursor)
        }
    }

    // --- phase transitions -----------------------------------------

    /// Opens the question-map overlay. Timer and answers are untouched.
    pub fn show_map(&mut self) -> Result<(), AppError> {
        self.ensure_mutable()?;
        if self.phase == Phase::InProgress {
            self.phase = Phase::Reviewing;
        }
        Ok(())
    }

    /// Closes the overlay, returning to the current question.
    pub fn hide_map(&mut self) -> Result<(), AppError> {
        self.ensure_mutable()?;
        if self.phase == Phase::Reviewing {
            self.phase = Phase::InProgress;
        }
        Ok(())
    }

    /// Enters the finalize screen (map with confirm/back).
    pub fn begin_finalize(&mut self) -> Result<(), AppError> {
        self.ensure_mutable()?;
        self.phase = Phase::Finalizing;
        Ok(())
    }

    /// "Back to test" from the finalize screen.
    pub fn cancel_finalize(&mut self) -> Result<(), AppError> {
        self.ensure_mutable()?;
        if self.phase == Phase::Finalizing {
            self.phase = Phase::InProgress;
        }
        Ok(())
    }

    // --- countdown -------------------------------------------------

    /// One countdown tick. Remaining seconds are monotonically
    /// non-increasing with a floor of zero.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != SubmitStatus::Idle {
            return TickOutcome::Halted;
        }
        if self.remaining_secs > 0 {
            self.remaining_secs -= 1;
        }
        if self.remaining_secs == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Running(self.remaining_secs)
        }
    }

    // --- submission status guard -----------------------------------

    /// Claims the right to submit. Fails unless the session is `Idle`;
    /// this is the single-writer check that makes submission
    /// exactly-once per session.
    pub(crate) fn begin_submit(&mut self) -> Result<(), AppError> {
        self.ensure_mutable()?;
        self.status = SubmitStatus::Submitting;
        Ok(())
    }

    /// Commits a successful submission; the session becomes terminal.
    pub(crate) fn complete_submit(&mut self, outcome: SubmissionOutcome) {
        self.status = SubmitStatus::Submitted;
        self.phase = Phase::Submitted;
        self.outcome = Some(outcome);
    }

    /// Releases the guard after a failed submission so the student can
    /// retry manually. The session stays alive and its snapshot is kept.
    pub(crate) fn fail_submit(&mut self) {
        self.status = SubmitStatus::Idle;
        if self.phase == Phase::Finalizing {
            self.phase = Phase::InProgress;
        }
    }

    // --- persistence -----------------------------------------------

    /// Snapshot of the mutable state for write-through persistence.
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            index: self.cursor,
            answers: self.answers.clone(),
            time: self.remaining_secs,
            marked: self.marked.iter().copied().collect(),
        }
    }
}
