// tests/common/mod.rs
//
// In-memory SessionStore and fixtures for exercising the session
// engine and submission pipeline without a database.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use sqlx::types::Json;

use driveschool_backend::error::AppError;
use driveschool_backend::models::question::{AnswerOption, Question};
use driveschool_backend::models::student::StudentAggregates;
use driveschool_backend::models::test::Test;
use driveschool_backend::models::test_record::NewTestRecord;
use driveschool_backend::session::{SessionKey, SessionSnapshot};
use driveschool_backend::store::SessionStore;

#[derive(Default)]
pub struct MemoryStore {
    pub tests: HashMap<i64, Test>,
    pub questions: HashMap<i64, Question>,
    pub snapshots: Mutex<HashMap<(i64, i64), SessionSnapshot>>,
    pub records: Mutex<Vec<(i64, NewTestRecord)>>,
    pub aggregates: Mutex<HashMap<i64, StudentAggregates>>,
    pub next_record_id: AtomicI64,
    /// When set, the next create_test_record call fails once.
    pub fail_next_record: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            next_record_id: AtomicI64::new(100),
            ..Default::default()
        }
    }

    pub fn with_test(mut self, test: Test, questions: Vec<Question>) -> Self {
        for q in questions {
            self.questions.insert(q.id, q);
        }
        self.tests.insert(test.id, test);
        self
    }

    pub fn record_count(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn snapshot_for(&self, key: SessionKey) -> Option<SessionSnapshot> {
        self.snapshots
            .lock()
            .unwrap()
            .get(&(key.student_id, key.test_id))
            .cloned()
    }

    pub fn aggregates_for(&self, student_id: i64) -> StudentAggregates {
        self.aggregates
            .lock()
            .unwrap()
            .get(&student_id)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn fetch_test(&self, test_id: i64) -> Result<Test, AppError> {
        self.tests
            .get(&test_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Test {} not found", test_id)))
    }

    async fn fetch_questions(&self, test: &Test) -> Result<Vec<Question>, AppError> {
        Ok(test
            .questions
            .0
            .iter()
            .filter_map(|id| self.questions.get(id).cloned())
            .collect())
    }

    async fn load_snapshot(&self, key: SessionKey) -> Result<Option<SessionSnapshot>, AppError> {
        Ok(self.snapshot_for(key))
    }

    async fn save_snapshot(
        &self,
        key: SessionKey,
        snapshot: &SessionSnapshot,
    ) -> Result<(), AppError> {
        self.snapshots
            .lock()
            .unwrap()
            .insert((key.student_id, key.test_id), snapshot.clone());
        Ok(())
    }

    async fn delete_snapshot(&self, key: SessionKey) -> Result<(), AppError> {
        self.snapshots
            .lock()
            .unwrap()
            .remove(&(key.student_id, key.test_id));
        Ok(())
    }

    async fn create_test_record(&self, record: NewTestRecord) -> Result<i64, AppError> {
        if self.fail_next_record.swap(false, Ordering::SeqCst) {
            return Err(AppError::InternalServerError(
                "simulated storage failure".to_string(),
            ));
        }
        let id = self.next_record_id.fetch_add(1, Ordering::SeqCst);
        self.records.lock().unwrap().push((id, record));
        Ok(id)
    }

    async fn load_student_aggregates(
        &self,
        student_id: i64,
    ) -> Result<StudentAggregates, AppError> {
        Ok(self.aggregates_for(student_id))
    }

    async fn save_student_aggregates(
        &self,
        student_id: i64,
        aggregates: &StudentAggregates,
    ) -> Result<(), AppError> {
        self.aggregates
            .lock()
            .unwrap()
            .insert(student_id, aggregates.clone());
        Ok(())
    }
}

// --- fixtures ------------------------------------------------------

pub fn sample_question(id: i64, correct: AnswerOption) -> Question {
    Question {
        id,
        question_text: format!("Question {}", id),
        option_a: "Give way".to_string(),
        option_b: "Stop completely".to_string(),
        option_c: "Proceed with caution".to_string(),
        correct_answer: correct.as_str().to_string(),
        category: if id % 2 == 0 {
            "road_signs".to_string()
        } else {
            "right_of_way".to_string()
        },
        explanation: None,
        image: None,
        created_at: None,
    }
}

pub fn sample_test(id: i64, question_ids: &[i64], passing_score: i32, time_limit: i32) -> Test {
    Test {
        id,
        name: format!("Practice Test {}", id),
        description: None,
        passing_score,
        time_limit,
        is_active: true,
        questions: Json(question_ids.to_vec()),
        created_at: None,
    }
}

/// Three questions (correct answers A, B, C), passing score 60%,
/// 30 minute limit.
pub fn three_question_test() -> (Test, Vec<Question>) {
    let questions = vec![
        sample_question(1, AnswerOption::A),
        sample_question(2, AnswerOption::B),
        sample_question(3, AnswerOption::C),
    ];
    (sample_test(1, &[1, 2, 3], 60, 30), questions)
}
