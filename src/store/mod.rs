// src/store/mod.rs

pub mod pg;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::question::Question;
use crate::models::student::StudentAggregates;
use crate::models::test::Test;
use crate::models::test_record::NewTestRecord;
use crate::session::registry::SessionKey;
use crate::session::snapshot::SessionSnapshot;

pub use pg::PgStore;

/// Everything a test session needs from durable storage, behind a
/// trait so the engine and pipeline can be exercised without a
/// database. `PgStore` is the production implementation.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a test by id.
    async fn fetch_test(&self, test_id: i64) -> Result<Test, AppError>;

    /// Loads the test's questions in the test's declared order.
    async fn fetch_questions(&self, test: &Test) -> Result<Vec<Question>, AppError>;

    /// Reads the resume snapshot for a (student, test) pair, if any.
    async fn load_snapshot(&self, key: SessionKey) -> Result<Option<SessionSnapshot>, AppError>;

    /// Writes through the resume snapshot for a (student, test) pair.
    async fn save_snapshot(
        &self,
        key: SessionKey,
        snapshot: &SessionSnapshot,
    ) -> Result<(), AppError>;

    /// Deletes the resume snapshot once a submission is committed.
    async fn delete_snapshot(&self, key: SessionKey) -> Result<(), AppError>;

    /// Persists a completed attempt; returns the new record's id.
    async fn create_test_record(&self, record: NewTestRecord) -> Result<i64, AppError>;

    /// Reads a student's history and score-tracker maps.
    async fn load_student_aggregates(&self, student_id: i64)
        -> Result<StudentAggregates, AppError>;

    /// Writes back the merged aggregate maps.
    async fn save_student_aggregates(
        &self,
        student_id: i64,
        aggregates: &StudentAggregates,
    ) -> Result<(), AppError>;
}
