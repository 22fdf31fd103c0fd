// src/store/pg.rs

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{PgPool, prelude::FromRow};

use crate::error::AppError;
use crate::models::question::Question;
use crate::models::student::{HistoryEntry, ScoreTracker, StudentAggregates};
use crate::models::test::Test;
use crate::models::test_record::NewTestRecord;
use crate::session::registry::SessionKey;
use crate::session::snapshot::SessionSnapshot;

use super::SessionStore;

/// Postgres-backed store used in production.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }
}

#[derive(FromRow)]
struct AggregatesRow {
    test_history: Json<BTreeMap<String, HistoryEntry>>,
    test_scores: Json<BTreeMap<String, ScoreTracker>>,
}

#[async_trait]
impl SessionStore for PgStore {
    async fn fetch_test(&self, test_id: i64) -> Result<Test, AppError> {
        sqlx::query_as::<_, Test>(
            r#"
            SELECT id, name, description, passing_score, time_limit, is_active, questions, created_at
            FROM tests
            WHERE id = $1
            "#,
        )
        .bind(test_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Test {} not found", test_id)))
    }

    async fn fetch_questions(&self, test: &Test) -> Result<Vec<Question>, AppError> {
        let ids = &test.questions.0;
        let rows = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, question_text, option_a, option_b, option_c,
                   correct_answer, category, explanation, image, created_at
            FROM questions
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        // Restore the test's declared question order.
        let mut by_id: HashMap<i64, Question> = rows.into_iter().map(|q| (q.id, q)).collect();
        let mut ordered = Vec::with_capacity(ids.len());
        for id in ids {
            match by_id.remove(id) {
                Some(q) => ordered.push(q),
                None => tracing::warn!(
                    question_id = id,
                    test_id = test.id,
                    "test references a missing question"
                ),
            }
        }
        Ok(ordered)
    }

    async fn load_snapshot(&self, key: SessionKey) -> Result<Option<SessionSnapshot>, AppError> {
        let row: Option<(Json<SessionSnapshot>,)> = sqlx::query_as(
            "SELECT state FROM session_snapshots WHERE student_id = $1 AND test_id = $2",
        )
        .bind(key.student_id)
        .bind(key.test_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(state,)| state.0))
    }

    async fn save_snapshot(
        &self,
        key: SessionKey,
        snapshot: &SessionSnapshot,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO session_snapshots (student_id, test_id, state, updated_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (student_id, test_id)
            DO UPDATE SET state = EXCLUDED.state, updated_at = now()
            "#,
        )
        .bind(key.student_id)
        .bind(key.test_id)
        .bind(Json(snapshot))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_snapshot(&self, key: SessionKey) -> Result<(), AppError> {
        sqlx::query("DELETE FROM session_snapshots WHERE student_id = $1 AND test_id = $2")
            .bind(key.student_id)
            .bind(key.test_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_test_record(&self, record: NewTestRecord) -> Result<i64, AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO test_records
                (student, test, score, passing_score, passed,
                 time_completed, time_limit, answer_script, performance_data)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(record.student)
        .bind(record.test)
        .bind(&record.score)
        .bind(&record.passing_score)
        .bind(record.passed)
        .bind(record.time_completed)
        .bind(record.time_limit)
        .bind(Json(&record.answer_script))
        .bind(Json(&record.performance_data))
        .fetch_one(&self.pool)
        .await?;
        Ok(id)
    }

    async fn load_student_aggregates(
        &self,
        student_id: i64,
    ) -> Result<StudentAggregates, AppError> {
        let row = sqlx::query_as::<_, AggregatesRow>(
            "SELECT test_history, test_scores FROM students WHERE id = $1",
        )
        .bind(student_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Student {} not found", student_id)))?;

        Ok(StudentAggregates {
            test_history: row.test_history.0,
            test_scores: row.test_scores.0,
        })
    }

    async fn save_student_aggregates(
        &self,
        student_id: i64,
        aggregates: &StudentAggregates,
    ) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE students SET test_history = $1, test_scores = $2 WHERE id = $3")
            .bind(Json(&aggregates.test_history))
            .bind(Json(&aggregates.test_scores))
            .bind(student_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "Student {} not found",
                student_id
            )));
        }
        Ok(())
    }
}
