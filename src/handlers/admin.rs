// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use sqlx::types::Json as SqlJson;
use validator::Validate;

use crate::{
    error::AppError,
    models::{
        question::{CreateQuestionRequest, Question, UpdateQuestionRequest},
        student::Student,
        test::{CreateTestRequest, Test, UpdateTestRequest},
    },
    utils::html::clean_html,
};

/// Every question id a test references must exist; `found` is the
/// matching-row count the database reported for the requested ids.
pub fn ensure_all_questions_found(requested: &[i64], found: i64) -> Result<(), AppError> {
    if found as usize != requested.len() {
        return Err(AppError::BadRequest(
            "One or more question ids do not exist".to_string(),
        ));
    }
    Ok(())
}

// --- tests ---------------------------------------------------------

/// Lists all tests, including inactive ones.
/// Admin only.
pub async fn list_tests(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let tests = sqlx::query_as::<_, Test>(
        r#"
        SELECT id, name, description, passing_score, time_limit, is_active, questions, created_at
        FROM tests
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list tests: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(tests))
}

/// Creates a new test.
/// Admin only.
pub async fn create_test(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE id = ANY($1)")
        .bind(&payload.questions)
        .fetch_one(&pool)
        .await?;
    ensure_all_questions_found(&payload.questions, found)?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO tests (name, description, passing_score, time_limit, is_active, questions)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id
        "#,
    )
    .bind(&payload.name)
    .bind(&payload.description)
    .bind(payload.passing_score)
    .bind(payload.time_limit)
    .bind(payload.is_active)
    .bind(SqlJson(&payload.questions))
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create test: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Updates a test. Fields are applied sequentially if present.
/// Admin only.
pub async fn update_test(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    let _exists: i64 = sqlx::query_scalar("SELECT id FROM tests WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Test not found".to_string()))?;

    if let Some(name) = payload.name {
        sqlx::query("UPDATE tests SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(id)
            .execute(&pool)
            .await?;
    }
    if let Some(description) = payload.description {
        sqlx::query("UPDATE tests SET description = $1 WHERE id = $2")
            .bind(description)
            .bind(id)
            .execute(&pool)
            .await?;
    }
    if let Some(passing_score) = payload.passing_score {
        if !(0..=100).contains(&passing_score) {
            return Err(AppError::BadRequest(
                "passing_score must be between 0 and 100".to_string(),
            ));
        }
        sqlx::query("UPDATE tests SET passing_score = $1 WHERE id = $2")
            .bind(passing_score)
            .bind(id)
            .execute(&pool)
            .await?;
    }
    if let Some(time_limit) = payload.time_limit {
        if time_limit < 1 {
            return Err(AppError::BadRequest(
                "time_limit must be at least 1 minute".to_string(),
            ));
        }
        sqlx::query("UPDATE tests SET time_limit = $1 WHERE id = $2")
            .bind(time_limit)
            .bind(id)
            .execute(&pool)
            .await?;
    }
    if let Some(questions) = payload.questions {
        if questions.is_empty() {
            return Err(AppError::BadRequest(
                "A test must have at least one question".to_string(),
            ));
        }
        let found: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE id = ANY($1)")
            .bind(&questions)
            .fetch_one(&pool)
            .await?;
        ensure_all_questions_found(&questions, found)?;
        sqlx::query("UPDATE tests SET questions = $1 WHERE id = $2")
            .bind(SqlJson(&questions))
            .bind(id)
            .execute(&pool)
            .await?;
    }
    if let Some(is_active) = payload.is_active {
        sqlx::query("UPDATE tests SET is_active = $1 WHERE id = $2")
            .bind(is_active)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    Ok(Json(serde_json::json!({"message": "Test updated"})))
}

/// Deletes a test.
/// Admin only.
pub async fn delete_test(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM tests WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Test not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- questions -----------------------------------------------------

/// Lists the full question bank (correct answers included).
/// Admin only.
pub async fn list_questions(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question_text, option_a, option_b, option_c,
               correct_answer, category, explanation, image, created_at
        FROM questions
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list questions: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(questions))
}

/// Creates a new question. Free-text fields are sanitized against
/// stored XSS before they reach the database.
/// Admin only.
pub async fn create_question(
    State(pool): State<PgPool>,
    Json(payload): Json<CreateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO questions
            (question_text, option_a, option_b, option_c, correct_answer, category, explanation, image)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id
        "#,
    )
    .bind(clean_html(&payload.question_text))
    .bind(clean_html(&payload.option_a))
    .bind(clean_html(&payload.option_b))
    .bind(clean_html(&payload.option_c))
    .bind(payload.correct_answer.as_str())
    .bind(&payload.category)
    .bind(payload.explanation.as_deref().map(clean_html))
    .bind(&payload.image)
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok((StatusCode::CREATED, Json(serde_json::json!({"id": id}))))
}

/// Updates a question. Fields are applied sequentially if present.
/// Admin only.
pub async fn update_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let _exists: i64 = sqlx::query_scalar("SELECT id FROM questions WHERE id = $1")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Question not found".to_string()))?;

    if let Some(question_text) = payload.question_text {
        sqlx::query("UPDATE questions SET question_text = $1 WHERE id = $2")
            .bind(clean_html(&question_text))
            .bind(id)
            .execute(&pool)
            .await?;
    }
    if let Some(option_a) = payload.option_a {
        sqlx::query("UPDATE questions SET option_a = $1 WHERE id = $2")
            .bind(clean_html(&option_a))
            .bind(id)
            .execute(&pool)
            .await?;
    }
    if let Some(option_b) = payload.option_b {
        sqlx::query("UPDATE questions SET option_b = $1 WHERE id = $2")
            .bind(clean_html(&option_b))
            .bind(id)
            .execute(&pool)
            .await?;
    }
    if let Some(option_c) = payload.option_c {
        sqlx::query("UPDATE questions SET option_c = $1 WHERE id = $2")
            .bind(clean_html(&option_c))
            .bind(id)
            .execute(&pool)
            .await?;
    }
    if let Some(correct_answer) = payload.correct_answer {
        sqlx::query("UPDATE questions SET correct_answer = $1 WHERE id = $2")
            .bind(correct_answer.as_str())
            .bind(id)
            .execute(&pool)
            .await?;
    }
    if let Some(category) = payload.category {
        sqlx::query("UPDATE questions SET category = $1 WHERE id = $2")
            .bind(category)
            .bind(id)
            .execute(&pool)
            .await?;
    }
    if let Some(explanation) = payload.explanation {
        sqlx::query("UPDATE questions SET explanation = $1 WHERE id = $2")
            .bind(clean_html(&explanation))
            .bind(id)
            .execute(&pool)
            .await?;
    }
    if let Some(image) = payload.image {
        sqlx::query("UPDATE questions SET image = $1 WHERE id = $2")
            .bind(image)
            .bind(id)
            .execute(&pool)
            .await?;
    }

    Ok(Json(serde_json::json!({"message": "Question updated"})))
}

/// Deletes a question.
/// Admin only.
pub async fn delete_question(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- students ------------------------------------------------------

/// Lists all students with their aggregate maps.
/// Admin only.
pub async fn list_students(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let students = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, name, email, test_history, test_scores, created_at
        FROM students
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list students: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(students))
}

/// Returns one student with history and per-test score trackers.
/// Admin only.
pub async fn get_student(
    State(pool): State<PgPool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let student = sqlx::query_as::<_, Student>(
        r#"
        SELECT id, name, email, test_history, test_scores, created_at
        FROM students
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Student {} not found", id)))?;

    Ok(Json(student))
}
