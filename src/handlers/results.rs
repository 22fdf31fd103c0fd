// src/handlers/results.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::PgPool;

use crate::{
    error::AppError,
    models::test_record::{TestRecord, TestRecordSummary},
    utils::jwt::Claims,
};

/// Lists the authenticated student's results, newest first, without
/// decoding the answer scripts.
pub async fn list_my_results(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let student_id = claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))?;

    let records = sqlx::query_as::<_, TestRecordSummary>(
        r#"
        SELECT id, test, score, passed, time_completed
        FROM test_records
        WHERE student = $1
        ORDER BY time_completed DESC
        "#,
    )
    .bind(student_id)
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to list test records: {:?}", e);
        AppError::InternalServerError(e.to_string())
    })?;

    Ok(Json(records))
}

/// Returns one full test record including the answer script.
/// Students may only read their own records; admins may read any.
pub async fn get_result(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Path(record_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let record = sqlx::query_as::<_, TestRecord>(
        r#"
        SELECT id, student, test, score, passing_score, passed,
               time_completed, time_limit, answer_script, performance_data
        FROM test_records
        WHERE id = $1
        "#,
    )
    .bind(record_id)
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Test record {} not found", record_id)))?;

    let is_owner = claims.sub.parse::<i64>().is_ok_and(|id| id == record.student);
    if !is_owner && claims.role != "admin" {
        return Err(AppError::Forbidden(
            "You may only view your own results".to_string(),
        ));
    }

    Ok(Json(record))
}
