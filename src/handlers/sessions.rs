// src/handlers/sessions.rs
//
// Student-facing endpoints driving the test session state machine.
// Every mutation writes the resume snapshot through (best-effort) and
// returns the refreshed session view.

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::question::{AnswerOption, PublicQuestion},
    session::{Phase, SessionKey, SharedSession, SubmissionOutcome, TestSession, pipeline},
    state::AppState,
    utils::jwt::Claims,
};

/// What the client renders: current question (with the correct answer
/// withheld), cursor, countdown and the question-map coloring data.
#[derive(Debug, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    pub remaining_seconds: i64,
    pub time_limit_seconds: i64,
    pub current_index: usize,
    pub total_questions: usize,
    pub question: PublicQuestion,
    pub selected_answer: Option<AnswerOption>,
    pub marked: bool,
    pub answered_count: usize,
    pub map: Vec<MapEntry>,
    pub result: Option<SubmissionOutcome>,
}

#[derive(Debug, Serialize)]
pub struct MapEntry {
    pub index: usize,
    pub question_id: i64,
    pub answered: bool,
    pub marked: bool,
    pub current: bool,
}

fn view(session: &TestSession) -> SessionView {
    let current = session.current_question();
    let map = session
        .questions()
        .iter()
        .enumerate()
        .map(|(index, q)| MapEntry {
            index,
            question_id: q.id,
            answered: session.selected_answer(q.id).is_some(),
            marked: session.is_marked(q.id),
            current: index == session.cursor(),
        })
        .collect();

    SessionView {
        phase: session.phase(),
        remaining_seconds: session.remaining_secs(),
        time_limit_seconds: session.test().time_limit_seconds(),
        current_index: session.cursor(),
        total_questions: session.questions().len(),
        question: PublicQuestion::from(current),
        selected_answer: session.selected_answer(current.id),
        marked: session.is_marked(current.id),
        answered_count: session.answers().len(),
        map,
        result: session.outcome().copied(),
    }
}

fn student_id(claims: &Claims) -> Result<i64, AppError> {
    claims
        .sub
        .parse::<i64>()
        .map_err(|_| AppError::AuthError("Invalid token subject".to_string()))
}

async fn active_session(
    state: &AppState,
    claims: &Claims,
    test_id: i64,
) -> Result<(SessionKey, SharedSession), AppError> {
    let key = SessionKey::new(student_id(claims)?, test_id);
    let session = state
        .sessions
        .get(key)
        .await
        .ok_or_else(|| AppError::NotFound("No active session for this test".to_string()))?;
    Ok((key, session))
}

/// Write-through persistence of the resume snapshot. Failure is
/// non-fatal: the session proceeds and the miss is logged.
async fn persist_snapshot(state: &AppState, key: SessionKey, session: &TestSession) {
    let snapshot = session.snapshot();
    if let Err(e) = state.store.save_snapshot(key, &snapshot).await {
        tracing::warn!(
            student_id = key.student_id,
            test_id = key.test_id,
            "snapshot write failed: {}",
            e
        );
    }
}

/// Starts a session for (student, test), or joins the live one if it
/// already exists (second tab, page reload mid-session).
pub async fn start_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let key = SessionKey::new(student_id(&claims)?, test_id);
    let session = state.sessions.start(state.store.clone(), key).await?;
    let session = session.lock().await;
    persist_snapshot(&state, key, &session).await;
    Ok(Json(view(&session)))
}

pub async fn get_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (_, session) = active_session(&state, &claims, test_id).await?;
    let session = session.lock().await;
    Ok(Json(view(&session)))
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub question_id: i64,
    /// Must be one of option_a / option_b / option_c; anything else is
    /// rejected during deserialization.
    pub option: AnswerOption,
}

pub async fn answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (key, session) = active_session(&state, &claims, test_id).await?;
    let mut session = session.lock().await;
    session.select_option(payload.question_id, payload.option)?;
    persist_snapshot(&state, key, &session).await;
    Ok(Json(view(&session)))
}

#[derive(Debug, Deserialize)]
pub struct MarkRequest {
    pub question_id: i64,
}

pub async fn mark(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
    Json(payload): Json<MarkRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (key, session) = active_session(&state, &claims, test_id).await?;
    let mut session = session.lock().await;
    session.toggle_review(payload.question_id)?;
    persist_snapshot(&state, key, &session).await;
    Ok(Json(view(&session)))
}

#[derive(Debug, Deserialize)]
pub struct GotoRequest {
    pub index: usize,
}

pub async fn goto(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
    Json(payload): Json<GotoRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (key, session) = active_session(&state, &claims, test_id).await?;
    let mut session = session.lock().await;
    session.go_to(payload.index)?;
    persist_snapshot(&state, key, &session).await;
    Ok(Json(view(&session)))
}

pub async fn next(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (key, session) = active_session(&state, &claims, test_id).await?;
    let mut session = session.lock().await;
    session.next()?;
    persist_snapshot(&state, key, &session).await;
    Ok(Json(view(&session)))
}

pub async fn previous(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (key, session) = active_session(&state, &claims, test_id).await?;
    let mut session = session.lock().await;
    session.previous()?;
    persist_snapshot(&state, key, &session).await;
    Ok(Json(view(&session)))
}

#[derive(Debug, Deserialize)]
pub struct MapRequest {
    pub show: bool,
}

/// Toggles the question-map overlay; timer and answers are untouched.
pub async fn toggle_map(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
    Json(payload): Json<MapRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (_, session) = active_session(&state, &claims, test_id).await?;
    let mut session = session.lock().await;
    if payload.show {
        session.show_map()?;
    } else {
        session.hide_map()?;
    }
    Ok(Json(view(&session)))
}

pub async fn finalize(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (_, session) = active_session(&state, &claims, test_id).await?;
    let mut session = session.lock().await;
    session.begin_finalize()?;
    Ok(Json(view(&session)))
}

pub async fn cancel_finalize(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (_, session) = active_session(&state, &claims, test_id).await?;
    let mut session = session.lock().await;
    session.cancel_finalize()?;
    Ok(Json(view(&session)))
}

/// Confirmed submission. Safe to race the timer expiry: the session's
/// status guard makes the pipeline run exactly once, and a repeat call
/// answers with the recorded outcome.
pub async fn submit(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (key, session) = active_session(&state, &claims, test_id).await?;
    let outcome = {
        let mut session = session.lock().await;
        pipeline::submit(state.store.as_ref(), &mut session, Utc::now()).await?
    };
    state.sessions.finish(key).await;
    Ok(Json(outcome))
}
