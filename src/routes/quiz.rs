//! Quiz endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented; logs include parameters and basic result info.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::StatusCode,
  Json,
};
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::error::ApiError;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state, body), fields(title = %body.title, question_count = body.questions.len()))]
pub async fn http_create_quiz(
  State(state): State<Arc<AppState>>,
  Json(body): Json<CreateQuizIn>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
  let quiz = logic::create_quiz(&state, body.title, body.description, body.questions).await?;
  info!(target: "quiz", id = %quiz.id, "Quiz created");
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Quiz created successfully!", "quiz": to_quiz_out(&quiz) })),
  ))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_quizzes(
  State(state): State<Arc<AppState>>,
) -> Json<Vec<QuizOut>> {
  let quizzes = state.quizzes.list().await;
  Json(quizzes.iter().map(to_quiz_out).collect())
}

#[instrument(level = "info", skip(state), fields(%id))]
pub async fn http_get_quiz(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
) -> Result<Json<QuizOut>, ApiError> {
  let quiz = state.quizzes.get_or_not_found(&id).await?;
  Ok(Json(to_quiz_out(&quiz)))
}

#[instrument(level = "info", skip(state, body), fields(%id, user_id = %identity.user_id, answer_count = body.answers.len()))]
pub async fn http_submit_quiz(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  identity: Identity,
  Json(body): Json<SubmitIn>,
) -> Result<Json<SubmitOut>, ApiError> {
  let attempt = logic::submit_quiz(&state, &identity.user_id, &id, body.answers).await?;
  Ok(Json(SubmitOut {
    score: attempt.score,
    total: attempt.total,
    xp_earned: attempt.xp_earned,
    attempt_id: attempt.id,
  }))
}

#[instrument(level = "info", skip(state), fields(user_id = %identity.user_id))]
pub async fn http_list_attempts(
  State(state): State<Arc<AppState>>,
  identity: Identity,
) -> Json<Vec<AttemptOut>> {
  let attempts = logic::attempts_for_user(&state, &identity.user_id).await;
  let mut out = Vec::with_capacity(attempts.len());
  for attempt in &attempts {
    let title = state
      .quizzes
      .get(&attempt.quiz_id)
      .await
      .map(|q| q.title)
      .unwrap_or_else(|| "Quiz".into());
    out.push(to_attempt_out(attempt, title));
  }
  Json(out)
}

#[instrument(level = "info", skip(state), fields(%id, user_id = %identity.user_id))]
pub async fn http_get_attempt(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  identity: Identity,
) -> Result<Json<AttemptOut>, ApiError> {
  let attempt = state.attempts.get_or_not_found(&id).await?;
  // Attempts are owner-scoped; leak nothing about other users' history.
  if attempt.user_id != identity.user_id {
    return Err(ApiError::NotFound("Attempt"));
  }
  let title = state
    .quizzes
    .get(&attempt.quiz_id)
    .await
    .map(|q| q.title)
    .unwrap_or_else(|| "Quiz".into());
  Ok(Json(to_attempt_out(&attempt, title)))
}
