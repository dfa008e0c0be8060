//! Recommendation, question-generation, and tutor-chat handlers.
//!
//! These all front the external ML collaborator. Recommendation calls degrade
//! to a locally sampled course list when the service is down; question
//! generation has no meaningful local substitute and surfaces the upstream
//! error instead. Nothing here retries beyond the client's single transport
//! retry, and nothing blocks past the client timeout.

use std::sync::Arc;

use axum::{
  extract::{Query, State},
  Json,
};
use serde_json::{json, Value};
use tracing::{error, instrument};

use crate::error::ApiError;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

const FALLBACK_TOP_N: usize = 5;

fn local_fallback(recommendations: Vec<Value>) -> Value {
  json!({ "recommendations": recommendations, "source": "local_fallback" })
}

#[instrument(level = "info", skip(state))]
pub async fn http_recommend_collaborative(
  State(state): State<Arc<AppState>>,
  Query(q): Query<CollaborativeQuery>,
) -> Result<Json<Value>, ApiError> {
  let user_id = q
    .user_id
    .ok_or_else(|| ApiError::validation("Missing user_id parameter"))?;

  if let Some(ml) = &state.ml {
    match ml.recommend_collaborative(&user_id).await {
      Ok(payload) => return Ok(Json(payload)),
      Err(e) => error!(target: "ml", error = %e, "Collaborative recommendation failed; using local fallback"),
    }
  }
  let recs = logic::local_recommendations(&state, Some(&user_id), None, FALLBACK_TOP_N).await;
  Ok(Json(local_fallback(recs)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_recommend_content(
  State(state): State<Arc<AppState>>,
  Query(q): Query<ContentQuery>,
) -> Result<Json<Value>, ApiError> {
  let course_id = q
    .course_id
    .ok_or_else(|| ApiError::validation("Missing course_id parameter"))?;

  if let Some(ml) = &state.ml {
    match ml.recommend_content(&course_id).await {
      Ok(payload) => return Ok(Json(payload)),
      Err(e) => error!(target: "ml", error = %e, "Content recommendation failed; using local fallback"),
    }
  }
  let recs = logic::local_recommendations(&state, None, Some(&course_id), FALLBACK_TOP_N).await;
  Ok(Json(local_fallback(recs)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_recommend_hybrid(
  State(state): State<Arc<AppState>>,
  Query(q): Query<HybridQuery>,
) -> Result<Json<Value>, ApiError> {
  let (user_id, course_id) = match (q.user_id, q.course_id) {
    (Some(u), Some(c)) => (u, c),
    _ => return Err(ApiError::validation("Missing user_id or course_id parameter")),
  };
  let top_n = q.top_n.unwrap_or(FALLBACK_TOP_N);

  if let Some(ml) = &state.ml {
    match ml.recommend_hybrid(&user_id, &course_id, top_n).await {
      Ok(payload) => return Ok(Json(payload)),
      Err(e) => error!(target: "ml", error = %e, "Hybrid recommendation failed; using local fallback"),
    }
  }
  let recs = logic::local_recommendations(&state, Some(&user_id), Some(&course_id), top_n).await;
  Ok(Json(local_fallback(recs)))
}

#[instrument(level = "info", skip(state, body), fields(content_len = body.course_content.len()))]
pub async fn http_generate_questions(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GenerateIn>,
) -> Result<Json<GenerateOut>, ApiError> {
  if body.course_content.trim().is_empty() {
    return Err(ApiError::validation("Course content is required"));
  }
  let ml = state
    .ml
    .as_ref()
    .ok_or_else(|| ApiError::Upstream("question-generation service is not configured".into()))?;
  let generated = ml.generate_questions(&body.course_content).await?;
  Ok(Json(GenerateOut { questions: generated.questions }))
}

#[instrument(level = "info", skip(state, body), fields(message_len = body.message.len()))]
pub async fn http_chatbot(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ChatIn>,
) -> Result<Json<ChatOut>, ApiError> {
  if body.message.trim().is_empty() {
    return Err(ApiError::validation("Message is required"));
  }
  let response = logic::tutor_reply(&state, body.course_id.as_deref(), &body.message).await;
  Ok(Json(ChatOut { response }))
}
