//! Leaderboard and discussion handlers.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::StatusCode,
  Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::domain::{Comment, Discussion};
use crate::error::ApiError;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

const DEFAULT_TOP_N: usize = 10;

#[instrument(level = "info", skip(state), fields(top_n = q.top_n.unwrap_or(DEFAULT_TOP_N)))]
pub async fn http_leaderboard(
  State(state): State<Arc<AppState>>,
  Query(q): Query<LeaderboardQuery>,
) -> Json<Vec<LeaderboardRow>> {
  let top = logic::leaderboard(&state, q.top_n.unwrap_or(DEFAULT_TOP_N)).await;
  Json(top.iter().map(to_leaderboard_row).collect())
}

/// Direct XP grant. Quiz submission derives XP itself; this is the explicit
/// admin/testing hook the SPA's add-xp call uses.
#[instrument(level = "info", skip(state, body), fields(user_id = %body.user_id, xp = body.xp_earned))]
pub async fn http_add_xp(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AddXpIn>,
) -> Result<Json<AddXpOut>, ApiError> {
  let (xp, level) = logic::apply_xp(&state, &body.user_id, body.xp_earned).await?;
  Ok(Json(AddXpOut { xp, level }))
}

#[instrument(level = "info", skip(state, body), fields(user_id = %identity.user_id, course_id = %body.course_id))]
pub async fn http_create_discussion(
  State(state): State<Arc<AppState>>,
  identity: Identity,
  Json(body): Json<DiscussionCreateIn>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
  if body.title.trim().is_empty() || body.content.trim().is_empty() {
    return Err(ApiError::validation("Discussion title and content are required"));
  }
  state.courses.get_or_not_found(&body.course_id).await?;

  let discussion = Discussion {
    id: Uuid::new_v4().to_string(),
    title: body.title,
    content: body.content,
    author: identity.user_id,
    course_id: body.course_id,
    comments: vec![],
    upvotes: 0,
    downvotes: 0,
    created_at: Utc::now(),
  };
  state.discussions.insert(&discussion.id, discussion.clone()).await?;
  info!(target: "elearn_backend", id = %discussion.id, "Discussion created");
  Ok((
    StatusCode::CREATED,
    Json(json!({ "message": "Discussion created successfully", "discussion": discussion })),
  ))
}

#[instrument(level = "info", skip(state), fields(%course_id))]
pub async fn http_list_discussions(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
) -> Json<Vec<Discussion>> {
  let mut threads: Vec<Discussion> = state
    .discussions
    .list()
    .await
    .into_iter()
    .filter(|d| d.course_id == course_id)
    .collect();
  threads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
  Json(threads)
}

#[instrument(level = "info", skip(state, body), fields(%id, user_id = %identity.user_id, text_len = body.text.len()))]
pub async fn http_add_comment(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  identity: Identity,
  Json(body): Json<CommentIn>,
) -> Result<Json<Discussion>, ApiError> {
  if body.text.trim().is_empty() {
    return Err(ApiError::validation("Comment text is required"));
  }
  let updated = state
    .discussions
    .update(&id, |d| {
      d.comments.push(Comment {
        user_id: identity.user_id.clone(),
        text: body.text.clone(),
        timestamp: Utc::now(),
      });
      d.clone()
    })
    .await?;
  Ok(Json(updated))
}

#[instrument(level = "info", skip(state, body), fields(%id, direction = %body.direction))]
pub async fn http_vote(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  Json(body): Json<VoteIn>,
) -> Result<Json<Value>, ApiError> {
  let up = match body.direction.as_str() {
    "up" => true,
    "down" => false,
    other => {
      return Err(ApiError::validation(format!("Invalid vote direction: {other}")));
    }
  };
  let (upvotes, downvotes) = state
    .discussions
    .update(&id, |d| {
      if up {
        d.upvotes += 1;
      } else {
        d.downvotes += 1;
      }
      (d.upvotes, d.downvotes)
    })
    .await?;
  Ok(Json(json!({ "upvotes": upvotes, "downvotes": downvotes })))
}
