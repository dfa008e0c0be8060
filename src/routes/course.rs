//! Course, enrollment, learning-mode, and watch-progress handlers.

use std::sync::Arc;

use axum::{
  extract::{Path, State},
  http::StatusCode,
  Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::domain::{LearningMode, UserCoursePreference};
use crate::error::ApiError;
use crate::logic;
use crate::protocol::*;
use crate::state::AppState;

#[instrument(level = "info", skip(state), fields(user_id = %identity.user_id))]
pub async fn http_list_courses(
  State(state): State<Arc<AppState>>,
  identity: Identity,
) -> Json<Vec<CourseOut>> {
  let courses = state.courses.list().await;
  let out = courses
    .into_iter()
    .map(|course| {
      let is_enrolled = course.enrolled_students.iter().any(|id| *id == identity.user_id);
      CourseOut { course, is_enrolled }
    })
    .collect();
  Json(out)
}

#[instrument(level = "info", skip(state, body), fields(user_id = %identity.user_id, role = ?identity.role, title = %body.title, video_count = body.video_links.len()))]
pub async fn http_create_course(
  State(state): State<Arc<AppState>>,
  identity: Identity,
  Json(body): Json<CreateCourseIn>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
  let videos = body
    .video_links
    .into_iter()
    .enumerate()
    .map(|(i, v)| logic::normalize_video(i, v.title, v.url, v.source, v.thumbnail))
    .collect();
  let course =
    logic::create_course(&state, body.title, body.description, videos, body.text_resources).await?;
  info!(target: "elearn_backend", id = %course.id, "Course created");
  Ok((StatusCode::CREATED, Json(json!(course))))
}

#[instrument(level = "info", skip(state), fields(%id, user_id = %identity.user_id))]
pub async fn http_get_course(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  identity: Identity,
) -> Result<Json<CourseDetailOut>, ApiError> {
  let course = state.courses.get_or_not_found(&id).await?;
  let is_enrolled = course.enrolled_students.iter().any(|s| *s == identity.user_id);

  // Progress and preference are per-user extras; an id the user store can't
  // resolve just renders them empty rather than failing the whole page.
  let user_progress = state
    .users
    .get(&identity.user_id)
    .await
    .and_then(|u| u.course_progress.get(&id).map(|p| p.watched.clone()))
    .unwrap_or_default();
  let percent_complete = logic::percent_complete(&user_progress, &course.videos);

  let pref_key = UserCoursePreference::key_for(&identity.user_id, &id);
  let learning_mode_preference = state
    .preferences
    .get(&pref_key)
    .await
    .map(|p| p.learning_mode.as_str());

  Ok(Json(CourseDetailOut {
    course,
    is_enrolled,
    user_progress,
    percent_complete,
    learning_mode_preference,
  }))
}

#[instrument(level = "info", skip(state), fields(%id, user_id = %identity.user_id))]
pub async fn http_enroll(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  identity: Identity,
) -> Result<Json<Value>, ApiError> {
  logic::enroll(&state, &identity.user_id, &id).await?;
  Ok(Json(json!({ "message": "Enrolled successfully" })))
}

#[instrument(level = "info", skip(state), fields(%id, user_id = %identity.user_id))]
pub async fn http_get_learning_mode(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  identity: Identity,
) -> Result<Json<LearningModeOut>, ApiError> {
  let key = UserCoursePreference::key_for(&identity.user_id, &id);
  let pref = state.preferences.get_or_not_found(&key).await?;
  Ok(Json(LearningModeOut { learning_mode: pref.learning_mode.as_str() }))
}

#[instrument(level = "info", skip(state, body), fields(%id, user_id = %identity.user_id, mode = %body.learning_mode))]
pub async fn http_set_learning_mode(
  State(state): State<Arc<AppState>>,
  Path(id): Path<String>,
  identity: Identity,
  Json(body): Json<LearningModeIn>,
) -> Result<Json<Value>, ApiError> {
  let mode = LearningMode::parse(&body.learning_mode)?;
  state.courses.get_or_not_found(&id).await?;

  // Upsert on the unique (user, course) key.
  let key = UserCoursePreference::key_for(&identity.user_id, &id);
  let pref = UserCoursePreference {
    user_id: identity.user_id.clone(),
    course_id: id,
    learning_mode: mode,
    updated_at: Utc::now(),
  };
  state.preferences.upsert(&key, pref).await;
  Ok(Json(json!({ "message": "Preference saved", "learningMode": mode.as_str() })))
}

#[instrument(level = "info", skip(state, body), fields(%course_id, user_id = %identity.user_id, video = %body.video_title))]
pub async fn http_mark_watched(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
  identity: Identity,
  Json(body): Json<WatchedIn>,
) -> Result<Json<WatchedOut>, ApiError> {
  let watched =
    logic::mark_video_watched(&state, &identity.user_id, &course_id, &body.video_title).await?;
  Ok(Json(WatchedOut { watched }))
}

#[instrument(level = "info", skip(state), fields(%course_id, user_id = %identity.user_id))]
pub async fn http_get_progress(
  State(state): State<Arc<AppState>>,
  Path(course_id): Path<String>,
  identity: Identity,
) -> Result<Json<ProgressOut>, ApiError> {
  let (watched, percent_complete) =
    logic::progress_view(&state, &identity.user_id, &course_id).await?;
  Ok(Json(ProgressOut { watched, percent_complete }))
}
