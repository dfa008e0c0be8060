//! Domain records persisted by the document stores: users, courses, quizzes,
//! attempts, discussions, and per-(user, course) learning-mode preferences.
//!
//! Wire names are camelCase to match the SPA (`xpEarned`, `attemptedAt`, ...).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Account role. The identity collaborator decides this; we only store it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
  Student,
  Teacher,
  Admin,
}
impl Default for Role {
  fn default() -> Self { Role::Student }
}

impl Role {
  /// Lenient parse used for the identity header; anything unknown is a student.
  pub fn parse_or_student(s: &str) -> Role {
    match s {
      "teacher" => Role::Teacher,
      "admin" => Role::Admin,
      _ => Role::Student,
    }
  }
}

/// Watched-video bookkeeping for one (user, course) pair.
/// `watched` keeps insertion order but has set semantics: a title appears
/// at most once.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CourseProgress {
  #[serde(default)]
  pub watched: Vec<String>,
}

/// User record. `level` is derived from `xp` by the leveling engine and must
/// never be mutated anywhere else.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
  pub id: String,
  pub name: String,
  pub email: String,
  /// Already hashed by the identity collaborator; opaque here.
  #[serde(default)]
  pub password_hash: String,
  #[serde(default)]
  pub role: Role,
  #[serde(default)]
  pub xp: u32,
  #[serde(default = "default_level")]
  pub level: u32,
  /// course-id -> watched videos. This record is the single owner of
  /// progress data; courses carry no copy of it.
  #[serde(default)]
  pub course_progress: HashMap<String, CourseProgress>,
  pub created_at: DateTime<Utc>,
}

fn default_level() -> u32 { 1 }

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VideoSource {
  Youtube,
  Upload,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Video {
  pub title: String,
  pub url: String,
  pub source: VideoSource,
  pub thumbnail: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TextResource {
  pub title: String,
  pub url: String,
  #[serde(default)]
  pub summary: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
  pub id: String,
  pub title: String,
  pub description: String,
  #[serde(default)]
  pub videos: Vec<Video>,
  #[serde(default)]
  pub text_resources: Vec<TextResource>,
  /// No duplicate ids; enrollment is idempotent.
  #[serde(default)]
  pub enrolled_students: Vec<String>,
}

/// Quiz question. The shape is decided at creation time, never inferred from
/// which optional fields happen to be present on a request.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Question {
  MultipleChoice {
    question: String,
    options: Vec<String>,
    #[serde(rename = "correctAnswer")]
    correct_answer: String,
  },
  FillInBlank {
    question: String,
    #[serde(rename = "correctAnswer")]
    correct_answer: String,
  },
  /// Open-ended; carries tutor guidance instead of a gradable answer.
  Descriptive {
    question: String,
    #[serde(default)]
    guidance: String,
  },
}

impl Question {
  pub fn text(&self) -> &str {
    match self {
      Question::MultipleChoice { question, .. } => question,
      Question::FillInBlank { question, .. } => question,
      Question::Descriptive { question, .. } => question,
    }
  }

  pub fn options(&self) -> &[String] {
    match self {
      Question::MultipleChoice { options, .. } => options,
      _ => &[],
    }
  }

  /// The machine-gradable answer, if this question type has one.
  pub fn correct_answer(&self) -> Option<&str> {
    match self {
      Question::MultipleChoice { correct_answer, .. } => Some(correct_answer),
      Question::FillInBlank { correct_answer, .. } => Some(correct_answer),
      Question::Descriptive { .. } => None,
    }
  }

  pub fn kind(&self) -> &'static str {
    match self {
      Question::MultipleChoice { .. } => "multiple_choice",
      Question::FillInBlank { .. } => "fill_in_blank",
      Question::Descriptive { .. } => "descriptive",
    }
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
  pub id: String,
  pub title: String,
  pub description: String,
  pub questions: Vec<Question>,
}

/// One immutable grading event. Append-only: no update or delete exists.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizAttempt {
  pub id: String,
  pub user_id: String,
  pub quiz_id: String,
  pub answers: Vec<String>,
  pub score: u32,
  pub total: u32,
  pub xp_earned: u32,
  pub attempted_at: DateTime<Utc>,
}

/// Preferred content format for one (user, course) pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LearningMode {
  Video,
  Text,
}

impl LearningMode {
  /// Strict parse: anything outside the enum is a validation error, as the
  /// preference endpoint promises.
  pub fn parse(s: &str) -> Result<LearningMode, ApiError> {
    match s {
      "video" => Ok(LearningMode::Video),
      "text" => Ok(LearningMode::Text),
      other => Err(ApiError::validation(format!("Invalid learning mode: {other}"))),
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      LearningMode::Video => "video",
      LearningMode::Text => "text",
    }
  }
}

/// Stored under the composite key `"{user_id}:{course_id}"`, which is what
/// makes the pair unique at the store level.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserCoursePreference {
  pub user_id: String,
  pub course_id: String,
  pub learning_mode: LearningMode,
  pub updated_at: DateTime<Utc>,
}

impl UserCoursePreference {
  pub fn key_for(user_id: &str, course_id: &str) -> String {
    format!("{user_id}:{course_id}")
  }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
  pub user_id: String,
  pub text: String,
  pub timestamp: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Discussion {
  pub id: String,
  pub title: String,
  pub content: String,
  pub author: String,
  pub course_id: String,
  #[serde(default)]
  pub comments: Vec<Comment>,
  #[serde(default)]
  pub upvotes: u32,
  #[serde(default)]
  pub downvotes: u32,
  pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn question_tag_decides_gradability() {
    let q: Question = serde_json::from_str(
      r#"{"type":"descriptive","question":"Explain closures.","guidance":"Mention scope."}"#,
    )
    .expect("parse");
    assert_eq!(q.kind(), "descriptive");
    assert!(q.correct_answer().is_none());

    let q: Question = serde_json::from_str(
      r#"{"type":"fill_in_blank","question":"2+2=?","correctAnswer":"4"}"#,
    )
    .expect("parse");
    assert_eq!(q.correct_answer(), Some("4"));
    assert!(q.options().is_empty());
  }

  #[test]
  fn learning_mode_parse_is_strict() {
    assert_eq!(LearningMode::parse("video").unwrap(), LearningMode::Video);
    assert_eq!(LearningMode::parse("text").unwrap(), LearningMode::Text);
    assert!(LearningMode::parse("audio").is_err());
  }
}
