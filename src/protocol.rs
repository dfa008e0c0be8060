//! Public protocol structs for the HTTP and WebSocket endpoints (serde ready),
//! plus the request identity extractor.
//! Keep this small and stable to evolve backend and frontend independently.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Course, Question, Quiz, QuizAttempt, Role, TextResource, User};
use crate::error::ApiError;

/// Authenticated caller, as asserted by the identity collaborator in front of
/// this service. The id is trusted verbatim; we only parse it out of the
/// headers it sets.
#[derive(Clone, Debug)]
pub struct Identity {
    pub user_id: String,
    pub role: Role,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("x-user-id")
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| ApiError::validation("Missing x-user-id header"))?
            .to_string();
        let role = parts
            .headers
            .get("x-user-role")
            .and_then(|v| v.to_str().ok())
            .map(Role::parse_or_student)
            .unwrap_or_default();
        Ok(Identity { user_id, role })
    }
}

//
// Quiz DTOs
//

/// Client-facing question: text, type tag, and options. Correct answers stay
/// server-side; grading happens on submit only.
#[derive(Debug, Serialize)]
pub struct QuestionOut {
    pub question: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub options: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct QuizOut {
    pub id: String,
    pub title: String,
    pub description: String,
    pub questions: Vec<QuestionOut>,
}

/// Convert a stored quiz to the public DTO, stripping answers.
pub fn to_quiz_out(quiz: &Quiz) -> QuizOut {
    QuizOut {
        id: quiz.id.clone(),
        title: quiz.title.clone(),
        description: quiz.description.clone(),
        questions: quiz
            .questions
            .iter()
            .map(|q| QuestionOut {
                question: q.text().to_string(),
                kind: q.kind(),
                options: q.options().to_vec(),
            })
            .collect(),
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateQuizIn {
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitIn {
    pub answers: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOut {
    pub score: u32,
    pub total: u32,
    pub xp_earned: u32,
    pub attempt_id: String,
}

/// Attempt record plus the quiz title the history page displays.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttemptOut {
    pub id: String,
    pub quiz_id: String,
    pub quiz_title: String,
    pub answers: Vec<String>,
    pub score: u32,
    pub total: u32,
    pub xp_earned: u32,
    pub attempted_at: DateTime<Utc>,
}

pub fn to_attempt_out(attempt: &QuizAttempt, quiz_title: String) -> AttemptOut {
    AttemptOut {
        id: attempt.id.clone(),
        quiz_id: attempt.quiz_id.clone(),
        quiz_title,
        answers: attempt.answers.clone(),
        score: attempt.score,
        total: attempt.total,
        xp_earned: attempt.xp_earned,
        attempted_at: attempt.attempted_at,
    }
}

//
// Course DTOs
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoLinkIn {
    #[serde(default)]
    pub title: Option<String>,
    pub url: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCourseIn {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub video_links: Vec<VideoLinkIn>,
    #[serde(default)]
    pub text_resources: Vec<TextResource>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseOut {
    #[serde(flatten)]
    pub course: Course,
    pub is_enrolled: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetailOut {
    #[serde(flatten)]
    pub course: Course,
    pub is_enrolled: bool,
    pub user_progress: Vec<String>,
    pub percent_complete: u32,
    pub learning_mode_preference: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningModeIn {
    pub learning_mode: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningModeOut {
    pub learning_mode: &'static str,
}

//
// Progress DTOs
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchedIn {
    pub video_title: String,
}

#[derive(Debug, Serialize)]
pub struct WatchedOut {
    pub watched: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressOut {
    pub watched: Vec<String>,
    pub percent_complete: u32,
}

//
// Leaderboard DTOs
//

#[derive(Debug, Deserialize)]
pub struct LeaderboardQuery {
    pub top_n: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct LeaderboardRow {
    pub name: String,
    pub xp: u32,
    pub level: u32,
}

pub fn to_leaderboard_row(user: &User) -> LeaderboardRow {
    LeaderboardRow {
        name: user.name.clone(),
        xp: user.xp,
        level: user.level,
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddXpIn {
    pub user_id: String,
    pub xp_earned: u32,
}

#[derive(Debug, Serialize)]
pub struct AddXpOut {
    pub xp: u32,
    pub level: u32,
}

//
// Discussion DTOs
//

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionCreateIn {
    pub title: String,
    pub content: String,
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CommentIn {
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct VoteIn {
    pub direction: String,
}

//
// Recommendation / ML DTOs
//

#[derive(Debug, Deserialize)]
pub struct CollaborativeQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ContentQuery {
    pub course_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct HybridQuery {
    pub user_id: Option<String>,
    pub course_id: Option<String>,
    pub top_n: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateIn {
    pub course_content: String,
}

#[derive(Debug, Serialize)]
pub struct GenerateOut {
    pub questions: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChatIn {
    pub message: String,
    #[serde(default, rename = "courseId")]
    pub course_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ChatOut {
    pub response: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

//
// WebSocket protocol
//

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    TutorAsk {
        #[serde(default, rename = "courseId")]
        course_id: Option<String>,
        text: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    TutorReply { text: String },
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seeds::seed_quizzes;

    #[test]
    fn quiz_dto_never_exposes_correct_answers() {
        for quiz in seed_quizzes() {
            let out = serde_json::to_string(&to_quiz_out(&quiz)).expect("serialize");
            assert!(!out.contains("correctAnswer"), "leaked answer in {out}");
            assert!(!out.contains("correct_answer"), "leaked answer in {out}");
        }
    }

    #[test]
    fn question_dto_keeps_type_and_options() {
        let quiz = &seed_quizzes()[1];
        let out = to_quiz_out(quiz);
        assert_eq!(out.questions[0].kind, "multiple_choice");
        assert_eq!(out.questions[0].options.len(), 4);
        assert_eq!(out.questions[1].kind, "fill_in_blank");
        assert!(out.questions[1].options.is_empty());
    }

    #[test]
    fn ws_messages_round_trip_their_tags() {
        let msg: ClientWsMessage =
            serde_json::from_str(r#"{"type":"tutor_ask","text":"what is a closure?"}"#).unwrap();
        assert!(matches!(msg, ClientWsMessage::TutorAsk { course_id: None, .. }));

        let out = serde_json::to_string(&ServerWsMessage::Pong).unwrap();
        assert_eq!(out, r#"{"type":"pong"}"#);
    }
}
