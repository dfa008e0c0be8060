//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This includes:
//!   - Quiz grading (positional, case-sensitive exact match)
//!   - The XP award formula and the leveling engine
//!   - Watched-video progress tracking and the percent-complete view
//!   - Course/quiz creation and enrollment
//!   - The leaderboard query

use chrono::Utc;
use rand::seq::SliceRandom;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Course, Question, Quiz, QuizAttempt, TextResource, User, Video, VideoSource};
use crate::error::ApiError;
use crate::state::AppState;
use crate::util::{extract_youtube_id, fill_template};

/// Score a submitted answer sheet against a question list.
///
/// Answers are index-aligned with the questions; a position scores when the
/// submitted string equals the question's correct answer exactly (no case or
/// whitespace normalization). Descriptive questions have no gradable answer
/// and never score. `total` is always the question count.
pub fn grade(questions: &[Question], answers: &[String]) -> Result<(u32, u32), ApiError> {
  if answers.len() != questions.len() {
    return Err(ApiError::validation(format!(
      "Mismatch between quiz questions and provided answers: expected {}, got {}",
      questions.len(),
      answers.len()
    )));
  }
  let score = questions
    .iter()
    .zip(answers)
    .filter(|(q, a)| q.correct_answer() == Some(a.as_str()))
    .count() as u32;
  Ok((score, questions.len() as u32))
}

/// XP awarded for one grading outcome: `round(100 * score / total)`.
/// A zero-question quiz earns nothing. Monotone in `score` for a fixed total.
pub fn xp_award(score: u32, total: u32) -> u32 {
  if total == 0 {
    return 0;
  }
  ((100.0 * score as f64) / total as f64).round() as u32
}

/// Level is always derived from total XP, never patched incrementally.
pub fn level_for(xp: u32) -> u32 {
  xp / 100 + 1
}

/// Add `delta` XP to a user and recompute the level, as one atomic update on
/// the user document. Returns the new (xp, level).
#[instrument(level = "info", skip(state), fields(%user_id, delta))]
pub async fn apply_xp(state: &AppState, user_id: &str, delta: u32) -> Result<(u32, u32), ApiError> {
  if delta == 0 {
    return Err(ApiError::validation("XP delta must be a positive integer"));
  }
  let (xp, level) = state
    .users
    .update(user_id, |user| {
      user.xp += delta;
      user.level = level_for(user.xp);
      (user.xp, user.level)
    })
    .await?;
  info!(target: "quiz", %user_id, delta, xp, level, "XP applied");
  Ok((xp, level))
}

/// Grade a submission, award XP, and persist one immutable attempt record.
///
/// The three steps are per-document atomic but only best-effort consistent
/// across documents: a crash between the XP update and the attempt insert
/// leaves them diverged, which the storage model accepts.
#[instrument(level = "info", skip(state, answers), fields(%user_id, %quiz_id, answer_count = answers.len()))]
pub async fn submit_quiz(
  state: &AppState,
  user_id: &str,
  quiz_id: &str,
  answers: Vec<String>,
) -> Result<QuizAttempt, ApiError> {
  state.users.get_or_not_found(user_id).await?;
  let quiz = state.quizzes.get_or_not_found(quiz_id).await?;

  let (score, total) = grade(&quiz.questions, &answers)?;
  let xp_earned = xp_award(score, total);
  if xp_earned > 0 {
    apply_xp(state, user_id, xp_earned).await?;
  }

  let attempt = QuizAttempt {
    id: Uuid::new_v4().to_string(),
    user_id: user_id.to_string(),
    quiz_id: quiz_id.to_string(),
    answers,
    score,
    total,
    xp_earned,
    attempted_at: Utc::now(),
  };
  state.attempts.insert(&attempt.id, attempt.clone()).await?;
  info!(target: "quiz", %user_id, %quiz_id, score, total, xp_earned, attempt_id = %attempt.id, "Quiz graded");
  Ok(attempt)
}

/// Attempts made by one user, newest first.
pub async fn attempts_for_user(state: &AppState, user_id: &str) -> Vec<QuizAttempt> {
  let mut attempts: Vec<QuizAttempt> = state
    .attempts
    .list()
    .await
    .into_iter()
    .filter(|a| a.user_id == user_id)
    .collect();
  attempts.sort_by(|a, b| b.attempted_at.cmp(&a.attempted_at));
  attempts
}

/// Mark one video watched for a (user, course) pair, idempotently.
///
/// The user document owns progress; the per-course record is created lazily
/// on the first watch event. Returns the watched list after the update.
#[instrument(level = "info", skip(state), fields(%user_id, %course_id, %video_title))]
pub async fn mark_video_watched(
  state: &AppState,
  user_id: &str,
  course_id: &str,
  video_title: &str,
) -> Result<Vec<String>, ApiError> {
  let watched = state
    .users
    .update(user_id, |user| {
      let progress = user.course_progress.entry(course_id.to_string()).or_default();
      if !progress.watched.iter().any(|t| t == video_title) {
        progress.watched.push(video_title.to_string());
      }
      progress.watched.clone()
    })
    .await?;
  info!(target: "progress", %user_id, %course_id, watched_count = watched.len(), "Progress updated");
  Ok(watched)
}

/// Percent of a course's videos the watched set covers, floored.
/// Only titles the course currently exposes count; a course with no videos
/// is 0% by definition.
pub fn percent_complete(watched: &[String], videos: &[Video]) -> u32 {
  if videos.is_empty() {
    return 0;
  }
  let covered = videos
    .iter()
    .filter(|v| watched.iter().any(|t| *t == v.title))
    .count();
  (100 * covered as u32) / videos.len() as u32
}

/// The course-scoped progress view: watched list + percent complete.
pub async fn progress_view(
  state: &AppState,
  user_id: &str,
  course_id: &str,
) -> Result<(Vec<String>, u32), ApiError> {
  let user = state.users.get_or_not_found(user_id).await?;
  let course = state.courses.get_or_not_found(course_id).await?;
  let watched = user
    .course_progress
    .get(course_id)
    .map(|p| p.watched.clone())
    .unwrap_or_default();
  let percent = percent_complete(&watched, &course.videos);
  Ok((watched, percent))
}

/// Idempotent enrollment: the enrolled set never holds duplicate ids.
#[instrument(level = "info", skip(state), fields(%user_id, %course_id))]
pub async fn enroll(state: &AppState, user_id: &str, course_id: &str) -> Result<(), ApiError> {
  state.users.get_or_not_found(user_id).await?;
  state
    .courses
    .update(course_id, |course| {
      if !course.enrolled_students.iter().any(|id| id == user_id) {
        course.enrolled_students.push(user_id.to_string());
      }
    })
    .await?;
  Ok(())
}

/// Top users by XP, descending; ties break by earliest registration, then id,
/// so the order is stable across calls and restarts.
pub async fn leaderboard(state: &AppState, top_n: usize) -> Vec<User> {
  let mut users = state.users.list().await;
  users.sort_by(|a, b| {
    b.xp
      .cmp(&a.xp)
      .then(a.created_at.cmp(&b.created_at))
      .then(a.id.cmp(&b.id))
  });
  users.truncate(top_n);
  users
}

/// Normalize one incoming video entry the way course creation expects:
/// upload entries keep their url and get a default thumbnail; everything else
/// is treated as YouTube, with the thumbnail derived from the video id.
pub fn normalize_video(
  index: usize,
  title: Option<String>,
  url: String,
  source: Option<String>,
  thumbnail: Option<String>,
) -> Video {
  if source.as_deref() == Some("upload") {
    Video {
      title: title.unwrap_or_else(|| format!("Uploaded Video {}", index + 1)),
      url,
      source: VideoSource::Upload,
      thumbnail: thumbnail.unwrap_or_else(|| "/default-thumbnail.jpg".into()),
    }
  } else {
    let thumbnail = thumbnail.or_else(|| {
      extract_youtube_id(&url).map(|id| format!("https://img.youtube.com/vi/{id}/hqdefault.jpg"))
    });
    Video {
      title: title.unwrap_or_else(|| format!("YouTube Video {}", index + 1)),
      url,
      source: VideoSource::Youtube,
      thumbnail: thumbnail.unwrap_or_else(|| "/default-thumbnail.jpg".into()),
    }
  }
}

/// Create and persist a course. At least one video is required.
#[instrument(level = "info", skip_all, fields(title = %title))]
pub async fn create_course(
  state: &AppState,
  title: String,
  description: String,
  videos: Vec<Video>,
  text_resources: Vec<TextResource>,
) -> Result<Course, ApiError> {
  if title.trim().is_empty() {
    return Err(ApiError::validation("Course title is required"));
  }
  if videos.is_empty() {
    return Err(ApiError::validation("At least one video link is required"));
  }
  let course = Course {
    id: Uuid::new_v4().to_string(),
    title,
    description,
    videos,
    text_resources,
    enrolled_students: vec![],
  };
  state.courses.insert(&course.id, course.clone()).await?;
  Ok(course)
}

/// Create and persist a quiz after shape validation.
#[instrument(level = "info", skip_all, fields(title = %title, question_count = questions.len()))]
pub async fn create_quiz(
  state: &AppState,
  title: String,
  description: String,
  questions: Vec<Question>,
) -> Result<Quiz, ApiError> {
  if title.trim().is_empty() {
    return Err(ApiError::validation("Quiz title is required"));
  }
  if questions.is_empty() {
    return Err(ApiError::validation("A quiz needs at least one question"));
  }
  for q in &questions {
    if let Question::MultipleChoice { options, correct_answer, .. } = q {
      if options.is_empty() {
        return Err(ApiError::validation("Multiple-choice questions need options"));
      }
      if !options.contains(correct_answer) {
        return Err(ApiError::validation(
          "Multiple-choice correct answer must be one of the options",
        ));
      }
    }
  }
  let quiz = Quiz {
    id: Uuid::new_v4().to_string(),
    title,
    description,
    questions,
  };
  state.quizzes.insert(&quiz.id, quiz.clone()).await?;
  Ok(quiz)
}

/// Tutor reply shared by the HTTP chatbot and the WebSocket loop.
/// ML-backed when the collaborator is configured; otherwise (or on failure)
/// a local stub keeps the chat UI responsive.
#[instrument(level = "info", skip(state, text), fields(has_course = course_id.is_some(), text_len = text.len()))]
pub async fn tutor_reply(state: &AppState, course_id: Option<&str>, text: &str) -> String {
  let course_title = match course_id {
    Some(id) => state.courses.get(id).await.map(|c| c.title),
    None => None,
  };
  let prompt = match &course_title {
    Some(title) => fill_template(
      &state.prompts.tutor_course_template,
      &[("course_title", title.as_str()), ("message", text)],
    ),
    None => fill_template(&state.prompts.tutor_template, &[("message", text)]),
  };

  if let Some(ml) = &state.ml {
    match ml.tutor_reply(&prompt).await {
      Ok(reply) if !reply.is_empty() => return reply,
      Ok(_) => warn!(target: "ml", "Tutor returned an empty reply; using stub."),
      Err(e) => error!(target: "ml", error = %e, "Tutor reply failed; using stub."),
    }
  }
  tutor_stub(text, course_title.as_deref())
}

/// Tiny offline tutor. Enough to keep the chat panel useful during ML outages.
fn tutor_stub(text: &str, course_title: Option<&str>) -> String {
  let lower = text.to_lowercase();
  if lower.contains("closure") {
    "A closure is a function bundled with the variables in scope where it was defined.".into()
  } else if lower.contains("deadlock") {
    "A deadlock happens when two threads each hold a lock the other needs; always acquire locks in a fixed order.".into()
  } else if let Some(title) = course_title {
    format!("Good question! Re-watch the {title} videos on that topic, then try the course quiz to check yourself.")
  } else {
    "Try breaking the problem into smaller steps, and ask about one concept at a time for a deeper explanation.".into()
  }
}

/// Recommendations served when the ML collaborator is unavailable: a random
/// sample of courses the user is not already enrolled in (or simply other
/// courses, for the content-based mode). Ranked-by-model it is not, but the
/// page stays populated.
pub async fn local_recommendations(
  state: &AppState,
  exclude_user: Option<&str>,
  exclude_course: Option<&str>,
  top_n: usize,
) -> Vec<serde_json::Value> {
  let mut courses: Vec<Course> = state
    .courses
    .list()
    .await
    .into_iter()
    .filter(|c| Some(c.id.as_str()) != exclude_course)
    .filter(|c| match exclude_user {
      Some(uid) => !c.enrolled_students.iter().any(|id| id == uid),
      None => true,
    })
    .collect();
  courses.shuffle(&mut rand::thread_rng());
  courses.truncate(top_n);
  courses
    .into_iter()
    .map(|c| serde_json::json!({ "courseId": c.id, "title": c.title }))
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::TimeZone;

  fn two_question_quiz() -> Vec<Question> {
    vec![
      Question::FillInBlank { question: "first".into(), correct_answer: "A".into() },
      Question::FillInBlank { question: "second".into(), correct_answer: "B".into() },
    ]
  }

  fn test_user(id: &str, xp: u32, day: u32) -> User {
    User {
      id: id.into(),
      name: format!("User {id}"),
      email: format!("{id}@example.com"),
      password_hash: String::new(),
      role: Default::default(),
      xp,
      level: level_for(xp),
      course_progress: Default::default(),
      created_at: chrono::Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap(),
    }
  }

  fn state_with(users: Vec<User>) -> AppState {
    AppState::with_content(users, crate::seeds::seed_courses(), crate::seeds::seed_quizzes())
  }

  #[test]
  fn grading_is_positional_and_case_sensitive() {
    let qs = two_question_quiz();
    assert_eq!(grade(&qs, &["A".into(), "B".into()]).unwrap(), (2, 2));
    assert_eq!(grade(&qs, &["A".into(), "C".into()]).unwrap(), (1, 2));
    assert_eq!(grade(&qs, &["a".into(), "b".into()]).unwrap(), (0, 2));
    // Swapped positions don't count.
    assert_eq!(grade(&qs, &["B".into(), "A".into()]).unwrap(), (0, 2));
  }

  #[test]
  fn answer_count_mismatch_is_a_validation_error() {
    let qs = two_question_quiz();
    assert!(matches!(grade(&qs, &["A".into()]), Err(ApiError::Validation(_))));
    assert!(matches!(
      grade(&qs, &["A".into(), "B".into(), "C".into()]),
      Err(ApiError::Validation(_))
    ));
  }

  #[test]
  fn descriptive_questions_never_score() {
    let qs = vec![Question::Descriptive { question: "Explain.".into(), guidance: String::new() }];
    assert_eq!(grade(&qs, &["anything".into()]).unwrap(), (0, 1));
  }

  #[test]
  fn xp_award_rounds_and_handles_empty_quizzes() {
    assert_eq!(xp_award(2, 2), 100);
    assert_eq!(xp_award(1, 2), 50);
    assert_eq!(xp_award(0, 2), 0);
    assert_eq!(xp_award(1, 3), 33);
    assert_eq!(xp_award(2, 3), 67);
    assert_eq!(xp_award(0, 0), 0);
  }

  #[test]
  fn xp_award_is_monotone_in_score() {
    for total in 1u32..=10 {
      let mut prev = 0;
      for score in 0..=total {
        let earned = xp_award(score, total);
        assert!(earned >= prev, "award dropped at {score}/{total}");
        prev = earned;
      }
    }
  }

  #[test]
  fn level_is_floor_xp_over_100_plus_1() {
    assert_eq!(level_for(0), 1);
    assert_eq!(level_for(99), 1);
    assert_eq!(level_for(100), 2);
    assert_eq!(level_for(250), 3);
  }

  #[tokio::test]
  async fn apply_xp_recomputes_level_and_rejects_zero() {
    let state = state_with(vec![test_user("u1", 80, 1)]);
    let (xp, level) = apply_xp(&state, "u1", 30).await.unwrap();
    assert_eq!((xp, level), (110, 2));

    assert!(matches!(apply_xp(&state, "u1", 0).await, Err(ApiError::Validation(_))));
    assert!(matches!(apply_xp(&state, "ghost", 10).await, Err(ApiError::NotFound(_))));
  }

  #[tokio::test]
  async fn submit_quiz_awards_xp_and_records_one_attempt() {
    let state = state_with(vec![test_user("u1", 0, 1)]);
    let attempt = submit_quiz(
      &state,
      "u1",
      "quiz_js_basics",
      vec![
        "A function bundled with its lexical environment".into(),
        "JSON.parse()".into(),
      ],
    )
    .await
    .unwrap();
    assert_eq!((attempt.score, attempt.total, attempt.xp_earned), (2, 2, 100));

    let user = state.users.get("u1").await.unwrap();
    assert_eq!((user.xp, user.level), (100, 2));
    assert_eq!(attempts_for_user(&state, "u1").await.len(), 1);
  }

  #[tokio::test]
  async fn mismatched_submission_records_nothing() {
    let state = state_with(vec![test_user("u1", 0, 1)]);
    let err = submit_quiz(&state, "u1", "quiz_js_basics", vec!["only one".into()])
      .await
      .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert!(attempts_for_user(&state, "u1").await.is_empty());
    // And no XP moved.
    assert_eq!(state.users.get("u1").await.unwrap().xp, 0);
  }

  #[tokio::test]
  async fn unknown_quiz_is_not_found() {
    let state = state_with(vec![test_user("u1", 0, 1)]);
    let err = submit_quiz(&state, "u1", "nope", vec![]).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound("Quiz")));
  }

  #[tokio::test]
  async fn watching_is_idempotent() {
    let state = state_with(vec![test_user("u1", 0, 1)]);
    let first = mark_video_watched(&state, "u1", "course_react_basics", "React Video 1")
      .await
      .unwrap();
    let second = mark_video_watched(&state, "u1", "course_react_basics", "React Video 1")
      .await
      .unwrap();
    assert_eq!(first, vec!["React Video 1".to_string()]);
    assert_eq!(second.len(), 1);
  }

  #[tokio::test]
  async fn progress_view_floors_and_ignores_stale_titles() {
    let state = state_with(vec![test_user("u1", 0, 1)]);
    mark_video_watched(&state, "u1", "course_react_basics", "React Video 1").await.unwrap();
    mark_video_watched(&state, "u1", "course_react_basics", "Removed Video").await.unwrap();
    let (watched, percent) = progress_view(&state, "u1", "course_react_basics").await.unwrap();
    assert_eq!(watched.len(), 2);
    // 1 of 3 current videos, floored.
    assert_eq!(percent, 33);
  }

  #[test]
  fn percent_complete_handles_zero_videos_and_half_watched() {
    assert_eq!(percent_complete(&["a".into()], &[]), 0);
    let videos: Vec<Video> = (1..=4)
      .map(|i| normalize_video(i, Some(format!("v{i}")), format!("https://youtu.be/AAAAAAAAAA{i}"), None, None))
      .collect();
    let watched = vec!["v1".to_string(), "v2".to_string()];
    assert_eq!(percent_complete(&watched, &videos), 50);
  }

  #[tokio::test]
  async fn leaderboard_sorts_by_xp_with_stable_ties() {
    let state = state_with(vec![
      test_user("late_tie", 200, 5),
      test_user("early_tie", 200, 2),
      test_user("low", 50, 1),
      test_user("high", 300, 9),
    ]);
    let top = leaderboard(&state, 3).await;
    let ids: Vec<&str> = top.iter().map(|u| u.id.as_str()).collect();
    assert_eq!(ids, vec!["high", "early_tie", "late_tie"]);
  }

  #[tokio::test]
  async fn enrollment_is_idempotent() {
    let state = state_with(vec![test_user("u1", 0, 1)]);
    enroll(&state, "u1", "course_react_basics").await.unwrap();
    enroll(&state, "u1", "course_react_basics").await.unwrap();
    let course = state.courses.get("course_react_basics").await.unwrap();
    assert_eq!(course.enrolled_students, vec!["u1".to_string()]);
  }

  #[tokio::test]
  async fn create_quiz_validates_shape() {
    let state = state_with(vec![]);
    let err = create_quiz(&state, "T".into(), "d".into(), vec![]).await.unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let err = create_quiz(
      &state,
      "T".into(),
      "d".into(),
      vec![Question::MultipleChoice {
        question: "q".into(),
        options: vec!["x".into()],
        correct_answer: "y".into(),
      }],
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
  }

  #[test]
  fn normalize_video_defaults_titles_and_thumbnails() {
    let v = normalize_video(0, None, "https://www.youtube.com/watch?v=SqcY0GlETPk".into(), None, None);
    assert_eq!(v.title, "YouTube Video 1");
    assert_eq!(v.thumbnail, "https://img.youtube.com/vi/SqcY0GlETPk/hqdefault.jpg");
    assert_eq!(v.source, VideoSource::Youtube);

    let v = normalize_video(2, None, "/api/video/stream/abc".into(), Some("upload".into()), None);
    assert_eq!(v.title, "Uploaded Video 3");
    assert_eq!(v.thumbnail, "/default-thumbnail.jpg");
    assert_eq!(v.source, VideoSource::Upload);
  }

  #[tokio::test]
  async fn tutor_falls_back_to_the_stub_without_ml() {
    let state = state_with(vec![]);
    let reply = tutor_reply(&state, None, "What is a closure?").await;
    assert!(reply.contains("closure"));
    let reply = tutor_reply(&state, Some("course_react_basics"), "How do props work?").await;
    assert!(reply.contains("React Basics"));
  }

  #[tokio::test]
  async fn local_recommendations_exclude_enrolled_and_current() {
    let state = state_with(vec![test_user("u1", 0, 1)]);
    enroll(&state, "u1", "course_react_basics").await.unwrap();

    let recs = local_recommendations(&state, Some("u1"), None, 10).await;
    let ids: Vec<&str> = recs.iter().filter_map(|r| r["courseId"].as_str()).collect();
    assert_eq!(ids, vec!["course_js_essentials"]);

    let recs = local_recommendations(&state, None, Some("course_js_essentials"), 10).await;
    let ids: Vec<&str> = recs.iter().filter_map(|r| r["courseId"].as_str()).collect();
    assert_eq!(ids, vec!["course_react_basics"]);
  }
}
