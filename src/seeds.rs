//! Built-in seed content: a few users, courses, and quizzes that guarantee
//! the app is useful (and the leaderboard non-empty) without external config
//! or a database dump.

use chrono::{TimeZone, Utc};

use crate::domain::{Course, Question, Quiz, Role, TextResource, User, Video, VideoSource};
use crate::logic::level_for;

fn youtube_video(title: &str, video_id: &str) -> Video {
  Video {
    title: title.into(),
    url: format!("https://www.youtube.com/watch?v={video_id}"),
    source: VideoSource::Youtube,
    thumbnail: format!("https://img.youtube.com/vi/{video_id}/hqdefault.jpg"),
  }
}

/// Demo identities. Registration itself lives in the identity collaborator;
/// these exist so every endpoint has a resolvable user out of the box.
pub fn seed_users() -> Vec<User> {
  let user = |id: &str, name: &str, email: &str, role, xp: u32, day: u32| User {
    id: id.into(),
    name: name.into(),
    email: email.into(),
    password_hash: String::new(),
    role,
    xp,
    level: level_for(xp),
    course_progress: Default::default(),
    created_at: Utc.with_ymd_and_hms(2025, 3, day, 9, 0, 0).unwrap(),
  };
  vec![
    user("u1", "Ada Park", "ada@example.com", Role::Student, 120, 1),
    user("u2", "Bruno Reyes", "bruno@example.com", Role::Student, 80, 2),
    user("u3", "Chen Wu", "chen@example.com", Role::Teacher, 0, 3),
  ]
}

pub fn seed_courses() -> Vec<Course> {
  vec![
    Course {
      id: "course_react_basics".into(),
      title: "React Basics".into(),
      description: "Learn the fundamentals of React including components, state, and props.".into(),
      videos: vec![
        youtube_video("React Video 1", "SqcY0GlETPk"),
        youtube_video("React Video 2", "bMknfKXIFA8"),
        youtube_video("React Video 3", "w7ejDZ8SWv8"),
      ],
      text_resources: vec![TextResource {
        title: "React docs: Quick Start".into(),
        url: "https://react.dev/learn".into(),
        summary: "Official introduction to components, props, and state.".into(),
      }],
      enrolled_students: vec![],
    },
    Course {
      id: "course_js_essentials".into(),
      title: "JavaScript Essentials".into(),
      description: "Master JavaScript fundamentals to become a front-end wizard.".into(),
      videos: vec![
        youtube_video("JavaScript Video 1", "PkZNo7MFNFg"),
        youtube_video("JavaScript Video 2", "W6NZfCO5SIk"),
        youtube_video("JavaScript Video 3", "hdI2bqOjy3c"),
      ],
      text_resources: vec![],
      enrolled_students: vec![],
    },
  ]
}

pub fn seed_quizzes() -> Vec<Quiz> {
  vec![
    Quiz {
      id: "quiz_js_basics".into(),
      title: "JavaScript Basics".into(),
      description: "Test your knowledge of JavaScript fundamentals.".into(),
      questions: vec![
        Question::MultipleChoice {
          question: "What is a closure in JavaScript?".into(),
          options: vec![
            "A function bundled with its lexical environment".into(),
            "A type of loop".into(),
            "An object property".into(),
            "A variable declaration".into(),
          ],
          correct_answer: "A function bundled with its lexical environment".into(),
        },
        Question::MultipleChoice {
          question: "Which method is used to parse a JSON string?".into(),
          options: vec![
            "JSON.stringify()".into(),
            "JSON.parse()".into(),
            "JSON.convert()".into(),
            "JSON.toString()".into(),
          ],
          correct_answer: "JSON.parse()".into(),
        },
      ],
    },
    Quiz {
      id: "quiz_multithreading".into(),
      title: "Multithreading Concepts".into(),
      description: "Assess your understanding of multithreading.".into(),
      questions: vec![
        Question::MultipleChoice {
          question: "What is a common question on multithreading?".into(),
          options: vec![
            "How to create threads in Java".into(),
            "What is a deadlock?".into(),
            "What is a closure?".into(),
            "What is a callback?".into(),
          ],
          correct_answer: "What is a deadlock?".into(),
        },
        Question::FillInBlank {
          question: "A situation where two threads each wait on the other's lock is called a ____.".into(),
          correct_answer: "deadlock".into(),
        },
        Question::Descriptive {
          question: "Describe one strategy for avoiding lock contention.".into(),
          guidance: "Look for lock splitting, sharding, or lock-free structures.".into(),
        },
      ],
    },
  ]
}
