//! Application state: document stores, prompts, and the ML service client.
//!
//! This module owns:
//!   - the per-record-kind document stores (users, courses, quizzes,
//!     attempts, preferences, discussions)
//!   - the prompts struct (from TOML or defaults)
//!   - the optional ML service client
//!
//! Startup content comes from the TOML content bank (if configured) plus the
//! built-in seeds; bank entries win on id collisions, seeds never overwrite.

use std::collections::HashMap;

use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::{load_app_config_from_env, Prompts};
use crate::domain::{Course, Discussion, Quiz, QuizAttempt, User, UserCoursePreference};
use crate::logic::normalize_video;
use crate::ml::MlService;
use crate::seeds::{seed_courses, seed_quizzes, seed_users};
use crate::store::DocStore;

#[derive(Clone)]
pub struct AppState {
    pub users: DocStore<User>,
    pub courses: DocStore<Course>,
    pub quizzes: DocStore<Quiz>,
    pub attempts: DocStore<QuizAttempt>,
    pub preferences: DocStore<UserCoursePreference>,
    pub discussions: DocStore<Discussion>,
    pub ml: Option<MlService>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from env: load config, merge bank + seed content, init the
    /// ML client.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg_opt = load_app_config_from_env();
        let prompts = cfg_opt
            .as_ref()
            .map(|c| c.prompts.clone())
            .unwrap_or_default();

        let mut course_map = HashMap::<String, Course>::new();
        let mut quiz_map = HashMap::<String, Quiz>::new();

        // Insert config-bank content first (if any).
        let (mut bank_courses, mut bank_quizzes) = (0usize, 0usize);
        if let Some(cfg) = &cfg_opt {
            for cc in &cfg.courses {
                let id = cc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
                if cc.videos.is_empty() {
                    warn!(target: "elearn_backend", %id, title = %cc.title, "Skipping bank course: no videos");
                    continue;
                }
                let videos = cc
                    .videos
                    .iter()
                    .enumerate()
                    .map(|(i, v)| {
                        normalize_video(
                            i,
                            v.title.clone(),
                            v.url.clone(),
                            v.source.clone(),
                            v.thumbnail.clone(),
                        )
                    })
                    .collect();
                course_map.insert(
                    id.clone(),
                    Course {
                        id,
                        title: cc.title.clone(),
                        description: cc.description.clone(),
                        videos,
                        text_resources: cc.text_resources.clone(),
                        enrolled_students: vec![],
                    },
                );
                bank_courses += 1;
            }
            for qc in &cfg.quizzes {
                if qc.questions.is_empty() {
                    warn!(target: "elearn_backend", title = %qc.title, "Skipping bank quiz: no questions");
                    continue;
                }
                let id = qc.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string());
                quiz_map.insert(
                    id.clone(),
                    Quiz {
                        id,
                        title: qc.title.clone(),
                        description: qc.description.clone(),
                        questions: qc.questions.clone(),
                    },
                );
                bank_quizzes += 1;
            }
        }

        // Always insert built-in seeds, but don't overwrite bank ids.
        for c in seed_courses() {
            course_map.entry(c.id.clone()).or_insert(c);
        }
        for q in seed_quizzes() {
            quiz_map.entry(q.id.clone()).or_insert(q);
        }
        let mut user_map = HashMap::<String, User>::new();
        for u in seed_users() {
            user_map.insert(u.id.clone(), u);
        }

        info!(
            target: "elearn_backend",
            users = user_map.len(),
            courses = course_map.len(),
            quizzes = quiz_map.len(),
            bank_courses,
            bank_quizzes,
            "Startup content inventory"
        );

        // Build the optional ML client (if ML_SERVICE_URL present).
        let ml = MlService::from_env();
        if let Some(svc) = &ml {
            info!(target: "ml", base_url = %svc.base_url, "ML service enabled.");
        } else {
            info!(target: "ml", "ML service disabled (no ML_SERVICE_URL). Using local fallbacks.");
        }

        Self {
            users: DocStore::from_map("User", user_map),
            courses: DocStore::from_map("Course", course_map),
            quizzes: DocStore::from_map("Quiz", quiz_map),
            attempts: DocStore::new("Attempt"),
            preferences: DocStore::new("Preference"),
            discussions: DocStore::new("Discussion"),
            ml,
            prompts,
        }
    }

    /// State with explicit content and no ML client; used by tests.
    pub fn with_content(users: Vec<User>, courses: Vec<Course>, quizzes: Vec<Quiz>) -> Self {
        Self {
            users: DocStore::from_map(
                "User",
                users.into_iter().map(|u| (u.id.clone(), u)).collect(),
            ),
            courses: DocStore::from_map(
                "Course",
                courses.into_iter().map(|c| (c.id.clone(), c)).collect(),
            ),
            quizzes: DocStore::from_map(
                "Quiz",
                quizzes.into_iter().map(|q| (q.id.clone(), q)).collect(),
            ),
            attempts: DocStore::new("Attempt"),
            preferences: DocStore::new("Preference"),
            discussions: DocStore::new("Discussion"),
            ml: None,
            prompts: Prompts::default(),
        }
    }
}
