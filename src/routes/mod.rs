//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::protocol::HealthOut;
use crate::state::AppState;

pub mod course;
pub mod quiz;
pub mod recommend;
pub mod social;
pub mod ws;

async fn http_health() -> Json<HealthOut> {
    Json(HealthOut { ok: true })
}

/// Build the application router with:
/// - WebSocket tutor chat at `/ws`
/// - REST API under `/api/...`
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers) – adjust for production if needed
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    // Static files with SPA fallback
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        // WebSocket
        .route("/ws", get(ws::ws_upgrade))
        .route("/api/health", get(http_health))
        // Quizzes
        .route("/api/quiz/create", post(quiz::http_create_quiz))
        .route("/api/quiz/all", get(quiz::http_list_quizzes))
        .route("/api/quiz/attempts", get(quiz::http_list_attempts))
        .route("/api/quiz/attempt/:id", get(quiz::http_get_attempt))
        .route("/api/quiz/:id", get(quiz::http_get_quiz))
        .route("/api/quiz/:id/submit", post(quiz::http_submit_quiz))
        // Courses + enrollment + preferences
        .route(
            "/api/course",
            get(course::http_list_courses).post(course::http_create_course),
        )
        .route("/api/course/:id", get(course::http_get_course))
        .route("/api/course/:id/enroll", post(course::http_enroll))
        .route(
            "/api/course/:id/learning-mode",
            get(course::http_get_learning_mode).post(course::http_set_learning_mode),
        )
        // Watch progress
        .route("/api/progress/:course_id/video", post(course::http_mark_watched))
        .route("/api/progress/:course_id", get(course::http_get_progress))
        // Leaderboard + discussions
        .route("/api/leaderboard", get(social::http_leaderboard))
        .route("/api/leaderboard/add-xp", post(social::http_add_xp))
        .route("/api/discussions/create", post(social::http_create_discussion))
        .route("/api/discussions/course/:course_id", get(social::http_list_discussions))
        .route("/api/discussions/:id/comment", post(social::http_add_comment))
        .route("/api/discussions/:id/vote", post(social::http_vote))
        // Recommendations / ML collaborator
        .route("/api/recommend/collaborative", get(recommend::http_recommend_collaborative))
        .route("/api/recommend/content", get(recommend::http_recommend_content))
        .route("/api/recommend/hybrid", get(recommend::http_recommend_hybrid))
        .route("/api/questions/generate", post(recommend::http_generate_questions))
        .route("/api/chatbot", post(recommend::http_chatbot))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}
