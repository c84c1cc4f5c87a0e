//! Router assembly: HTTP endpoints, WebSocket upgrade, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;
pub mod ws;

/// Build the application router with:
/// - WebSocket at `/ws`
/// - REST-ish API under `/api/v1/...`
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
        // HTTP API
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/topics", get(http::http_list_topics).post(http::http_add_topic))
        .route("/api/v1/topics/random", post(http::http_random_topic))
        .route("/api/v1/prompt/optimize", post(http::http_optimize))
        .route("/api/v1/prompt/review", post(http::http_review))
        .route("/api/v1/prompt/suggest", post(http::http_suggest))
        .route("/api/v1/screen", get(http::http_get_screen))
        .route("/api/v1/screen/welcome", post(http::http_show_welcome))
        .route("/api/v1/screen/editor", post(http::http_open_editor))
        .route("/api/v1/quiz/start", post(http::http_quiz_start))
        .route("/api/v1/quiz/question", post(http::http_quiz_new_question))
        .route("/api/v1/quiz/answer", post(http::http_quiz_answer))
        .route("/api/v1/battle/start", post(http::http_battle_start))
        .route("/api/v1/battle/configure", post(http::http_battle_configure))
        .route("/api/v1/battle/prompt", post(http::http_battle_prompt))
        .route("/api/v1/battle/evaluate", post(http::http_battle_evaluate))
        .route("/api/v1/battle/reset", post(http::http_battle_reset))
        .route("/api/v1/twenty_questions/start", post(http::http_tq_start))
        .route("/api/v1/twenty_questions/ask", post(http::http_tq_ask))
        .route("/api/v1/twenty_questions/guess", post(http::http_tq_guess))
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
