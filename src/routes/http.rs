//! HTTP endpoint handlers. These are thin wrappers that forward to the
//! orchestrator. Each handler is instrumented; gameplay handlers return the
//! fresh screen snapshot, and orchestrator rejections map to status codes.

use std::sync::Arc;
use axum::{extract::State, http::StatusCode, response::IntoResponse, response::Response, Json};
use tracing::{info, instrument};

use crate::orchestrator::{self, OpError};
use crate::protocol::*;
use crate::state::AppState;

/// Orchestrator rejection as an HTTP response.
pub struct ApiError(pub OpError);

impl From<OpError> for ApiError {
  fn from(e: OpError) -> Self {
    ApiError(e)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self.0 {
      OpError::Busy | OpError::WrongScreen | OpError::Stale => StatusCode::CONFLICT,
      OpError::UnknownTopic(_) => StatusCode::NOT_FOUND,
      OpError::Unavailable(_) => StatusCode::BAD_GATEWAY,
      OpError::Rejected(_) => StatusCode::UNPROCESSABLE_ENTITY,
    };
    (status, Json(ErrorOut { error: self.0.to_string() })).into_response()
  }
}

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse { Json(HealthOut { ok: true }) }

#[instrument(level = "info", skip(state))]
pub async fn http_list_topics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let topics = orchestrator::list_topics(&state).await;
  Json(topics.iter().map(topic_out).collect::<Vec<_>>())
}

#[instrument(level = "info", skip(state, body), fields(name_len = body.name.len()))]
pub async fn http_add_topic(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AddTopicIn>,
) -> Result<Json<TopicCreatedOut>, ApiError> {
  let (topic, screen) = orchestrator::add_topic(&state, &body.name).await?;
  info!(target: "promptplay_backend", id = %topic.id, "HTTP topic added");
  Ok(Json(TopicCreatedOut { topic: topic_out(&topic), screen: to_out(&screen) }))
}

#[instrument(level = "info", skip(state))]
pub async fn http_random_topic(
  State(state): State<Arc<AppState>>,
) -> Result<Json<TopicCreatedOut>, ApiError> {
  let (topic, screen) = orchestrator::random_topic(&state).await?;
  info!(target: "promptplay_backend", id = %topic.id, "HTTP random topic added");
  Ok(Json(TopicCreatedOut { topic: topic_out(&topic), screen: to_out(&screen) }))
}

#[instrument(level = "info", skip(state, body), fields(prompt_len = body.prompt.len()))]
pub async fn http_optimize(
  State(state): State<Arc<AppState>>,
  Json(body): Json<EditorIn>,
) -> impl IntoResponse {
  let text = orchestrator::optimize_prompt(&state, &body.topic, &body.prompt).await;
  Json(TextOut { text })
}

#[instrument(level = "info", skip(state, body), fields(prompt_len = body.prompt.len()))]
pub async fn http_review(
  State(state): State<Arc<AppState>>,
  Json(body): Json<EditorIn>,
) -> impl IntoResponse {
  let text = orchestrator::review_prompt(&state, &body.topic, &body.prompt).await;
  Json(TextOut { text })
}

#[instrument(level = "info", skip(state, body), fields(topic_len = body.topic.len()))]
pub async fn http_suggest(
  State(state): State<Arc<AppState>>,
  Json(body): Json<SuggestIn>,
) -> impl IntoResponse {
  let prompts = orchestrator::suggest_prompts(&state, &body.topic).await;
  Json(SuggestionsOut { prompts })
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_screen(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let screen = orchestrator::current_screen(&state).await;
  Json(to_out(&screen))
}

#[instrument(level = "info", skip(state))]
pub async fn http_show_welcome(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let screen = orchestrator::show_welcome(&state).await;
  Json(to_out(&screen))
}

#[instrument(level = "info", skip(state, body), fields(%body.topic_id))]
pub async fn http_open_editor(
  State(state): State<Arc<AppState>>,
  Json(body): Json<OpenEditorIn>,
) -> Result<Json<ScreenOut>, ApiError> {
  let screen = orchestrator::open_editor(&state, &body.topic_id).await?;
  Ok(Json(to_out(&screen)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_quiz_start(
  State(state): State<Arc<AppState>>,
) -> Result<Json<ScreenOut>, ApiError> {
  let screen = orchestrator::start_quiz(&state).await?;
  Ok(Json(to_out(&screen)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_quiz_new_question(
  State(state): State<Arc<AppState>>,
) -> Result<Json<ScreenOut>, ApiError> {
  let screen = orchestrator::quiz_new_question(&state).await?;
  Ok(Json(to_out(&screen)))
}

#[instrument(level = "info", skip(state, body), fields(answer_len = body.answer.len()))]
pub async fn http_quiz_answer(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AnswerIn>,
) -> Result<Json<ScreenOut>, ApiError> {
  let screen = orchestrator::quiz_submit_answer(&state, &body.answer).await?;
  Ok(Json(to_out(&screen)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_battle_start(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let screen = orchestrator::start_battle(&state).await;
  Json(to_out(&screen))
}

#[instrument(level = "info", skip(state, body), fields(player_count = body.player_count))]
pub async fn http_battle_configure(
  State(state): State<Arc<AppState>>,
  Json(body): Json<ConfigureIn>,
) -> Result<Json<ScreenOut>, ApiError> {
  let screen = orchestrator::battle_configure(&state, body.player_count).await?;
  Ok(Json(to_out(&screen)))
}

#[instrument(level = "info", skip(state, body), fields(player_id = body.player_id, text_len = body.text.len()))]
pub async fn http_battle_prompt(
  State(state): State<Arc<AppState>>,
  Json(body): Json<PlayerPromptIn>,
) -> Result<Json<ScreenOut>, ApiError> {
  let screen = orchestrator::battle_update_prompt(&state, body.player_id, &body.text).await?;
  Ok(Json(to_out(&screen)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_battle_evaluate(
  State(state): State<Arc<AppState>>,
) -> Result<Json<ScreenOut>, ApiError> {
  let screen = orchestrator::battle_evaluate(&state).await?;
  Ok(Json(to_out(&screen)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_battle_reset(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let screen = orchestrator::start_battle(&state).await;
  Json(to_out(&screen))
}

#[instrument(level = "info", skip(state))]
pub async fn http_tq_start(
  State(state): State<Arc<AppState>>,
) -> Result<Json<ScreenOut>, ApiError> {
  let screen = orchestrator::twenty_questions_reset(&state).await?;
  Ok(Json(to_out(&screen)))
}

#[instrument(level = "info", skip(state, body), fields(question_len = body.question.len()))]
pub async fn http_tq_ask(
  State(state): State<Arc<AppState>>,
  Json(body): Json<AskIn>,
) -> Result<Json<ScreenOut>, ApiError> {
  let screen = orchestrator::twenty_questions_ask(&state, &body.question).await?;
  Ok(Json(to_out(&screen)))
}

#[instrument(level = "info", skip(state, body), fields(guess_len = body.text.len()))]
pub async fn http_tq_guess(
  State(state): State<Arc<AppState>>,
  Json(body): Json<GuessIn>,
) -> Result<Json<ScreenOut>, ApiError> {
  let screen = orchestrator::twenty_questions_guess(&state, &body.text).await?;
  Ok(Json(to_out(&screen)))
}
