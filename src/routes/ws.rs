//! WebSocket upgrade + message loop. Each client message is parsed as JSON and
//! forwarded to the orchestrator. We reply with a single JSON message per request.

use std::sync::Arc;
use axum::{
  extract::{
    ws::{Message, WebSocket},
    State, WebSocketUpgrade,
  },
  response::IntoResponse,
};
use tracing::{debug, error, info, instrument};

use crate::orchestrator::{self, OpError};
use crate::protocol::{to_out, topic_out, ClientWsMessage, ServerWsMessage};
use crate::state::{AppState, Screen};
use crate::util::trunc_for_log;

#[instrument(level = "info", skip(state))]
pub async fn ws_upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
  info!(target: "promptplay_backend", "WebSocket upgrade requested");
  ws.on_upgrade(move |socket| handle_ws(socket, state))
}

#[instrument(level = "info", skip(socket, state))]
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
  info!(target: "promptplay_backend", "WebSocket connected");
  while let Some(Ok(msg)) = socket.recv().await {
    match msg {
      Message::Text(txt) => {
        debug!(target: "promptplay_backend", "WS received: {}", trunc_for_log(&txt, 300));
        // Parse, dispatch, serialize response.
        let reply_msg = match serde_json::from_str::<ClientWsMessage>(&txt) {
          Ok(incoming) => handle_client_ws(incoming, &state).await,
          Err(e) => ServerWsMessage::Error { message: format!("Invalid JSON: {}", e) },
        };

        let out = serde_json::to_string(&reply_msg).unwrap_or_else(|e| {
          serde_json::json!({ "type": "error", "message": format!("Serialization error: {}", e) }).to_string()
        });

        if let Err(e) = socket.send(Message::Text(out)).await {
          error!(target: "promptplay_backend", error = %e, "WS send error");
          break;
        }
      }
      Message::Ping(payload) => { let _ = socket.send(Message::Pong(payload)).await; }
      Message::Close(_) => break,
      _ => {}
    }
  }
  info!(target: "promptplay_backend", "WebSocket disconnected");
}

fn screen_reply(result: Result<Screen, OpError>) -> ServerWsMessage {
  match result {
    Ok(screen) => ServerWsMessage::Screen { screen: to_out(&screen) },
    Err(e) => ServerWsMessage::Error { message: e.to_string() },
  }
}

#[instrument(level = "info", skip(state))]
async fn handle_client_ws(msg: ClientWsMessage, state: &AppState) -> ServerWsMessage {
  match msg {
    ClientWsMessage::Ping => ServerWsMessage::Pong,

    ClientWsMessage::ListTopics => {
      let topics = orchestrator::list_topics(state).await;
      ServerWsMessage::Topics { topics: topics.iter().map(topic_out).collect() }
    }

    ClientWsMessage::AddTopic { name } => match orchestrator::add_topic(state, &name).await {
      Ok((topic, screen)) => {
        tracing::info!(target: "promptplay_backend", id = %topic.id, "WS topic added");
        ServerWsMessage::TopicCreated { topic: topic_out(&topic), screen: to_out(&screen) }
      }
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },

    ClientWsMessage::RandomTopic => match orchestrator::random_topic(state).await {
      Ok((topic, screen)) => {
        tracing::info!(target: "promptplay_backend", id = %topic.id, "WS random topic added");
        ServerWsMessage::TopicCreated { topic: topic_out(&topic), screen: to_out(&screen) }
      }
      Err(e) => ServerWsMessage::Error { message: e.to_string() },
    },

    ClientWsMessage::ShowWelcome => {
      let screen = orchestrator::show_welcome(state).await;
      ServerWsMessage::Screen { screen: to_out(&screen) }
    }

    ClientWsMessage::OpenEditor { topic_id } =>
      screen_reply(orchestrator::open_editor(state, &topic_id).await),

    ClientWsMessage::GetScreen => {
      let screen = orchestrator::current_screen(state).await;
      ServerWsMessage::Screen { screen: to_out(&screen) }
    }

    ClientWsMessage::OptimizePrompt { topic, prompt } => {
      let text = orchestrator::optimize_prompt(state, &topic, &prompt).await;
      ServerWsMessage::Optimized { text }
    }

    ClientWsMessage::ReviewPrompt { topic, prompt } => {
      let text = orchestrator::review_prompt(state, &topic, &prompt).await;
      ServerWsMessage::Reviewed { text }
    }

    ClientWsMessage::SuggestPrompts { topic } => {
      let prompts = orchestrator::suggest_prompts(state, &topic).await;
      ServerWsMessage::Suggestions { prompts }
    }

    ClientWsMessage::StartQuiz => screen_reply(orchestrator::start_quiz(state).await),

    ClientWsMessage::NewQuestion => screen_reply(orchestrator::quiz_new_question(state).await),

    ClientWsMessage::SubmitAnswer { answer } =>
      screen_reply(orchestrator::quiz_submit_answer(state, &answer).await),

    ClientWsMessage::StartBattle | ClientWsMessage::ResetBattle => {
      let screen = orchestrator::start_battle(state).await;
      ServerWsMessage::Screen { screen: to_out(&screen) }
    }

    ClientWsMessage::ConfigureBattle { player_count } =>
      screen_reply(orchestrator::battle_configure(state, player_count).await),

    ClientWsMessage::UpdatePrompt { player_id, text } =>
      screen_reply(orchestrator::battle_update_prompt(state, player_id, &text).await),

    ClientWsMessage::EvaluateBattle => screen_reply(orchestrator::battle_evaluate(state).await),

    ClientWsMessage::StartTwentyQuestions =>
      screen_reply(orchestrator::twenty_questions_reset(state).await),

    ClientWsMessage::AskQuestion { question } =>
      screen_reply(orchestrator::twenty_questions_ask(state, &question).await),

    ClientWsMessage::FinalGuess { text } =>
      screen_reply(orchestrator::twenty_questions_guess(state, &text).await),
  }
}
