//! Core behaviors shared by both HTTP and WebSocket handlers.
//!
//! This is where user intents meet the state machines:
//!   - topic list operations and the editor's optimize/review/suggest calls
//!     (plain request/response pairs, no session of their own)
//!   - screen switches, which replace the active variant wholesale and bump
//!     the generation counter
//!   - gameplay operations, which run as: take the write lock, reject if
//!     busy, validate the intent, optionally publish an optimistic in-flight
//!     status, release the lock, await the transition, then commit the result
//!     only if the generation is unchanged. A response that resolves after a
//!     screen switch is logged and dropped instead of mutating the new
//!     screen's state.

use thiserror::Error;
use tracing::{error, info, instrument};

use crate::domain::{BattleStatus, QuizStatus, Topic, TwentyQuestionsStatus};
use crate::games::{battle, quiz, twenty_questions, TransitionError};
use crate::state::{AppState, Screen};

const TOPIC_FALLBACK: &str = "Lỗi khi tạo chủ đề. Vui lòng thử lại.";
const OPTIMIZE_FALLBACK: &str = "Lỗi khi tối ưu hóa prompt. Vui lòng thử lại.";
const REVIEW_FALLBACK: &str = "Lỗi khi nhận xét prompt. Vui lòng thử lại.";
const SUGGEST_FALLBACK: &str = "Đã xảy ra lỗi khi tạo gợi ý. Vui lòng thử lại.";

/// Why an intent was not applied. `Stale` is not a failure of the game, it
/// marks a response that lost the race against a screen switch.
#[derive(Debug, Error)]
pub enum OpError {
  #[error("another operation is still in flight")]
  Busy,
  #[error("action does not match the active screen")]
  WrongScreen,
  #[error("superseded by a screen switch")]
  Stale,
  #[error("unknown topic id: {0}")]
  UnknownTopic(String),
  #[error("{0}")]
  Unavailable(&'static str),
  #[error(transparent)]
  Rejected(#[from] TransitionError),
}

/// Commit an async result: apply it and clear busy, unless a screen switch
/// already replaced this session.
async fn commit(state: &AppState, generation: u64, screen: Screen) -> Result<Screen, OpError> {
  let mut active = state.active.write().await;
  if active.generation != generation {
    info!(target: "promptplay_backend", issued = generation, current = active.generation, "Dropping stale response after screen switch");
    return Err(OpError::Stale);
  }
  active.busy = false;
  active.screen = screen.clone();
  Ok(screen)
}

/// Undo an optimistic in-flight status after a rejected transition.
async fn rollback(state: &AppState, generation: u64, screen: Screen) {
  let mut active = state.active.write().await;
  if active.generation == generation {
    active.busy = false;
    active.screen = screen;
  }
}

// -------- Topics & editor --------

pub async fn list_topics(state: &AppState) -> Vec<Topic> {
  state.topics_snapshot().await
}

/// Add a topic and open the editor on it (adding always selects).
#[instrument(level = "info", skip(state, name), fields(name_len = name.len()))]
pub async fn add_topic(state: &AppState, name: &str) -> Result<(Topic, Screen), OpError> {
  if name.trim().is_empty() {
    return Err(TransitionError::EmptyInput.into());
  }
  let topic = state.add_topic(name).await;
  let mut active = state.active.write().await;
  active.generation += 1;
  active.busy = false;
  active.screen = Screen::Editor { topic: topic.clone() };
  Ok((topic, active.screen.clone()))
}

/// Ask the gateway for a topic; only a successful generation is added to the
/// list. A failed call adds nothing and surfaces the fallback message.
#[instrument(level = "info", skip(state))]
pub async fn random_topic(state: &AppState) -> Result<(Topic, Screen), OpError> {
  match state.gateway.random_topic().await {
    Ok(name) if !name.trim().is_empty() => add_topic(state, &name).await,
    Ok(_) => {
      error!(target: "promptplay_backend", "random topic came back blank");
      Err(OpError::Unavailable(TOPIC_FALLBACK))
    }
    Err(e) => {
      error!(target: "promptplay_backend", error = %e, "random topic generation failed");
      Err(OpError::Unavailable(TOPIC_FALLBACK))
    }
  }
}

#[instrument(level = "info", skip(state, topic, draft), fields(draft_len = draft.len()))]
pub async fn optimize_prompt(state: &AppState, topic: &str, draft: &str) -> String {
  match state.gateway.optimize_prompt(topic, draft).await {
    Ok(t) => t,
    Err(e) => {
      error!(target: "promptplay_backend", error = %e, "prompt optimization failed");
      OPTIMIZE_FALLBACK.to_string()
    }
  }
}

#[instrument(level = "info", skip(state, topic, draft), fields(draft_len = draft.len()))]
pub async fn review_prompt(state: &AppState, topic: &str, draft: &str) -> String {
  match state.gateway.review_prompt(topic, draft).await {
    Ok(t) => t,
    Err(e) => {
      error!(target: "promptplay_backend", error = %e, "prompt review failed");
      REVIEW_FALLBACK.to_string()
    }
  }
}

#[instrument(level = "info", skip(state, topic))]
pub async fn suggest_prompts(state: &AppState, topic: &str) -> Vec<String> {
  match state.gateway.suggest_prompts(topic).await {
    Ok(prompts) => prompts,
    Err(e) => {
      error!(target: "promptplay_backend", error = %e, "prompt suggestion failed");
      vec![SUGGEST_FALLBACK.to_string()]
    }
  }
}

// -------- Screen switches --------

pub async fn current_screen(state: &AppState) -> Screen {
  state.active.read().await.screen.clone()
}

/// Switches are allowed even while an operation is in flight: the bumped
/// generation strands the pending response.
pub async fn show_welcome(state: &AppState) -> Screen {
  let mut active = state.active.write().await;
  active.generation += 1;
  active.busy = false;
  active.screen = Screen::Welcome;
  active.screen.clone()
}

pub async fn open_editor(state: &AppState, topic_id: &str) -> Result<Screen, OpError> {
  let topic = state
    .get_topic(topic_id)
    .await
    .ok_or_else(|| OpError::UnknownTopic(topic_id.to_string()))?;
  let mut active = state.active.write().await;
  active.generation += 1;
  active.busy = false;
  active.screen = Screen::Editor { topic };
  Ok(active.screen.clone())
}

/// Enter the battle screen at Configuring (also the full-reset target).
pub async fn start_battle(state: &AppState) -> Screen {
  let mut active = state.active.write().await;
  active.generation += 1;
  active.busy = false;
  active.screen = Screen::Battle(battle::new_session());
  active.screen.clone()
}

// -------- Quiz --------

/// Enter the quiz screen. A round that is still waiting for an answer is
/// kept; otherwise a fresh question is requested.
#[instrument(level = "info", skip(state))]
pub async fn start_quiz(state: &AppState) -> Result<Screen, OpError> {
  let generation = {
    let mut active = state.active.write().await;
    if !active.busy {
      if let Screen::Quiz(Some(round)) = &active.screen {
        if round.status == QuizStatus::Asking {
          return Ok(active.screen.clone());
        }
      }
    }
    active.generation += 1;
    active.busy = true;
    active.screen = Screen::Quiz(None);
    active.generation
  };
  let round = quiz::new_round(state.gateway.as_ref()).await;
  commit(state, generation, Screen::Quiz(Some(round))).await
}

/// Replace the current round with a fresh question (quiz screen only).
#[instrument(level = "info", skip(state))]
pub async fn quiz_new_question(state: &AppState) -> Result<Screen, OpError> {
  let generation = {
    let mut active = state.active.write().await;
    if active.busy {
      return Err(OpError::Busy);
    }
    if !matches!(active.screen, Screen::Quiz(_)) {
      return Err(OpError::WrongScreen);
    }
    active.busy = true;
    active.screen = Screen::Quiz(None);
    active.generation
  };
  let round = quiz::new_round(state.gateway.as_ref()).await;
  commit(state, generation, Screen::Quiz(Some(round))).await
}

/// One busy window covers the evaluation call and the dependent image call.
#[instrument(level = "info", skip(state, answer), fields(answer_len = answer.len()))]
pub async fn quiz_submit_answer(state: &AppState, answer: &str) -> Result<Screen, OpError> {
  let (generation, round) = {
    let mut active = state.active.write().await;
    if active.busy {
      return Err(OpError::Busy);
    }
    let Screen::Quiz(Some(round)) = &active.screen else {
      return Err(OpError::WrongScreen);
    };
    quiz::check_answer(round, answer)?;
    let round = round.clone();
    active.busy = true;
    (active.generation, round)
  };
  match quiz::submit_answer(&round, answer, state.gateway.as_ref()).await {
    Ok(next) => commit(state, generation, Screen::Quiz(Some(next))).await,
    Err(e) => {
      rollback(state, generation, Screen::Quiz(Some(round))).await;
      Err(e.into())
    }
  }
}

// -------- Battle --------

/// Seat the players and fetch a scenario. The count is clamped here, at the
/// caller, to at least 2; the machine itself does not enforce it.
#[instrument(level = "info", skip(state))]
pub async fn battle_configure(state: &AppState, player_count: u32) -> Result<Screen, OpError> {
  let player_count = player_count.max(2);
  let generation = {
    let mut active = state.active.write().await;
    if active.busy {
      return Err(OpError::Busy);
    }
    let Screen::Battle(session) = &active.screen else {
      return Err(OpError::WrongScreen);
    };
    if session.status != BattleStatus::Configuring {
      return Err(TransitionError::InvalidState("battle is already configured").into());
    }
    active.busy = true;
    active.generation
  };
  let session = battle::configure(player_count, state.gateway.as_ref()).await;
  commit(state, generation, Screen::Battle(session)).await
}

pub async fn battle_update_prompt(
  state: &AppState,
  player_id: u32,
  text: &str,
) -> Result<Screen, OpError> {
  let mut active = state.active.write().await;
  if active.busy {
    return Err(OpError::Busy);
  }
  let Screen::Battle(session) = &mut active.screen else {
    return Err(OpError::WrongScreen);
  };
  battle::update_prompt(session, player_id, text)?;
  Ok(active.screen.clone())
}

/// Evaluating is published before the call resolves so clients render the
/// judging view immediately.
#[instrument(level = "info", skip(state))]
pub async fn battle_evaluate(state: &AppState) -> Result<Screen, OpError> {
  let (generation, session) = {
    let mut active = state.active.write().await;
    if active.busy {
      return Err(OpError::Busy);
    }
    let Screen::Battle(session) = &mut active.screen else {
      return Err(OpError::WrongScreen);
    };
    battle::check_evaluate(session)?;
    let snapshot = session.clone();
    session.status = BattleStatus::Evaluating;
    active.busy = true;
    (active.generation, snapshot)
  };
  match battle::evaluate(&session, state.gateway.as_ref()).await {
    Ok(next) => commit(state, generation, Screen::Battle(next)).await,
    Err(e) => {
      rollback(state, generation, Screen::Battle(session)).await;
      Err(e.into())
    }
  }
}

// -------- Twenty questions --------

/// Enter the screen and immediately start a game: commit Starting so clients
/// see the spinner, then resolve to Playing or Idle-with-error. Also serves
/// as reset: the whole session is replaced, never merged.
#[instrument(level = "info", skip(state))]
pub async fn twenty_questions_reset(state: &AppState) -> Result<Screen, OpError> {
  let generation = {
    let mut active = state.active.write().await;
    active.generation += 1;
    active.busy = true;
    active.screen = Screen::TwentyQuestions(twenty_questions::starting_session());
    active.generation
  };
  let session = twenty_questions::start(state.gateway.as_ref()).await;
  commit(state, generation, Screen::TwentyQuestions(session)).await
}

#[instrument(level = "info", skip(state, question), fields(question_len = question.len()))]
pub async fn twenty_questions_ask(state: &AppState, question: &str) -> Result<Screen, OpError> {
  let (generation, session) = {
    let mut active = state.active.write().await;
    if active.busy {
      return Err(OpError::Busy);
    }
    let Screen::TwentyQuestions(session) = &mut active.screen else {
      return Err(OpError::WrongScreen);
    };
    twenty_questions::check_ask(session, question)?;
    let snapshot = session.clone();
    session.status = TwentyQuestionsStatus::Evaluating;
    active.busy = true;
    (active.generation, snapshot)
  };
  match twenty_questions::ask(&session, question, state.gateway.as_ref()).await {
    Ok(next) => commit(state, generation, Screen::TwentyQuestions(next)).await,
    Err(e) => {
      rollback(state, generation, Screen::TwentyQuestions(session)).await;
      Err(e.into())
    }
  }
}

#[instrument(level = "info", skip(state, text), fields(guess_len = text.len()))]
pub async fn twenty_questions_guess(state: &AppState, text: &str) -> Result<Screen, OpError> {
  let (generation, session) = {
    let mut active = state.active.write().await;
    if active.busy {
      return Err(OpError::Busy);
    }
    let Screen::TwentyQuestions(session) = &mut active.screen else {
      return Err(OpError::WrongScreen);
    };
    twenty_questions::check_guess(session, text)?;
    let snapshot = session.clone();
    session.status = TwentyQuestionsStatus::Evaluating;
    active.busy = true;
    (active.generation, snapshot)
  };
  match twenty_questions::guess(&session, text, state.gateway.as_ref()).await {
    Ok(next) => commit(state, generation, Screen::TwentyQuestions(next)).await,
    Err(e) => {
      rollback(state, generation, Screen::TwentyQuestions(session)).await;
      Err(e.into())
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::AppConfig;
  use crate::games::testing::ScriptedGateway;
  use std::sync::atomic::Ordering;
  use std::sync::Arc;
  use tokio::sync::Notify;

  fn app(gw: ScriptedGateway) -> (AppState, Arc<ScriptedGateway>) {
    let gw = Arc::new(gw);
    let state = AppState::with_gateway(AppConfig::default(), gw.clone());
    (state, gw)
  }

  async fn wait_for_call(gw: &ScriptedGateway) {
    while gw.calls.load(Ordering::SeqCst) == 0 {
      tokio::task::yield_now().await;
    }
  }

  #[tokio::test]
  async fn response_resolving_after_a_screen_switch_is_dropped() {
    let gate = Arc::new(Notify::new());
    let (state, gw) = app(ScriptedGateway {
      question: Some("Câu đố?".into()),
      gate: Some(gate.clone()),
      ..Default::default()
    });

    let pending = tokio::spawn({
      let state = state.clone();
      async move { start_quiz(&state).await }
    });
    wait_for_call(&gw).await;

    // Navigate away while the question is still in flight.
    show_welcome(&state).await;
    gate.notify_one();

    let result = pending.await.unwrap();
    assert!(matches!(result, Err(OpError::Stale)));
    assert!(matches!(current_screen(&state).await, Screen::Welcome));
    let active = state.active.read().await;
    assert!(!active.busy);
  }

  #[tokio::test]
  async fn second_gameplay_operation_during_a_busy_window_is_rejected() {
    let gate = Arc::new(Notify::new());
    let (state, gw) = app(ScriptedGateway {
      question: Some("Câu đố?".into()),
      gate: Some(gate.clone()),
      ..Default::default()
    });

    let pending = tokio::spawn({
      let state = state.clone();
      async move { start_quiz(&state).await }
    });
    wait_for_call(&gw).await;

    assert!(matches!(quiz_new_question(&state).await, Err(OpError::Busy)));

    gate.notify_one();
    let screen = pending.await.unwrap().unwrap();
    match screen {
      Screen::Quiz(Some(round)) => assert_eq!(round.question, "Câu đố?"),
      other => panic!("expected quiz round, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn resetting_twenty_questions_twice_always_ends_with_empty_history() {
    let (state, _gw) = app(ScriptedGateway { secret: Some("Con mèo".into()), ..Default::default() });
    for _ in 0..2 {
      let screen = twenty_questions_reset(&state).await.unwrap();
      match screen {
        Screen::TwentyQuestions(session) => {
          assert_eq!(session.status, TwentyQuestionsStatus::Playing);
          assert!(session.history.is_empty());
          assert_eq!(session.questions_left, twenty_questions::QUESTION_BUDGET);
        }
        other => panic!("expected twenty questions screen, got {:?}", other),
      }
    }
  }

  #[tokio::test]
  async fn added_topics_go_to_the_front_and_open_the_editor() {
    let (state, _gw) = app(ScriptedGateway::default());
    let before = list_topics(&state).await.len();
    add_topic(&state, "Chủ đề A").await.unwrap();
    let (topic_b, screen) = add_topic(&state, "Chủ đề B").await.unwrap();
    let topics = list_topics(&state).await;
    assert_eq!(topics.len(), before + 2);
    assert_eq!(topics[0].name, "Chủ đề B");
    assert_eq!(topics[1].name, "Chủ đề A");
    match screen {
      Screen::Editor { topic } => assert_eq!(topic.id, topic_b.id),
      other => panic!("expected editor, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn failed_random_topic_adds_nothing() {
    let (state, _gw) = app(ScriptedGateway::default());
    let before = list_topics(&state).await.len();
    assert!(matches!(random_topic(&state).await, Err(OpError::Unavailable(_))));
    assert_eq!(list_topics(&state).await.len(), before);
  }

  #[tokio::test]
  async fn battle_configure_clamps_the_player_count_to_two() {
    let (state, _gw) = app(ScriptedGateway { scenario: Some("chủ đề".into()), ..Default::default() });
    start_battle(&state).await;
    let screen = battle_configure(&state, 1).await.unwrap();
    match screen {
      Screen::Battle(session) => {
        assert_eq!(session.players.len(), 2);
        assert_eq!(session.status, BattleStatus::Writing);
      }
      other => panic!("expected battle, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn editor_helpers_degrade_to_their_fallback_literals() {
    let (state, _gw) = app(ScriptedGateway::default());
    assert_eq!(optimize_prompt(&state, "chủ đề", "nháp").await, OPTIMIZE_FALLBACK);
    assert_eq!(review_prompt(&state, "chủ đề", "nháp").await, REVIEW_FALLBACK);
    assert_eq!(suggest_prompts(&state, "chủ đề").await, vec![SUGGEST_FALLBACK.to_string()]);
  }
}
