//! Twenty Questions state machine: a turn-based yes/no guessing game with
//! milestone hints and a final AI-judged guess.
//!
//! Idle -> Starting -> Playing -> Evaluating -> Playing | Finished;
//! Finished -> (Starting, on reset); a failed start falls back to Idle with
//! a user-visible error.

use tracing::{error, info, instrument};

use crate::domain::{
  GameResult, HistoryItem, OracleAnswer, TwentyQuestionsSession, TwentyQuestionsStatus,
};
use crate::games::TransitionError;
use crate::gateway::Gateway;

const START_ERROR: &str = "Không thể bắt đầu trò chơi. Vui lòng thử lại.";
const HINT_UNAVAILABLE: &str = "Gợi ý: Không thể tạo gợi ý vào lúc này.";

pub const QUESTION_BUDGET: u32 = 20;
/// Questions-asked counts at which one hint is generated, with increasingly
/// revealing instructions (vague category at 5 up to near-reveal at 19).
const HINT_MILESTONES: [u32; 4] = [5, 10, 15, 19];

fn fresh(status: TwentyQuestionsStatus) -> TwentyQuestionsSession {
  TwentyQuestionsSession {
    status,
    secret_word: String::new(),
    history: Vec::new(),
    questions_left: QUESTION_BUDGET,
    game_result: None,
    error: None,
  }
}

/// The screen's initial state, before any game has been started.
pub fn idle_session() -> TwentyQuestionsSession {
  fresh(TwentyQuestionsStatus::Idle)
}

/// The state committed while the secret word is being requested. Replaces
/// whatever session came before it; reset never merges.
pub fn starting_session() -> TwentyQuestionsSession {
  fresh(TwentyQuestionsStatus::Starting)
}

/// Resolve Starting: request the secret word and enter Playing, or fall back
/// to Idle carrying the fixed error message. The secret is set here, exactly
/// once per session.
#[instrument(level = "info", skip(gateway))]
pub async fn start(gateway: &dyn Gateway) -> TwentyQuestionsSession {
  match gateway.secret_word().await {
    Ok(secret) if !secret.trim().is_empty() => {
      info!(target: "game", secret_len = secret.len(), "twenty questions started");
      let mut session = fresh(TwentyQuestionsStatus::Playing);
      session.secret_word = secret;
      session
    }
    Ok(_) => {
      error!(target: "game", "secret word came back blank");
      let mut session = idle_session();
      session.error = Some(START_ERROR.to_string());
      session
    }
    Err(e) => {
      error!(target: "game", error = %e, "secret word generation failed");
      let mut session = idle_session();
      session.error = Some(START_ERROR.to_string());
      session
    }
  }
}

/// A question is accepted only while Playing, only if non-blank, and only
/// while the budget has room.
pub fn check_ask(session: &TwentyQuestionsSession, question: &str) -> Result<(), TransitionError> {
  if session.status != TwentyQuestionsStatus::Playing {
    return Err(TransitionError::InvalidState("game is not accepting questions"));
  }
  if session.questions_left == 0 {
    return Err(TransitionError::InvalidState("no questions left to ask"));
  }
  if question.trim().is_empty() {
    return Err(TransitionError::EmptyInput);
  }
  Ok(())
}

/// Answer one question: append the Question item, consume one question from
/// the budget, and at milestones append one Hint item. A failed answer call
/// coerces to "cannot answer"; a failed hint call appends the fixed
/// unavailable-hint line. Exhausting the budget finishes the game as a loss.
#[instrument(level = "info", skip(session, question, gateway), fields(questions_left = session.questions_left))]
pub async fn ask(
  session: &TwentyQuestionsSession,
  question: &str,
  gateway: &dyn Gateway,
) -> Result<TwentyQuestionsSession, TransitionError> {
  check_ask(session, question)?;
  let question = question.trim();

  let answer = match gateway.yes_no_answer(&session.secret_word, &session.history, question).await {
    Ok(a) => a,
    Err(e) => {
      error!(target: "game", error = %e, "yes/no answer failed; coercing to cannot-answer");
      OracleAnswer::CannotAnswer
    }
  };

  let mut next = session.clone();
  next.history.push(HistoryItem::Question { text: question.to_string(), answer });
  next.questions_left -= 1;

  let asked = QUESTION_BUDGET - next.questions_left;
  if HINT_MILESTONES.contains(&asked) && next.questions_left > 0 {
    match gateway.question_hint(&next.secret_word, &next.history, asked).await {
      Ok(text) => {
        let text = text.trim();
        if !text.is_empty() {
          next.history.push(HistoryItem::Hint { text: format!("Gợi ý: {}", text) });
        }
      }
      Err(e) => {
        error!(target: "game", error = %e, asked, "hint generation failed");
        next.history.push(HistoryItem::Hint { text: HINT_UNAVAILABLE.to_string() });
      }
    }
  }

  if next.questions_left > 0 {
    next.status = TwentyQuestionsStatus::Playing;
  } else {
    next.status = TwentyQuestionsStatus::Finished;
    next.game_result = Some(GameResult::Lose);
    info!(target: "game", "question budget exhausted; game lost");
  }
  Ok(next)
}

/// A final guess is accepted only while Playing and only if non-blank.
/// Because exhausting the budget finishes the session, a guess can never
/// arrive with zero questions left.
pub fn check_guess(session: &TwentyQuestionsSession, text: &str) -> Result<(), TransitionError> {
  if session.status != TwentyQuestionsStatus::Playing {
    return Err(TransitionError::InvalidState("game is not accepting a final guess"));
  }
  if text.trim().is_empty() {
    return Err(TransitionError::EmptyInput);
  }
  Ok(())
}

/// Judge the final guess and finish the game either way. The guess does not
/// consume a question; a failed judgment call counts as incorrect.
#[instrument(level = "info", skip(session, text, gateway), fields(guess_len = text.len()))]
pub async fn guess(
  session: &TwentyQuestionsSession,
  text: &str,
  gateway: &dyn Gateway,
) -> Result<TwentyQuestionsSession, TransitionError> {
  check_guess(session, text)?;
  let text = text.trim();

  let correct = match gateway.judge_guess(&session.secret_word, text).await {
    Ok(c) => c,
    Err(e) => {
      error!(target: "game", error = %e, "guess judgment failed; counting as incorrect");
      false
    }
  };

  let mut next = session.clone();
  next.history.push(HistoryItem::Guess { text: text.to_string() });
  next.status = TwentyQuestionsStatus::Finished;
  next.game_result = Some(if correct { GameResult::Win } else { GameResult::Lose });
  info!(target: "game", correct, "final guess judged");
  Ok(next)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::games::testing::ScriptedGateway;
  use std::sync::atomic::Ordering;

  fn playing(secret: &str) -> TwentyQuestionsSession {
    let mut s = fresh(TwentyQuestionsStatus::Playing);
    s.secret_word = secret.into();
    s
  }

  fn answering() -> ScriptedGateway {
    ScriptedGateway {
      answer: Some(OracleAnswer::No),
      hint: Some("Nó là một đồ vật".into()),
      ..Default::default()
    }
  }

  #[tokio::test]
  async fn start_enters_playing_with_the_secret() {
    let gw = ScriptedGateway { secret: Some("Quả chuối".into()), ..Default::default() };
    let session = start(&gw).await;
    assert_eq!(session.status, TwentyQuestionsStatus::Playing);
    assert_eq!(session.secret_word, "Quả chuối");
    assert_eq!(session.questions_left, QUESTION_BUDGET);
    assert!(session.history.is_empty() && session.error.is_none());
  }

  #[tokio::test]
  async fn failed_start_falls_back_to_idle_with_error() {
    let session = start(&ScriptedGateway::default()).await;
    assert_eq!(session.status, TwentyQuestionsStatus::Idle);
    assert_eq!(session.error.as_deref(), Some(START_ERROR));
    assert!(session.secret_word.is_empty());

    let blank = ScriptedGateway { secret: Some("  ".into()), ..Default::default() };
    let session = start(&blank).await;
    assert_eq!(session.status, TwentyQuestionsStatus::Idle);
    assert_eq!(session.error.as_deref(), Some(START_ERROR));
  }

  #[tokio::test]
  async fn ask_consumes_exactly_one_question_and_records_the_answer() {
    let gw = answering();
    let session = playing("Con mèo");
    let next = ask(&session, "Nó có bay được không?", &gw).await.unwrap();
    assert_eq!(next.questions_left, session.questions_left - 1);
    assert_eq!(next.status, TwentyQuestionsStatus::Playing);
    assert!(matches!(
      next.history.last().unwrap(),
      HistoryItem::Question { answer: OracleAnswer::No, .. }
    ));
  }

  #[tokio::test]
  async fn fifth_question_appends_exactly_one_hint_after_it() {
    let gw = answering();
    let mut session = playing("Con mèo");
    for i in 1..=5u32 {
      session = ask(&session, &format!("câu hỏi {i}?"), &gw).await.unwrap();
    }
    assert_eq!(gw.hint_calls.load(Ordering::SeqCst), 1);
    assert_eq!(session.history.len(), 6);
    assert!(matches!(session.history[4], HistoryItem::Question { .. }));
    match &session.history[5] {
      HistoryItem::Hint { text } => assert_eq!(text, "Gợi ý: Nó là một đồ vật"),
      other => panic!("expected hint, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn no_hint_before_the_first_milestone() {
    let gw = answering();
    let mut session = playing("Con mèo");
    for i in 1..=4u32 {
      session = ask(&session, &format!("câu hỏi {i}?"), &gw).await.unwrap();
    }
    assert_eq!(gw.hint_calls.load(Ordering::SeqCst), 0);
    assert_eq!(session.history.len(), 4);
  }

  #[tokio::test]
  async fn hint_failure_appends_the_unavailable_line() {
    let gw = ScriptedGateway { answer: Some(OracleAnswer::Yes), ..Default::default() };
    let mut session = playing("Con mèo");
    for i in 1..=5u32 {
      session = ask(&session, &format!("câu hỏi {i}?"), &gw).await.unwrap();
    }
    match session.history.last().unwrap() {
      HistoryItem::Hint { text } => assert_eq!(text, HINT_UNAVAILABLE),
      other => panic!("expected hint, got {:?}", other),
    }
  }

  #[tokio::test]
  async fn twentieth_question_finishes_as_a_loss_without_a_hint() {
    let gw = answering();
    let mut session = playing("Con mèo");
    for i in 1..=20u32 {
      session = ask(&session, &format!("câu hỏi {i}?"), &gw).await.unwrap();
    }
    assert_eq!(session.questions_left, 0);
    assert_eq!(session.status, TwentyQuestionsStatus::Finished);
    assert_eq!(session.game_result, Some(GameResult::Lose));
    // Milestones at 5, 10, 15, 19 fired; 20 is not one and the budget is gone.
    assert_eq!(gw.hint_calls.load(Ordering::SeqCst), 4);
    assert_eq!(session.history.len(), 24);
  }

  #[tokio::test]
  async fn ask_with_no_questions_left_is_rejected_without_state_change() {
    let gw = answering();
    let mut session = playing("Con mèo");
    session.questions_left = 0;
    let before = session.clone();
    let err = ask(&session, "is it alive?", &gw).await.unwrap_err();
    assert!(matches!(err, TransitionError::InvalidState(_)));
    assert_eq!(session.history.len(), before.history.len());
    assert_eq!(session.questions_left, 0);
  }

  #[tokio::test]
  async fn ask_is_rejected_outside_playing_and_for_blank_questions() {
    let gw = answering();
    let session = playing("Con mèo");
    assert_eq!(ask(&session, "  ", &gw).await.unwrap_err(), TransitionError::EmptyInput);

    let idle = idle_session();
    assert!(matches!(
      ask(&idle, "Nó có sống không?", &gw).await.unwrap_err(),
      TransitionError::InvalidState(_)
    ));
  }

  #[tokio::test]
  async fn correct_guess_wins_without_consuming_a_question() {
    let gw = ScriptedGateway { guess_correct: Some(true), ..Default::default() };
    let session = playing("Con mèo");
    let next = guess(&session, "con mèo", &gw).await.unwrap();
    assert_eq!(next.status, TwentyQuestionsStatus::Finished);
    assert_eq!(next.game_result, Some(GameResult::Win));
    assert_eq!(next.questions_left, session.questions_left);
    assert!(matches!(next.history.last().unwrap(), HistoryItem::Guess { .. }));
  }

  #[tokio::test]
  async fn wrong_or_unjudgeable_guess_loses() {
    let wrong = ScriptedGateway { guess_correct: Some(false), ..Default::default() };
    let next = guess(&playing("Con mèo"), "cái bàn", &wrong).await.unwrap();
    assert_eq!(next.game_result, Some(GameResult::Lose));

    // Judgment call failure counts as incorrect.
    let failing = ScriptedGateway::default();
    let next = guess(&playing("Con mèo"), "cái bàn", &failing).await.unwrap();
    assert_eq!(next.status, TwentyQuestionsStatus::Finished);
    assert_eq!(next.game_result, Some(GameResult::Lose));
  }

  #[test]
  fn starting_session_is_always_a_clean_slate() {
    // Two resets in a row must both produce an empty history.
    let first = starting_session();
    let second = starting_session();
    for s in [first, second] {
      assert_eq!(s.status, TwentyQuestionsStatus::Starting);
      assert!(s.history.is_empty());
      assert_eq!(s.questions_left, QUESTION_BUDGET);
      assert_eq!(s.game_result, None);
      assert_eq!(s.error, None);
    }
  }
}
