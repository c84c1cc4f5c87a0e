//! The three game state machines.
//!
//! Each module exposes transition functions from a borrowed session to a new
//! session, plus synchronous `check_*` preconditions so the orchestrator can
//! reject an intent before committing an optimistic in-flight status. The
//! gateway is only reached through the `Gateway` trait, so every transition
//! is testable against a scripted stand-in.

pub mod battle;
pub mod quiz;
pub mod twenty_questions;

use thiserror::Error;

/// An intent arrived in a state that cannot accept it. The session is left
/// untouched; no gateway call is issued.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
  #[error("input must not be empty")]
  EmptyInput,
  #[error("{0}")]
  InvalidState(&'static str),
  #[error("no player with id {0}")]
  UnknownPlayer(u32),
}

#[cfg(test)]
pub(crate) mod testing {
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::Arc;

  use async_trait::async_trait;
  use tokio::sync::Notify;

  use crate::domain::{BattlePlayer, HistoryItem, OracleAnswer};
  use crate::gateway::{BattleScore, Gateway, GatewayError, QuizEvaluation};

  /// Scripted gateway: each field is the canned reply for one operation;
  /// `None` means the call fails (as the offline stand-in would). When a
  /// `gate` is set, every call parks until the test releases it, which lets
  /// tests interleave a screen switch with an in-flight response.
  #[derive(Default)]
  pub struct ScriptedGateway {
    pub topic: Option<String>,
    pub scenario: Option<String>,
    pub optimized: Option<String>,
    pub review: Option<String>,
    pub suggestions: Option<Vec<String>>,
    pub question: Option<String>,
    pub quiz_eval: Option<QuizEvaluation>,
    pub image: Option<Vec<u8>>,
    pub battle_scores: Option<Vec<BattleScore>>,
    pub secret: Option<String>,
    pub answer: Option<OracleAnswer>,
    pub hint: Option<String>,
    pub guess_correct: Option<bool>,
    pub gate: Option<Arc<Notify>>,
    pub calls: AtomicUsize,
    pub hint_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
  }

  impl ScriptedGateway {
    async fn pause(&self) {
      self.calls.fetch_add(1, Ordering::SeqCst);
      if let Some(gate) = &self.gate {
        gate.notified().await;
      }
    }

    fn reply<T: Clone>(field: &Option<T>) -> Result<T, GatewayError> {
      field.clone().ok_or(GatewayError::Disabled)
    }
  }

  #[async_trait]
  impl Gateway for ScriptedGateway {
    async fn random_topic(&self) -> Result<String, GatewayError> {
      self.pause().await;
      Self::reply(&self.topic)
    }
    async fn battle_scenario(&self) -> Result<String, GatewayError> {
      self.pause().await;
      Self::reply(&self.scenario)
    }
    async fn optimize_prompt(&self, _topic: &str, _draft: &str) -> Result<String, GatewayError> {
      self.pause().await;
      Self::reply(&self.optimized)
    }
    async fn review_prompt(&self, _topic: &str, _draft: &str) -> Result<String, GatewayError> {
      self.pause().await;
      Self::reply(&self.review)
    }
    async fn suggest_prompts(&self, _topic: &str) -> Result<Vec<String>, GatewayError> {
      self.pause().await;
      Self::reply(&self.suggestions)
    }
    async fn quiz_question(&self) -> Result<String, GatewayError> {
      self.pause().await;
      Self::reply(&self.question)
    }
    async fn evaluate_quiz_answer(&self, _question: &str, _answer: &str) -> Result<QuizEvaluation, GatewayError> {
      self.pause().await;
      Self::reply(&self.quiz_eval)
    }
    async fn quiz_image(&self, _image_prompt: &str) -> Result<Vec<u8>, GatewayError> {
      self.image_calls.fetch_add(1, Ordering::SeqCst);
      self.pause().await;
      Self::reply(&self.image)
    }
    async fn score_battle_prompts(&self, _topic: &str, _players: &[BattlePlayer]) -> Result<Vec<BattleScore>, GatewayError> {
      self.pause().await;
      Self::reply(&self.battle_scores)
    }
    async fn secret_word(&self) -> Result<String, GatewayError> {
      self.pause().await;
      Self::reply(&self.secret)
    }
    async fn yes_no_answer(&self, _secret: &str, _history: &[HistoryItem], _question: &str) -> Result<OracleAnswer, GatewayError> {
      self.pause().await;
      Self::reply(&self.answer)
    }
    async fn question_hint(&self, _secret: &str, _history: &[HistoryItem], _asked: u32) -> Result<String, GatewayError> {
      self.hint_calls.fetch_add(1, Ordering::SeqCst);
      self.pause().await;
      Self::reply(&self.hint)
    }
    async fn judge_guess(&self, _secret: &str, _guess: &str) -> Result<bool, GatewayError> {
      self.pause().await;
      Self::reply(&self.guess_correct)
    }
  }
}
