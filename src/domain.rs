//! Domain models used by the backend: topics, game sessions, and their status enums.

use serde::{Deserialize, Serialize};

/// A practice topic shown in the sidebar list.
/// Never mutated after creation; newest topics go to the front of the list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Topic {
  pub id: String,
  pub name: String,
}

// ---------- Quiz ----------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
  /// A question is on screen and awaits the learner's answer.
  Asking,
  /// Feedback (and possibly an illustration) has been produced.
  Answered,
}

/// One live quiz round. Replaced wholesale when a new question starts.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuizRound {
  pub question: String,
  pub user_answer: String,
  pub feedback_text: String,
  pub status: QuizStatus,
  /// `data:image/jpeg;base64,…` when illustration succeeded, None otherwise.
  pub image_url: Option<String>,
}

// ---------- Prompt battle ----------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleStatus {
  Configuring,
  Writing,
  Evaluating,
  Results,
}

/// Ids are assigned 1..=N at configuration time and never change.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattlePlayer {
  pub id: u32,
  pub prompt: String,
  pub score: i32,
  pub feedback: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BattleSession {
  pub status: BattleStatus,
  pub topic: String,
  pub players: Vec<BattlePlayer>,
}

// ---------- Twenty questions ----------

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TwentyQuestionsStatus {
  Idle,
  Starting,
  Playing,
  Evaluating,
  Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameResult {
  Win,
  Lose,
}

/// The three answers the oracle may give to a yes/no question.
/// Anything else coming back from the model is coerced to `CannotAnswer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OracleAnswer {
  #[serde(rename = "Có")]
  Yes,
  #[serde(rename = "Không")]
  No,
  #[serde(rename = "Không thể trả lời")]
  CannotAnswer,
}

impl OracleAnswer {
  /// Non-failing parse: unknown strings become `CannotAnswer`.
  pub fn parse(s: &str) -> Self {
    match s.trim() {
      "Có" => OracleAnswer::Yes,
      "Không" => OracleAnswer::No,
      _ => OracleAnswer::CannotAnswer,
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      OracleAnswer::Yes => "Có",
      OracleAnswer::No => "Không",
      OracleAnswer::CannotAnswer => "Không thể trả lời",
    }
  }
}

/// One entry of the question/answer transcript. Append-only within a session.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HistoryItem {
  Question { text: String, answer: OracleAnswer },
  Guess { text: String },
  Hint { text: String },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TwentyQuestionsSession {
  pub status: TwentyQuestionsStatus,
  /// Set exactly once per session (Starting -> Playing). Withheld from
  /// client snapshots until the game is finished.
  pub secret_word: String,
  pub history: Vec<HistoryItem>,
  pub questions_left: u32,
  pub game_result: Option<GameResult>,
  pub error: Option<String>,
}
