//! Minimal Gemini client for our use-cases.
//!
//! We only call generateContent (plain text or schema-constrained JSON) and the
//! Imagen predict endpoint. Calls are instrumented and log model names,
//! latencies, and response sizes (not contents).
//!
//! NOTE: We never log the API key and we keep payload truncations short.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::Prompts;
use crate::domain::{BattlePlayer, HistoryItem, OracleAnswer};
use crate::util::{clean_short_answer, fill_template};

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Why a gateway call failed. Every call site converts this to the
/// call-specific fallback value; it never crosses a transition boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
  #[error("gateway disabled: GEMINI_API_KEY not set")]
  Disabled,
  #[error("request failed: {0}")]
  Network(#[from] reqwest::Error),
  #[error("Gemini HTTP {status}: {message}")]
  Http { status: u16, message: String },
  #[error("schema decode failed: {0}")]
  Decode(#[from] serde_json::Error),
  #[error("undecodable image payload")]
  BadImagePayload,
  #[error("empty completion")]
  EmptyResponse,
}

/// Quiz evaluation: friendly feedback plus an (optional) English image prompt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QuizEvaluation {
  pub feedback: String,
  pub image_prompt: String,
}

/// One scored battle entry, matched back to a player by id.
#[derive(Clone, Debug, PartialEq)]
pub struct BattleScore {
  pub player_id: u32,
  pub score: i32,
  pub feedback: String,
}

/// The operations the games and the orchestrator need from the AI backend.
/// `Gemini` is the live implementation; `Offline` fails every call so the
/// call sites degrade to their fallback literals; tests script their own.
#[async_trait]
pub trait Gateway: Send + Sync {
  async fn random_topic(&self) -> Result<String, GatewayError>;
  async fn battle_scenario(&self) -> Result<String, GatewayError>;
  async fn optimize_prompt(&self, topic: &str, draft: &str) -> Result<String, GatewayError>;
  async fn review_prompt(&self, topic: &str, draft: &str) -> Result<String, GatewayError>;
  async fn suggest_prompts(&self, topic: &str) -> Result<Vec<String>, GatewayError>;
  async fn quiz_question(&self) -> Result<String, GatewayError>;
  async fn evaluate_quiz_answer(&self, question: &str, answer: &str) -> Result<QuizEvaluation, GatewayError>;
  async fn quiz_image(&self, image_prompt: &str) -> Result<Vec<u8>, GatewayError>;
  async fn score_battle_prompts(&self, topic: &str, players: &[BattlePlayer]) -> Result<Vec<BattleScore>, GatewayError>;
  async fn secret_word(&self) -> Result<String, GatewayError>;
  async fn yes_no_answer(&self, secret: &str, history: &[HistoryItem], question: &str) -> Result<OracleAnswer, GatewayError>;
  async fn question_hint(&self, secret: &str, history: &[HistoryItem], asked: u32) -> Result<String, GatewayError>;
  async fn judge_guess(&self, secret: &str, guess: &str) -> Result<bool, GatewayError>;
}

#[derive(Clone)]
pub struct Gemini {
  pub client: reqwest::Client,
  pub api_key: String,
  pub base_url: String,
  pub text_model: String,
  pub image_model: String,
  pub prompts: Prompts,
}

impl Gemini {
  /// Construct the client if we find GEMINI_API_KEY; otherwise return None.
  pub fn from_env(prompts: Prompts) -> Option<Self> {
    let api_key = std::env::var("GEMINI_API_KEY").ok()?;
    let base_url = std::env::var("GEMINI_BASE_URL")
      .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());
    let text_model =
      std::env::var("GEMINI_TEXT_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".into());
    let image_model =
      std::env::var("GEMINI_IMAGE_MODEL").unwrap_or_else(|_| "imagen-3.0-generate-002".into());

    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(20))
      .build()
      .ok()?;

    Some(Self { client, api_key, base_url, text_model, image_model, prompts })
  }

  /// Plain-text generation. Used for topics, questions, editor helpers, hints.
  #[instrument(level = "info", skip(self, system, user, config), fields(model = %self.text_model))]
  async fn generate_text(
    &self,
    system: Option<&str>,
    user: &str,
    config: GenerationConfig,
  ) -> Result<String, GatewayError> {
    let body = self.generate_content(system, user, config).await?;
    let text = body
      .candidates
      .first()
      .and_then(|c| c.content.as_ref())
      .map(|c| {
        c.parts
          .iter()
          .filter_map(|p| p.text.as_deref())
          .collect::<Vec<_>>()
          .join("")
      })
      .unwrap_or_default()
      .trim()
      .to_string();
    if text.is_empty() {
      return Err(GatewayError::EmptyResponse);
    }
    Ok(text)
  }

  /// Schema-constrained generation. Generic over the target type T.
  #[instrument(level = "info", skip(self, system, user, schema, config), fields(model = %self.text_model))]
  async fn generate_json<T: for<'a> Deserialize<'a>>(
    &self,
    system: Option<&str>,
    user: &str,
    schema: Value,
    mut config: GenerationConfig,
  ) -> Result<T, GatewayError> {
    config.response_mime_type = Some("application/json".into());
    config.response_schema = Some(schema);
    let body = self.generate_content(system, user, config).await?;
    let text = body
      .candidates
      .first()
      .and_then(|c| c.content.as_ref())
      .map(|c| {
        c.parts
          .iter()
          .filter_map(|p| p.text.as_deref())
          .collect::<Vec<_>>()
          .join("")
      })
      .unwrap_or_default();
    Ok(serde_json::from_str::<T>(&text)?)
  }

  async fn generate_content(
    &self,
    system: Option<&str>,
    user: &str,
    config: GenerationConfig,
  ) -> Result<GenerateContentResponse, GatewayError> {
    let url = format!("{}/models/{}:generateContent", self.base_url, self.text_model);
    let req = GenerateContentRequest {
      contents: vec![Content {
        role: Some("user".into()),
        parts: vec![Part { text: user.into() }],
      }],
      system_instruction: system.map(|s| Content { role: None, parts: vec![Part { text: s.into() }] }),
      generation_config: Some(config),
    };

    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "promptplay-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(API_KEY_HEADER, &self.api_key)
      .json(&req)
      .send()
      .await?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_gemini_error(&body).unwrap_or(body);
      return Err(GatewayError::Http { status, message });
    }

    let body: GenerateContentResponse = res.json().await?;
    if let Some(usage) = &body.usage_metadata {
      info!(prompt_tokens = ?usage.prompt_token_count, completion_tokens = ?usage.candidates_token_count, total_tokens = ?usage.total_token_count, "Gemini usage");
    }
    Ok(body)
  }

  /// Image generation via the Imagen predict endpoint. Returns raw bytes.
  #[instrument(level = "info", skip(self, prompt), fields(model = %self.image_model, prompt_len = prompt.len()))]
  async fn generate_image(
    &self,
    prompt: &str,
    aspect_ratio: &str,
    output_mime: &str,
  ) -> Result<Vec<u8>, GatewayError> {
    let url = format!("{}/models/{}:predict", self.base_url, self.image_model);
    let req = ImagenRequest {
      instances: vec![ImagenInstance { prompt: prompt.into() }],
      parameters: ImagenParameters {
        sample_count: 1,
        aspect_ratio: aspect_ratio.into(),
        output_mime_type: output_mime.into(),
      },
    };

    let res = self
      .client
      .post(&url)
      .header(USER_AGENT, "promptplay-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(API_KEY_HEADER, &self.api_key)
      .json(&req)
      .send()
      .await?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_gemini_error(&body).unwrap_or(body);
      return Err(GatewayError::Http { status, message });
    }

    let body: ImagenResponse = res.json().await?;
    let encoded = body
      .predictions
      .first()
      .map(|p| p.bytes_base64_encoded.as_str())
      .unwrap_or_default();
    if encoded.is_empty() {
      return Err(GatewayError::EmptyResponse);
    }
    B64.decode(encoded).map_err(|_| GatewayError::BadImagePayload)
  }
}

/// Question items rendered the way the judge prompts expect them.
/// Hints and guesses never feed back into the model.
fn history_as_text(history: &[HistoryItem]) -> String {
  history
    .iter()
    .filter_map(|h| match h {
      HistoryItem::Question { text, answer } => {
        Some(format!("Hỏi: {}\nĐáp: {}", text, answer.as_str()))
      }
      _ => None,
    })
    .collect::<Vec<_>>()
    .join("\n\n")
}

#[async_trait]
impl Gateway for Gemini {
  #[instrument(level = "info", skip(self))]
  async fn random_topic(&self) -> Result<String, GatewayError> {
    let text = self
      .generate_text(
        None,
        &self.prompts.random_topic_user,
        GenerationConfig {
          temperature: Some(1.0),
          max_output_tokens: Some(50),
          thinking_config: Some(ThinkingConfig { thinking_budget: 0 }),
          ..Default::default()
        },
      )
      .await?;
    Ok(clean_short_answer(&text))
  }

  #[instrument(level = "info", skip(self))]
  async fn battle_scenario(&self) -> Result<String, GatewayError> {
    let text = self
      .generate_text(
        None,
        &self.prompts.battle_topic_user,
        GenerationConfig {
          temperature: Some(1.0),
          max_output_tokens: Some(150),
          thinking_config: Some(ThinkingConfig { thinking_budget: 0 }),
          ..Default::default()
        },
      )
      .await?;
    Ok(clean_short_answer(&text))
  }

  #[instrument(level = "info", skip(self, topic, draft), fields(topic_len = topic.len(), draft_len = draft.len()))]
  async fn optimize_prompt(&self, topic: &str, draft: &str) -> Result<String, GatewayError> {
    let user = fill_template(&self.prompts.optimize_user_template, &[("topic", topic), ("prompt", draft)]);
    self
      .generate_text(Some(&self.prompts.optimize_system), &user, GenerationConfig::default())
      .await
  }

  #[instrument(level = "info", skip(self, topic, draft), fields(topic_len = topic.len(), draft_len = draft.len()))]
  async fn review_prompt(&self, topic: &str, draft: &str) -> Result<String, GatewayError> {
    let user = fill_template(&self.prompts.review_user_template, &[("topic", topic), ("prompt", draft)]);
    self
      .generate_text(Some(&self.prompts.review_system), &user, GenerationConfig::default())
      .await
  }

  #[instrument(level = "info", skip(self, topic), fields(topic_len = topic.len()))]
  async fn suggest_prompts(&self, topic: &str) -> Result<Vec<String>, GatewayError> {
    #[derive(Deserialize)]
    struct Suggestions {
      #[serde(default)]
      prompts: Vec<String>,
    }

    let schema = json!({
      "type": "OBJECT",
      "properties": {
        "prompts": {
          "type": "ARRAY",
          "description": "Một danh sách gồm 3 prompt gợi ý.",
          "items": { "type": "STRING" }
        }
      },
      "required": ["prompts"]
    });
    let user = fill_template(&self.prompts.suggest_user_template, &[("topic", topic)]);
    let s: Suggestions = self
      .generate_json(Some(&self.prompts.suggest_system), &user, schema, GenerationConfig::default())
      .await?;
    Ok(s.prompts)
  }

  #[instrument(level = "info", skip(self))]
  async fn quiz_question(&self) -> Result<String, GatewayError> {
    self
      .generate_text(
        None,
        &self.prompts.quiz_question_user,
        GenerationConfig {
          temperature: Some(0.9),
          thinking_config: Some(ThinkingConfig { thinking_budget: 0 }),
          ..Default::default()
        },
      )
      .await
  }

  #[instrument(level = "info", skip(self, question, answer), fields(question_len = question.len(), answer_len = answer.len()))]
  async fn evaluate_quiz_answer(&self, question: &str, answer: &str) -> Result<QuizEvaluation, GatewayError> {
    #[derive(Deserialize)]
    struct Eval {
      feedback: String,
      #[serde(rename = "imagePrompt")]
      image_prompt: String,
    }

    let schema = json!({
      "type": "OBJECT",
      "properties": {
        "feedback": {
          "type": "STRING",
          "description": "Phản hồi bằng tiếng Việt, thân thiện và mang tính xây dựng cho câu trả lời của học sinh."
        },
        "imagePrompt": {
          "type": "STRING",
          "description": "Một prompt bằng tiếng Anh, đơn giản để tạo hình ảnh minh họa cho câu trả lời đúng. Ví dụ: 'A cute cartoon sun wearing sunglasses and smiling'."
        }
      },
      "required": ["feedback", "imagePrompt"]
    });
    let user = fill_template(
      &self.prompts.quiz_eval_user_template,
      &[("question", question), ("answer", answer)],
    );
    let e: Eval = self
      .generate_json(Some(&self.prompts.quiz_eval_system), &user, schema, GenerationConfig::default())
      .await?;
    Ok(QuizEvaluation { feedback: e.feedback, image_prompt: e.image_prompt })
  }

  #[instrument(level = "info", skip(self, image_prompt), fields(prompt_len = image_prompt.len()))]
  async fn quiz_image(&self, image_prompt: &str) -> Result<Vec<u8>, GatewayError> {
    let styled = format!("{}{}", image_prompt, self.prompts.quiz_image_style);
    self.generate_image(&styled, "1:1", "image/jpeg").await
  }

  #[instrument(level = "info", skip(self, topic, players), fields(topic_len = topic.len(), player_count = players.len()))]
  async fn score_battle_prompts(&self, topic: &str, players: &[BattlePlayer]) -> Result<Vec<BattleScore>, GatewayError> {
    #[derive(Deserialize)]
    struct Row {
      #[serde(rename = "playerId")]
      player_id: f32,
      score: f32,
      feedback: String,
    }

    let schema = json!({
      "type": "ARRAY",
      "description": "Danh sách kết quả chấm điểm cho mỗi người chơi.",
      "items": {
        "type": "OBJECT",
        "properties": {
          "playerId": { "type": "NUMBER", "description": "ID của người chơi (ví dụ: 1, 2, ...)" },
          "score": { "type": "NUMBER", "description": "Điểm số từ 1 đến 100." },
          "feedback": { "type": "STRING", "description": "Nhận xét mang tính xây dựng về prompt." }
        },
        "required": ["playerId", "score", "feedback"]
      }
    });
    let listing = players
      .iter()
      .map(|p| format!("- Người chơi {}: \"{}\"", p.id, p.prompt))
      .collect::<Vec<_>>()
      .join("\n");
    let user = fill_template(
      &self.prompts.battle_eval_user_template,
      &[("topic", topic), ("prompts", &listing)],
    );
    let rows: Vec<Row> = self.generate_json(None, &user, schema, GenerationConfig::default()).await?;
    Ok(
      rows
        .into_iter()
        .map(|r| BattleScore {
          player_id: r.player_id.round() as u32,
          score: r.score.round() as i32,
          feedback: r.feedback,
        })
        .collect(),
    )
  }

  #[instrument(level = "info", skip(self))]
  async fn secret_word(&self) -> Result<String, GatewayError> {
    let text = self
      .generate_text(
        None,
        &self.prompts.tq_secret_user,
        GenerationConfig {
          temperature: Some(1.0),
          thinking_config: Some(ThinkingConfig { thinking_budget: 0 }),
          ..Default::default()
        },
      )
      .await?;
    Ok(clean_short_answer(&text))
  }

  #[instrument(level = "info", skip(self, secret, history, question), fields(history_len = history.len(), question_len = question.len()))]
  async fn yes_no_answer(&self, secret: &str, history: &[HistoryItem], question: &str) -> Result<OracleAnswer, GatewayError> {
    #[derive(Deserialize)]
    struct Answer {
      answer: String,
    }

    let schema = json!({
      "type": "OBJECT",
      "properties": {
        "answer": {
          "type": "STRING",
          "description": "Câu trả lời cho câu hỏi. Phải là một trong các giá trị: 'Có', 'Không', 'Không thể trả lời'."
        }
      },
      "required": ["answer"]
    });
    let transcript = history_as_text(history);
    let user = fill_template(
      &self.prompts.tq_answer_user_template,
      &[("secret", secret), ("history", &transcript), ("question", question)],
    );
    let a: Answer = self
      .generate_json(
        Some(&self.prompts.tq_answer_system),
        &user,
        schema,
        GenerationConfig {
          thinking_config: Some(ThinkingConfig { thinking_budget: 0 }),
          ..Default::default()
        },
      )
      .await?;
    Ok(OracleAnswer::parse(&a.answer))
  }

  #[instrument(level = "info", skip(self, secret, history), fields(history_len = history.len()))]
  async fn question_hint(&self, secret: &str, history: &[HistoryItem], asked: u32) -> Result<String, GatewayError> {
    let instruction = match asked {
      5 => &self.prompts.tq_hint_level1,
      10 => &self.prompts.tq_hint_level2,
      15 => &self.prompts.tq_hint_level3,
      19 => &self.prompts.tq_hint_level4,
      // Not a hint milestone: nothing to say.
      _ => return Ok(String::new()),
    };
    let transcript = history_as_text(history);
    let user = fill_template(
      &self.prompts.tq_hint_user_template,
      &[("secret", secret), ("history", &transcript), ("instruction", instruction)],
    );
    let text = self
      .generate_text(
        Some(&self.prompts.tq_hint_system),
        &user,
        GenerationConfig {
          temperature: Some(0.7),
          thinking_config: Some(ThinkingConfig { thinking_budget: 0 }),
          ..Default::default()
        },
      )
      .await?;
    Ok(text.trim().to_string())
  }

  #[instrument(level = "info", skip(self, secret, guess), fields(guess_len = guess.len()))]
  async fn judge_guess(&self, secret: &str, guess: &str) -> Result<bool, GatewayError> {
    #[derive(Deserialize)]
    struct Verdict {
      #[serde(default, rename = "isCorrect")]
      is_correct: bool,
    }

    let schema = json!({
      "type": "OBJECT",
      "properties": {
        "isCorrect": {
          "type": "BOOLEAN",
          "description": "True nếu người chơi đoán đúng, False nếu đoán sai."
        }
      },
      "required": ["isCorrect"]
    });
    let user = fill_template(
      &self.prompts.tq_guess_user_template,
      &[("secret", secret), ("guess", guess)],
    );
    let v: Verdict = self
      .generate_json(Some(&self.prompts.tq_guess_system), &user, schema, GenerationConfig::default())
      .await?;
    Ok(v.is_correct)
  }
}

/// Stand-in used when GEMINI_API_KEY is absent. Every call fails with
/// `Disabled`, so each call site serves its fallback literal instead.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

#[async_trait]
impl Gateway for Offline {
  async fn random_topic(&self) -> Result<String, GatewayError> {
    Err(GatewayError::Disabled)
  }
  async fn battle_scenario(&self) -> Result<String, GatewayError> {
    Err(GatewayError::Disabled)
  }
  async fn optimize_prompt(&self, _topic: &str, _draft: &str) -> Result<String, GatewayError> {
    Err(GatewayError::Disabled)
  }
  async fn review_prompt(&self, _topic: &str, _draft: &str) -> Result<String, GatewayError> {
    Err(GatewayError::Disabled)
  }
  async fn suggest_prompts(&self, _topic: &str) -> Result<Vec<String>, GatewayError> {
    Err(GatewayError::Disabled)
  }
  async fn quiz_question(&self) -> Result<String, GatewayError> {
    Err(GatewayError::Disabled)
  }
  async fn evaluate_quiz_answer(&self, _question: &str, _answer: &str) -> Result<QuizEvaluation, GatewayError> {
    Err(GatewayError::Disabled)
  }
  async fn quiz_image(&self, _image_prompt: &str) -> Result<Vec<u8>, GatewayError> {
    Err(GatewayError::Disabled)
  }
  async fn score_battle_prompts(&self, _topic: &str, _players: &[BattlePlayer]) -> Result<Vec<BattleScore>, GatewayError> {
    Err(GatewayError::Disabled)
  }
  async fn secret_word(&self) -> Result<String, GatewayError> {
    Err(GatewayError::Disabled)
  }
  async fn yes_no_answer(&self, _secret: &str, _history: &[HistoryItem], _question: &str) -> Result<OracleAnswer, GatewayError> {
    Err(GatewayError::Disabled)
  }
  async fn question_hint(&self, _secret: &str, _history: &[HistoryItem], _asked: u32) -> Result<String, GatewayError> {
    Err(GatewayError::Disabled)
  }
  async fn judge_guess(&self, _secret: &str, _guess: &str) -> Result<bool, GatewayError> {
    Err(GatewayError::Disabled)
  }
}

// --- Wire DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
  contents: Vec<Content>,
  #[serde(skip_serializing_if = "Option::is_none")]
  system_instruction: Option<Content>,
  #[serde(skip_serializing_if = "Option::is_none")]
  generation_config: Option<GenerationConfig>,
}

#[derive(Serialize)]
struct Content {
  #[serde(skip_serializing_if = "Option::is_none")]
  role: Option<String>,
  parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
  text: String,
}

#[derive(Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
  #[serde(skip_serializing_if = "Option::is_none")]
  temperature: Option<f32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  max_output_tokens: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_mime_type: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  response_schema: Option<Value>,
  #[serde(skip_serializing_if = "Option::is_none")]
  thinking_config: Option<ThinkingConfig>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
  thinking_budget: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)]
  candidates: Vec<Candidate>,
  #[serde(default)]
  usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
  content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
  #[serde(default)]
  parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
  text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)]
  prompt_token_count: Option<u32>,
  #[serde(default)]
  candidates_token_count: Option<u32>,
  #[serde(default)]
  total_token_count: Option<u32>,
}

#[derive(Serialize)]
struct ImagenRequest {
  instances: Vec<ImagenInstance>,
  parameters: ImagenParameters,
}

#[derive(Serialize)]
struct ImagenInstance {
  prompt: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ImagenParameters {
  sample_count: u32,
  aspect_ratio: String,
  output_mime_type: String,
}

#[derive(Deserialize)]
struct ImagenResponse {
  #[serde(default)]
  predictions: Vec<ImagenPrediction>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ImagenPrediction {
  #[serde(default)]
  bytes_base64_encoded: String,
}

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap {
    error: EObj,
  }
  #[derive(Deserialize)]
  struct EObj {
    message: String,
  }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn history_text_keeps_questions_only() {
    let history = vec![
      HistoryItem::Question { text: "Nó có sống không?".into(), answer: OracleAnswer::No },
      HistoryItem::Hint { text: "Gợi ý: Nó là một đồ vật".into() },
      HistoryItem::Guess { text: "Cái bút".into() },
    ];
    let text = history_as_text(&history);
    assert_eq!(text, "Hỏi: Nó có sống không?\nĐáp: Không");
  }

  #[test]
  fn oracle_answer_coerces_unknown_values() {
    assert_eq!(OracleAnswer::parse("Có"), OracleAnswer::Yes);
    assert_eq!(OracleAnswer::parse(" Không "), OracleAnswer::No);
    assert_eq!(OracleAnswer::parse("Chắc chắn rồi!"), OracleAnswer::CannotAnswer);
  }

  #[test]
  fn gemini_error_body_is_unwrapped() {
    let body = r#"{"error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}}"#;
    assert_eq!(extract_gemini_error(body).as_deref(), Some("API key not valid"));
    assert_eq!(extract_gemini_error("not json"), None);
  }
}
