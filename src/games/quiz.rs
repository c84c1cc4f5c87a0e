//! Quiz state machine: a single-question trivia loop with an AI-evaluated
//! free-text answer and an AI-generated illustration of the correct answer.
//!
//! (none) -> Asking -> Answered -> (loops to Asking via a new question)

use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use tracing::{error, instrument};

use crate::domain::{QuizRound, QuizStatus};
use crate::games::TransitionError;
use crate::gateway::{Gateway, QuizEvaluation};

const QUESTION_FALLBACK: &str = "Lỗi khi tạo câu hỏi quiz. Vui lòng thử lại.";
const EVAL_FALLBACK: &str = "Lỗi khi đánh giá câu trả lời. Vui lòng thử lại.";

/// Request a fresh question and replace the round wholesale. Generation
/// failure surfaces the fallback text as the question itself; the round still
/// reaches Asking so the learner can retry from the UI.
#[instrument(level = "info", skip(gateway))]
pub async fn new_round(gateway: &dyn Gateway) -> QuizRound {
  let question = match gateway.quiz_question().await {
    Ok(q) => q,
    Err(e) => {
      error!(target: "game", error = %e, "quiz question generation failed");
      QUESTION_FALLBACK.to_string()
    }
  };
  QuizRound {
    question,
    user_answer: String::new(),
    feedback_text: String::new(),
    status: QuizStatus::Asking,
    image_url: None,
  }
}

/// An answer is accepted only while Asking and only if non-blank.
pub fn check_answer(round: &QuizRound, answer: &str) -> Result<(), TransitionError> {
  if round.status != QuizStatus::Asking {
    return Err(TransitionError::InvalidState("no question is awaiting an answer"));
  }
  if answer.trim().is_empty() {
    return Err(TransitionError::EmptyInput);
  }
  Ok(())
}

/// Evaluate the answer, then request the illustration if the evaluation
/// produced an image prompt. The two calls are sequential: the image prompt
/// is part of the evaluation output. Image failure degrades to
/// `image_url = None` and never blocks the Answered transition.
#[instrument(level = "info", skip(round, answer, gateway), fields(answer_len = answer.len()))]
pub async fn submit_answer(
  round: &QuizRound,
  answer: &str,
  gateway: &dyn Gateway,
) -> Result<QuizRound, TransitionError> {
  check_answer(round, answer)?;
  let answer = answer.trim();

  let eval = match gateway.evaluate_quiz_answer(&round.question, answer).await {
    Ok(e) => e,
    Err(e) => {
      error!(target: "game", error = %e, "quiz evaluation failed; serving fallback feedback");
      QuizEvaluation { feedback: EVAL_FALLBACK.to_string(), image_prompt: String::new() }
    }
  };

  let image_url = if eval.image_prompt.is_empty() {
    None
  } else {
    match gateway.quiz_image(&eval.image_prompt).await {
      Ok(bytes) if !bytes.is_empty() => Some(format!("data:image/jpeg;base64,{}", B64.encode(&bytes))),
      Ok(_) => None,
      Err(e) => {
        error!(target: "game", error = %e, "quiz illustration failed; answer stays text-only");
        None
      }
    }
  };

  Ok(QuizRound {
    question: round.question.clone(),
    user_answer: answer.to_string(),
    feedback_text: eval.feedback,
    status: QuizStatus::Answered,
    image_url,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::games::testing::ScriptedGateway;
  use std::sync::atomic::Ordering;

  fn asking(question: &str) -> QuizRound {
    QuizRound {
      question: question.into(),
      user_answer: String::new(),
      feedback_text: String::new(),
      status: QuizStatus::Asking,
      image_url: None,
    }
  }

  #[tokio::test]
  async fn answer_with_image_reaches_answered_with_data_url() {
    let gw = ScriptedGateway {
      quiz_eval: Some(QuizEvaluation { feedback: "Close!".into(), image_prompt: "a red apple".into() }),
      image: Some(vec![0xFF, 0xD8, 0xFF]),
      ..Default::default()
    };
    let round = asking("What has keys but no locks?");
    let next = submit_answer(&round, "42", &gw).await.unwrap();
    assert_eq!(next.status, QuizStatus::Answered);
    assert_eq!(next.user_answer, "42");
    assert_eq!(next.feedback_text, "Close!");
    assert!(next.image_url.as_deref().unwrap().starts_with("data:image/jpeg;base64,"));
  }

  #[tokio::test]
  async fn image_failure_does_not_block_evaluation_success() {
    let gw = ScriptedGateway {
      quiz_eval: Some(QuizEvaluation { feedback: "Close!".into(), image_prompt: "a red apple".into() }),
      image: None,
      ..Default::default()
    };
    let next = submit_answer(&asking("q"), "42", &gw).await.unwrap();
    assert_eq!(next.status, QuizStatus::Answered);
    assert_eq!(next.feedback_text, "Close!");
    assert_eq!(next.image_url, None);
  }

  #[tokio::test]
  async fn evaluation_failure_serves_fallback_and_skips_image_call() {
    let gw = ScriptedGateway::default();
    let next = submit_answer(&asking("q"), "42", &gw).await.unwrap();
    assert_eq!(next.status, QuizStatus::Answered);
    assert_eq!(next.feedback_text, EVAL_FALLBACK);
    assert_eq!(next.image_url, None);
    assert_eq!(gw.image_calls.load(Ordering::SeqCst), 0);
  }

  #[tokio::test]
  async fn blank_answer_and_answered_round_are_rejected() {
    let gw = ScriptedGateway::default();
    assert_eq!(
      submit_answer(&asking("q"), "   ", &gw).await.unwrap_err(),
      TransitionError::EmptyInput
    );

    let mut done = asking("q");
    done.status = QuizStatus::Answered;
    assert!(matches!(
      submit_answer(&done, "42", &gw).await.unwrap_err(),
      TransitionError::InvalidState(_)
    ));
  }

  #[tokio::test]
  async fn failed_question_generation_surfaces_fallback_as_question() {
    let gw = ScriptedGateway::default();
    let round = new_round(&gw).await;
    assert_eq!(round.status, QuizStatus::Asking);
    assert_eq!(round.question, QUESTION_FALLBACK);
    assert_eq!(round.image_url, None);
  }
}
