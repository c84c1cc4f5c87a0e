//! Battle state machine: a multi-player prompt-writing competition scored by
//! one batched judgment call.
//!
//! Configuring -> Writing -> Evaluating -> Results -> (Configuring, on reset)

use tracing::{error, info, instrument};

use crate::domain::{BattlePlayer, BattleSession, BattleStatus};
use crate::games::TransitionError;
use crate::gateway::{BattleScore, Gateway};

const SCENARIO_FALLBACK: &str = "Lỗi khi tạo chủ đề thi đấu. Vui lòng thử lại.";
const SCORE_FALLBACK: &str = "Đã xảy ra lỗi khi chấm điểm. Vui lòng thử lại.";
const NO_COMMENT: &str = "Không có nhận xét.";

/// Fresh session awaiting a player count. Also the reset target.
pub fn new_session() -> BattleSession {
  BattleSession { status: BattleStatus::Configuring, topic: String::new(), players: Vec::new() }
}

/// Request a scenario and seat `player_count` players with ids 1..=N.
/// Scenario failure surfaces the fallback text as the topic; the session
/// still reaches Writing. Clamping the count is the caller's job.
#[instrument(level = "info", skip(gateway))]
pub async fn configure(player_count: u32, gateway: &dyn Gateway) -> BattleSession {
  let topic = match gateway.battle_scenario().await {
    Ok(t) => t,
    Err(e) => {
      error!(target: "game", error = %e, "battle scenario generation failed");
      SCENARIO_FALLBACK.to_string()
    }
  };
  let players = (1..=player_count)
    .map(|id| BattlePlayer { id, prompt: String::new(), score: 0, feedback: String::new() })
    .collect();
  BattleSession { status: BattleStatus::Writing, topic, players }
}

/// Replace one player's prompt. Content is not validated.
pub fn update_prompt(
  session: &mut BattleSession,
  player_id: u32,
  text: &str,
) -> Result<(), TransitionError> {
  if session.status != BattleStatus::Writing {
    return Err(TransitionError::InvalidState("battle is not in the writing phase"));
  }
  match session.players.iter_mut().find(|p| p.id == player_id) {
    Some(p) => {
      p.prompt = text.to_string();
      Ok(())
    }
    None => Err(TransitionError::UnknownPlayer(player_id)),
  }
}

pub fn check_evaluate(session: &BattleSession) -> Result<(), TransitionError> {
  if session.status != BattleStatus::Writing {
    return Err(TransitionError::InvalidState("battle is not in the writing phase"));
  }
  Ok(())
}

/// Score every prompt in one batched call and produce Results.
///
/// Players missing from the response get score 0 and the no-comment string;
/// a failed call gives everyone score 0 and the generic failure feedback.
/// Either way the session reaches Results; there is no failed terminal
/// state, and the machine never retries. The final ordering is by descending
/// score, ties keeping prior (id) order; it is computed exactly once here.
#[instrument(level = "info", skip(session, gateway), fields(player_count = session.players.len()))]
pub async fn evaluate(
  session: &BattleSession,
  gateway: &dyn Gateway,
) -> Result<BattleSession, TransitionError> {
  check_evaluate(session)?;

  let scores = match gateway.score_battle_prompts(&session.topic, &session.players).await {
    Ok(s) => s,
    Err(e) => {
      error!(target: "game", error = %e, "battle scoring failed; zeroing all players");
      session
        .players
        .iter()
        .map(|p| BattleScore { player_id: p.id, score: 0, feedback: SCORE_FALLBACK.to_string() })
        .collect()
    }
  };

  let mut players: Vec<BattlePlayer> = session
    .players
    .iter()
    .map(|p| {
      let hit = scores.iter().find(|s| s.player_id == p.id);
      BattlePlayer {
        id: p.id,
        prompt: p.prompt.clone(),
        score: hit.map(|s| s.score).unwrap_or(0),
        feedback: hit.map(|s| s.feedback.clone()).unwrap_or_else(|| NO_COMMENT.to_string()),
      }
    })
    .collect();
  players.sort_by(|a, b| b.score.cmp(&a.score));

  info!(target: "game", winner = players.first().map(|p| p.id).unwrap_or(0), "battle scored");
  Ok(BattleSession { status: BattleStatus::Results, topic: session.topic.clone(), players })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::games::testing::ScriptedGateway;

  async fn writing(player_count: u32) -> BattleSession {
    let gw = ScriptedGateway { scenario: Some("Viết email cho thầy cô".into()), ..Default::default() };
    let mut session = configure(player_count, &gw).await;
    for p in &mut session.players {
      p.prompt = format!("prompt của người chơi {}", p.id);
    }
    session
  }

  fn score(player_id: u32, score: i32) -> BattleScore {
    BattleScore { player_id, score, feedback: format!("ok {player_id}") }
  }

  #[tokio::test]
  async fn configure_seats_sequential_ids_and_reaches_writing() {
    let gw = ScriptedGateway { scenario: Some("chủ đề".into()), ..Default::default() };
    let session = configure(4, &gw).await;
    assert_eq!(session.status, BattleStatus::Writing);
    assert_eq!(session.topic, "chủ đề");
    assert_eq!(session.players.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    assert!(session.players.iter().all(|p| p.prompt.is_empty() && p.score == 0));
  }

  #[tokio::test]
  async fn configure_survives_scenario_failure() {
    let gw = ScriptedGateway::default();
    let session = configure(2, &gw).await;
    assert_eq!(session.status, BattleStatus::Writing);
    assert_eq!(session.topic, SCENARIO_FALLBACK);
  }

  #[tokio::test]
  async fn evaluate_preserves_count_and_sorts_descending() {
    let session = writing(3).await;
    let gw = ScriptedGateway {
      battle_scores: Some(vec![score(1, 40), score(2, 90), score(3, 70)]),
      ..Default::default()
    };
    let next = evaluate(&session, &gw).await.unwrap();
    assert_eq!(next.status, BattleStatus::Results);
    assert_eq!(next.players.len(), 3);
    assert_eq!(next.players.iter().map(|p| (p.id, p.score)).collect::<Vec<_>>(), vec![(2, 90), (3, 70), (1, 40)]);
  }

  #[tokio::test]
  async fn unmatched_player_gets_zero_and_no_comment() {
    let session = writing(3).await;
    let gw = ScriptedGateway {
      battle_scores: Some(vec![score(1, 50), score(3, 80)]),
      ..Default::default()
    };
    let next = evaluate(&session, &gw).await.unwrap();
    let missing = next.players.iter().find(|p| p.id == 2).unwrap();
    assert_eq!(missing.score, 0);
    assert_eq!(missing.feedback, NO_COMMENT);
  }

  #[tokio::test]
  async fn scoring_failure_zeroes_everyone_but_still_reaches_results() {
    let session = writing(2).await;
    let gw = ScriptedGateway::default();
    let next = evaluate(&session, &gw).await.unwrap();
    assert_eq!(next.status, BattleStatus::Results);
    assert_eq!(next.players.len(), 2);
    assert!(next.players.iter().all(|p| p.score == 0 && p.feedback == SCORE_FALLBACK));
  }

  #[tokio::test]
  async fn ties_keep_player_id_order() {
    let session = writing(3).await;
    let gw = ScriptedGateway {
      battle_scores: Some(vec![score(1, 70), score(2, 70), score(3, 70)]),
      ..Default::default()
    };
    let next = evaluate(&session, &gw).await.unwrap();
    assert_eq!(next.players.iter().map(|p| p.id).collect::<Vec<_>>(), vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn prompt_updates_only_in_writing_and_only_known_ids() {
    let mut session = writing(2).await;
    update_prompt(&mut session, 1, "mới").unwrap();
    assert_eq!(session.players[0].prompt, "mới");
    assert_eq!(update_prompt(&mut session, 9, "x").unwrap_err(), TransitionError::UnknownPlayer(9));

    session.status = BattleStatus::Results;
    assert!(matches!(
      update_prompt(&mut session, 1, "x").unwrap_err(),
      TransitionError::InvalidState(_)
    ));
  }
}
