//! Public protocol structs for WebSocket and HTTP endpoints (serde ready).
//! Keep this small and stable to evolve backend and frontend independently.

use serde::{Deserialize, Serialize};

use crate::domain::{
    BattleSession, BattleStatus, GameResult, HistoryItem, QuizRound, QuizStatus, Topic,
    TwentyQuestionsSession, TwentyQuestionsStatus,
};
use crate::state::Screen;

/// Messages the client can send over WebSocket.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientWsMessage {
    Ping,
    ListTopics,
    AddTopic {
        name: String,
    },
    RandomTopic,
    ShowWelcome,
    OpenEditor {
        #[serde(rename = "topicId")]
        topic_id: String,
    },
    GetScreen,
    OptimizePrompt {
        topic: String,
        prompt: String,
    },
    ReviewPrompt {
        topic: String,
        prompt: String,
    },
    SuggestPrompts {
        topic: String,
    },
    StartQuiz,
    NewQuestion,
    SubmitAnswer {
        answer: String,
    },
    StartBattle,
    ConfigureBattle {
        #[serde(rename = "playerCount")]
        player_count: u32,
    },
    UpdatePrompt {
        #[serde(rename = "playerId")]
        player_id: u32,
        text: String,
    },
    EvaluateBattle,
    ResetBattle,
    StartTwentyQuestions,
    AskQuestion {
        question: String,
    },
    FinalGuess {
        text: String,
    },
}

/// Messages the server sends back over WebSocket.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerWsMessage {
    Pong,
    Topics {
        topics: Vec<TopicOut>,
    },
    TopicCreated {
        topic: TopicOut,
        screen: ScreenOut,
    },
    Optimized {
        text: String,
    },
    Reviewed {
        text: String,
    },
    Suggestions {
        prompts: Vec<String>,
    },
    Screen {
        screen: ScreenOut,
    },
    Error {
        message: String,
    },
}

/// DTO used by both WS and HTTP for the active screen.
#[derive(Debug, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum ScreenOut {
    Welcome,
    Editor {
        topic: TopicOut,
    },
    Quiz {
        round: Option<QuizRoundOut>,
    },
    Battle {
        session: BattleOut,
    },
    TwentyQuestions {
        session: TwentyQuestionsOut,
    },
}

#[derive(Debug, Serialize)]
pub struct TopicOut {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct QuizRoundOut {
    pub question: String,
    #[serde(rename = "userAnswer")]
    pub user_answer: String,
    #[serde(rename = "feedbackText")]
    pub feedback_text: String,
    pub status: QuizStatus,
    #[serde(rename = "imageUrl")]
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BattlePlayerOut {
    pub id: u32,
    pub prompt: String,
    pub score: i32,
    pub feedback: String,
}

#[derive(Debug, Serialize)]
pub struct BattleOut {
    pub status: BattleStatus,
    pub topic: String,
    pub players: Vec<BattlePlayerOut>,
}

/// The secret word stays server-side until the game is finished.
#[derive(Debug, Serialize)]
pub struct TwentyQuestionsOut {
    pub status: TwentyQuestionsStatus,
    #[serde(rename = "secretWord")]
    pub secret_word: Option<String>,
    pub history: Vec<HistoryItem>,
    #[serde(rename = "questionsLeft")]
    pub questions_left: u32,
    #[serde(rename = "gameResult")]
    pub game_result: Option<GameResult>,
    pub error: Option<String>,
}

pub fn topic_out(t: &Topic) -> TopicOut {
    TopicOut { id: t.id.clone(), name: t.name.clone() }
}

fn quiz_out(round: &QuizRound) -> QuizRoundOut {
    QuizRoundOut {
        question: round.question.clone(),
        user_answer: round.user_answer.clone(),
        feedback_text: round.feedback_text.clone(),
        status: round.status,
        image_url: round.image_url.clone(),
    }
}

fn battle_out(session: &BattleSession) -> BattleOut {
    BattleOut {
        status: session.status,
        topic: session.topic.clone(),
        players: session
            .players
            .iter()
            .map(|p| BattlePlayerOut {
                id: p.id,
                prompt: p.prompt.clone(),
                score: p.score,
                feedback: p.feedback.clone(),
            })
            .collect(),
    }
}

fn twenty_questions_out(session: &TwentyQuestionsSession) -> TwentyQuestionsOut {
    let finished = session.status == TwentyQuestionsStatus::Finished;
    TwentyQuestionsOut {
        status: session.status,
        secret_word: finished.then(|| session.secret_word.clone()),
        history: session.history.clone(),
        questions_left: session.questions_left,
        game_result: session.game_result,
        error: session.error.clone(),
    }
}

/// Convert the internal `Screen` to the public DTO.
pub fn to_out(screen: &Screen) -> ScreenOut {
    match screen {
        Screen::Welcome => ScreenOut::Welcome,
        Screen::Editor { topic } => ScreenOut::Editor { topic: topic_out(topic) },
        Screen::Quiz(round) => ScreenOut::Quiz { round: round.as_ref().map(quiz_out) },
        Screen::Battle(session) => ScreenOut::Battle { session: battle_out(session) },
        Screen::TwentyQuestions(session) => {
            ScreenOut::TwentyQuestions { session: twenty_questions_out(session) }
        }
    }
}

//
// HTTP request/response DTOs
//

#[derive(Deserialize)]
pub struct AddTopicIn {
    pub name: String,
}
#[derive(Serialize)]
pub struct TopicCreatedOut {
    pub topic: TopicOut,
    pub screen: ScreenOut,
}

#[derive(Deserialize)]
pub struct OpenEditorIn {
    #[serde(rename = "topicId")]
    pub topic_id: String,
}

#[derive(Deserialize)]
pub struct EditorIn {
    pub topic: String,
    pub prompt: String,
}
#[derive(Serialize)]
pub struct TextOut {
    pub text: String,
}

#[derive(Deserialize)]
pub struct SuggestIn {
    pub topic: String,
}
#[derive(Serialize)]
pub struct SuggestionsOut {
    pub prompts: Vec<String>,
}

#[derive(Deserialize)]
pub struct AnswerIn {
    pub answer: String,
}

#[derive(Deserialize)]
pub struct ConfigureIn {
    #[serde(rename = "playerCount")]
    pub player_count: u32,
}

#[derive(Deserialize)]
pub struct PlayerPromptIn {
    #[serde(rename = "playerId")]
    pub player_id: u32,
    pub text: String,
}

#[derive(Deserialize)]
pub struct AskIn {
    pub question: String,
}

#[derive(Deserialize)]
pub struct GuessIn {
    pub text: String,
}

#[derive(Serialize)]
pub struct ErrorOut {
    pub error: String,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OracleAnswer;
    use crate::games::twenty_questions;

    #[test]
    fn secret_word_is_withheld_until_finished() {
        let mut session = twenty_questions::idle_session();
        session.status = TwentyQuestionsStatus::Playing;
        session.secret_word = "Quả chuối".into();
        session.history.push(HistoryItem::Question {
            text: "Nó có ăn được không?".into(),
            answer: OracleAnswer::Yes,
        });

        let out = twenty_questions_out(&session);
        assert_eq!(out.secret_word, None);

        session.status = TwentyQuestionsStatus::Finished;
        session.game_result = Some(GameResult::Lose);
        let out = twenty_questions_out(&session);
        assert_eq!(out.secret_word.as_deref(), Some("Quả chuối"));
    }

    #[test]
    fn history_items_serialize_with_their_tags_and_literals() {
        let item = HistoryItem::Question { text: "Nó có sống không?".into(), answer: OracleAnswer::CannotAnswer };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "question");
        assert_eq!(json["answer"], "Không thể trả lời");
    }
}
