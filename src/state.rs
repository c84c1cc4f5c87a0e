//! Application state: the topic list, the active screen, and the gateway.
//!
//! This module owns:
//!   - the topic store (ordered, most-recent-first)
//!   - the active-screen slot: one tagged-union variant per screen, replaced
//!     wholesale on navigation, guarded by a generation counter and a busy
//!     flag (see `orchestrator` for how operations use them)
//!   - the shared gateway handle (live Gemini client, or the offline
//!     stand-in when no API key is configured)

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::{load_app_config_from_env, AppConfig};
use crate::domain::{BattleSession, QuizRound, Topic, TwentyQuestionsSession};
use crate::gateway::{Gateway, Gemini, Offline};
use crate::seeds::seed_topics;

/// Which screen is active, carrying only that screen's session data.
/// Navigation replaces the whole variant; game state never survives it.
#[derive(Clone, Debug)]
pub enum Screen {
    Welcome,
    Editor { topic: Topic },
    Quiz(Option<QuizRound>),
    Battle(BattleSession),
    TwentyQuestions(TwentyQuestionsSession),
}

/// The active screen plus the bookkeeping that serializes gameplay:
/// `busy` rejects a second in-flight operation, `generation` bumps on every
/// screen switch so a response resolving late can tell it has been
/// superseded and must not be applied.
#[derive(Clone, Debug)]
pub struct Active {
    pub generation: u64,
    pub busy: bool,
    pub screen: Screen,
}

#[derive(Clone)]
pub struct AppState {
    pub topics: Arc<RwLock<Vec<Topic>>>,
    pub active: Arc<RwLock<Active>>,
    pub gateway: Arc<dyn Gateway>,
}

impl AppState {
    /// Build state from env: load config, seed topics, init the gateway.
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_app_config_from_env().unwrap_or_default();

        let gateway: Arc<dyn Gateway> = match Gemini::from_env(cfg.prompts.clone()) {
            Some(g) => {
                info!(target: "promptplay_backend", base_url = %g.base_url, text_model = %g.text_model, image_model = %g.image_model, "Gemini enabled.");
                Arc::new(g)
            }
            None => {
                info!(target: "promptplay_backend", "Gemini disabled (no GEMINI_API_KEY). Serving fallback responses.");
                Arc::new(Offline)
            }
        };

        Self::with_gateway(cfg, gateway)
    }

    /// Constructor with an explicit gateway; `new()` and the tests share it.
    pub fn with_gateway(cfg: AppConfig, gateway: Arc<dyn Gateway>) -> Self {
        let mut topics: Vec<Topic> = cfg
            .topics
            .iter()
            .map(|t| Topic {
                id: t.id.clone().unwrap_or_else(|| Uuid::new_v4().to_string()),
                name: t.name.clone(),
            })
            .collect();
        if topics.is_empty() {
            topics = seed_topics();
        }
        info!(target: "promptplay_backend", topic_count = topics.len(), "Startup topic inventory");

        Self {
            topics: Arc::new(RwLock::new(topics)),
            active: Arc::new(RwLock::new(Active {
                generation: 0,
                busy: false,
                screen: Screen::Welcome,
            })),
            gateway,
        }
    }

    /// Snapshot of the topic list, newest first.
    pub async fn topics_snapshot(&self) -> Vec<Topic> {
        self.topics.read().await.clone()
    }

    /// Insert a new topic at the front of the list and return it.
    #[instrument(level = "debug", skip(self, name), fields(name_len = name.len()))]
    pub async fn add_topic(&self, name: &str) -> Topic {
        let topic = Topic { id: Uuid::new_v4().to_string(), name: name.trim().to_string() };
        self.topics.write().await.insert(0, topic.clone());
        topic
    }

    /// Look up a topic by id.
    pub async fn get_topic(&self, id: &str) -> Option<Topic> {
        self.topics.read().await.iter().find(|t| t.id == id).cloned()
    }
}
