//! Application state: the in-memory session store, the content provider and settings.
//!
//! Each session is owned independently behind its own mutex, so a slow provider
//! call for one session never blocks another and nothing is shared between them.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::bank::BankProvider;
use crate::config::{load_quiz_config_from_env, QuizSettings};
use crate::error::QuizError;
use crate::openai::OpenAI;
use crate::provider::ContentProvider;
use crate::session::Session;

pub type SessionHandle = Arc<Mutex<Session>>;

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<RwLock<HashMap<String, SessionHandle>>>,
    pub provider: Arc<dyn ContentProvider>,
    pub settings: QuizSettings,
}

impl AppState {
    /// Build state from env: load config, pick the provider (OpenAI if configured, else the bank).
    #[instrument(level = "info", skip_all)]
    pub fn new() -> Self {
        let cfg = load_quiz_config_from_env().unwrap_or_default();

        let provider: Arc<dyn ContentProvider> = match OpenAI::from_env(cfg.prompts.clone()) {
            Some(oa) => {
                info!(target: "quiz_backend", base_url = %oa.base_url, model = %oa.model, "OpenAI enabled.");
                Arc::new(oa)
            }
            None => {
                let bank = BankProvider::new(&cfg.bank);
                if bank.is_empty() {
                    info!(target: "quiz_backend", "OpenAI disabled and question bank empty: question requests will fail until one is configured.");
                } else {
                    info!(target: "quiz_backend", "OpenAI disabled (no OPENAI_API_KEY). Serving the configured question bank.");
                }
                Arc::new(bank)
            }
        };

        Self::with_provider(provider, cfg.quiz)
    }

    pub fn with_provider(provider: Arc<dyn ContentProvider>, settings: QuizSettings) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            provider,
            settings,
        }
    }

    /// Store a new session and return its id.
    #[instrument(level = "debug", skip(self, session))]
    pub async fn insert_session(&self, session: Session) -> String {
        let id = Uuid::new_v4().to_string();
        self.sessions
            .write()
            .await
            .insert(id.clone(), Arc::new(Mutex::new(session)));
        id
    }

    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn get_session(&self, id: &str) -> Result<SessionHandle, QuizError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| QuizError::UnknownSession(id.to_string()))
    }

    #[instrument(level = "debug", skip(self), fields(%id))]
    pub async fn remove_session(&self, id: &str) -> Result<(), QuizError> {
        self.sessions
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| QuizError::UnknownSession(id.to_string()))
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
