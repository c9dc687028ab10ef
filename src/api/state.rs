use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::chat::Orchestrator;
use crate::core::AppConfig;
use crate::gateway::CalendarGateway;
use crate::llm::LlmClient;

pub type SharedGateway = Arc<dyn CalendarGateway>;

/// One live conversation. The mutex serializes turns so a session
/// never has two in-flight LLM calls against the same state.
pub type Session = Arc<Mutex<Orchestrator<SharedGateway>>>;

pub struct AppState {
    pub config: AppConfig,
    gateway: SharedGateway,
    sessions: HashMap<String, Session>,
}

impl AppState {
    pub fn new(config: AppConfig, gateway: SharedGateway) -> Self {
        Self {
            config,
            gateway,
            sessions: HashMap::new(),
        }
    }

    /// Look up a session, creating a fresh conversation for unseen
    /// ids. Each session owns an independent state and message log.
    pub fn get_or_create_session(&mut self, session_id: &str) -> Session {
        if let Some(session) = self.sessions.get(session_id) {
            return Arc::clone(session);
        }
        let llm = LlmClient::new(
            &self.config.llm_api_hostname,
            &self.config.llm_api_key,
            &self.config.llm_model,
        )
        .sampling(self.config.llm_temperature, self.config.llm_max_tokens);
        let orchestrator = Orchestrator::new(llm, Arc::clone(&self.gateway), &self.config.user_name);
        let session = Arc::new(Mutex::new(orchestrator));
        self.sessions
            .insert(session_id.to_string(), Arc::clone(&session));
        session
    }

    pub fn get_session(&self, session_id: &str) -> Option<Session> {
        self.sessions.get(session_id).map(Arc::clone)
    }

    pub fn session_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.sessions.keys().cloned().collect();
        ids.sort();
        ids
    }
}
