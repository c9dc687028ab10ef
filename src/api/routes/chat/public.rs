//! Public types for the chat API
use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
pub struct ChatRequest {
    // Omitting the session id starts a new conversation
    pub session_id: Option<String>,
    pub message: String,
}

#[derive(Serialize)]
pub struct ChatResponse {
    pub session_id: String,
    pub message: String,
    // Ordered (user, assistant) pairs
    pub history: Vec<(String, String)>,
}

#[derive(Serialize)]
pub struct ChatSessionsResponse {
    pub sessions: Vec<String>,
}

#[derive(Serialize)]
pub struct ClearResponse {
    pub session_id: String,
    pub cleared: bool,
}
