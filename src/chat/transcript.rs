//! The core models for managing a stateful chat with an LLM.
use serde::Serialize;

use crate::llm::Message;

/// Append-only log of role-tagged messages sent to the LLM. Messages
/// are never mutated after creation.
#[derive(Default)]
pub struct Transcript(Vec<Message>);

impl Transcript {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn messages(&self) -> Vec<Message> {
        self.0.clone()
    }

    pub fn push(&mut self, msg: Message) {
        self.0.push(msg)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The ordered list of (user text, bot text) pairs shown to the user,
/// distinct from the role-tagged transcript sent to the LLM. A user
/// turn is appended with an empty reply slot and the slot is filled
/// in when its response arrives.
#[derive(Default, Serialize)]
pub struct DisplayHistory(Vec<(String, Option<String>)>);

impl DisplayHistory {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push_user(&mut self, text: &str) {
        self.0.push((text.to_string(), None));
    }

    pub fn fill_reply(&mut self, text: &str) {
        if let Some(last) = self.0.last_mut() {
            last.1 = Some(text.to_string());
        }
    }

    /// Completed pairs in order. An unfilled reply slot renders as an
    /// empty string rather than being dropped.
    pub fn pairs(&self) -> Vec<(String, String)> {
        self.0
            .iter()
            .map(|(user, bot)| (user.clone(), bot.clone().unwrap_or_default()))
            .collect()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
