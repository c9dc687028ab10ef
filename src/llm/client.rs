//! Chat completion client for an OpenAI compatible API. The model is
//! treated as an opaque function from a role-tagged message list to a
//! single text completion.

use std::time::Duration;

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::core::ChatError;

#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub enum Role {
    #[serde(rename = "system")]
    System,
    #[serde(rename = "assistant")]
    Assistant,
    #[serde(rename = "user")]
    User,
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Self {
        Message {
            role,
            content: content.to_string(),
        }
    }
}

/// Connection details and sampling parameters for the completion API.
#[derive(Clone, Debug)]
pub struct LlmClient {
    api_hostname: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    timeout: Duration,
}

impl LlmClient {
    pub fn new(api_hostname: &str, api_key: &str, model: &str) -> Self {
        Self {
            api_hostname: api_hostname.to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn sampling(mut self, temperature: f32, max_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Request the next completion for the transcript. Any transport
    /// error, non-2xx status, timeout, or missing content maps to
    /// `ChatError::LlmUnavailable` so the caller can discard the turn
    /// and let the user retry.
    pub async fn completion(&self, messages: &[Message]) -> Result<String> {
        let payload = json!({
            "model": self.model,
            "messages": messages,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
        });
        let url = format!(
            "{}/v1/chat/completions",
            self.api_hostname.trim_end_matches("/")
        );
        let response: Value = reqwest::Client::new()
            .post(url)
            .bearer_auth(&self.api_key)
            .header("Content-Type", "application/json")
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChatError::LlmUnavailable(e.to_string()))?
            .error_for_status()
            .map_err(|e| ChatError::LlmUnavailable(e.to_string()))?
            .json()
            .await
            .map_err(|e| ChatError::LlmUnavailable(e.to_string()))?;

        response["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                anyhow!(ChatError::LlmUnavailable(format!(
                    "no completion in response: {}",
                    response
                )))
            })
    }
}
