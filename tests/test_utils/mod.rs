//! Test utilities for integration tests
use std::sync::{Arc, Mutex, RwLock};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use axum::{Router, body::Body};
use chrono::{DateTime, Utc};

use ooo::api::{AppState, app};
use ooo::calendar::RawEvent;
use ooo::core::AppConfig;
use ooo::gateway::CalendarGateway;

/// A calendar gateway with scriptable outcomes and call recording.
#[derive(Default)]
pub struct ScriptedGateway {
    pub fail_authenticate: bool,
    pub fail_cancel: bool,
    /// Any recipient containing one of these substrings makes the
    /// send fail
    pub fail_send_to: Vec<String>,
    pub events: Vec<RawEvent>,
    pub sent: Mutex<Vec<(Vec<String>, String)>>,
    pub cancelled: Mutex<Vec<String>>,
}

#[async_trait]
impl CalendarGateway for ScriptedGateway {
    async fn authenticate(&self) -> Result<()> {
        if self.fail_authenticate {
            return Err(anyhow!("invalid credentials"));
        }
        Ok(())
    }

    async fn fetch_events(
        &self,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>> {
        Ok(self.events.clone())
    }

    async fn cancel_event(&self, event_id: &str, _notify: bool) -> Result<bool> {
        self.cancelled.lock().unwrap().push(event_id.to_string());
        Ok(true)
    }

    async fn cancel_recurring_instances(
        &self,
        event_id: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> Result<(bool, usize)> {
        if self.fail_cancel {
            return Err(anyhow!("provider refused the cancellation"));
        }
        self.cancelled.lock().unwrap().push(event_id.to_string());
        Ok((true, 2))
    }

    async fn send_email(&self, recipients: &[String], subject: &str, _body: &str) -> Result<bool> {
        if recipients
            .iter()
            .any(|r| self.fail_send_to.iter().any(|f| r.contains(f.as_str())))
        {
            return Err(anyhow!("smtp rejected the message"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((recipients.to_vec(), subject.to_string()));
        Ok(true)
    }

    async fn authenticated_user_email(&self) -> Result<String> {
        Ok("me@example.com".to_string())
    }
}

/// A raw provider event, recurring when a rule is given.
#[allow(dead_code)]
pub fn raw_event(id: &str, summary: &str, rule: Option<&str>) -> RawEvent {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "summary": summary,
        "start": {"dateTime": "2025-05-02T09:00:00Z"},
        "end": {"dateTime": "2025-05-02T10:00:00Z"},
        "recurrence": rule.map(|r| vec![r]),
        "attendees": [
            {"email": "me@example.com"},
            {"email": format!("{}@example.com", id)}
        ],
        "organizer": {"email": "organizer@example.com"}
    }))
    .unwrap()
}

/// A mock LLM completion that fires when the request body contains
/// `utterance` and replies with `content`.
pub fn llm_turn(server: &mut mockito::Server, utterance: &str, content: &str) -> mockito::Mock {
    let body = serde_json::json!({
        "id": "chatcmpl-test",
        "object": "chat.completion",
        "created": 1694268190,
        "model": "gpt-4",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": content},
            "finish_reason": "stop"
        }]
    })
    .to_string();

    server
        .mock("POST", "/v1/chat/completions")
        .match_body(mockito::Matcher::Regex(regex_escape(utterance)))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body)
        .create()
}

// Just enough escaping for utterances used in tests
fn regex_escape(s: &str) -> String {
    s.replace('\\', "\\\\").replace('?', "\\?").replace('.', "\\.")
}

/// Creates a test application router backed by a scripted gateway and
/// a mock LLM server.
#[allow(dead_code)]
pub fn test_app(llm_url: &str, gateway: ScriptedGateway) -> Router {
    let config = AppConfig {
        llm_api_hostname: llm_url.to_string(),
        llm_api_key: "test-api-key".to_string(),
        llm_model: "gpt-4".to_string(),
        llm_temperature: 0.7,
        llm_max_tokens: 1000,
        google_client_id: "test-client-id".to_string(),
        google_client_secret: "test-client-secret".to_string(),
        google_refresh_token: "test-refresh-token".to_string(),
        user_name: "Test User".to_string(),
    };
    let app_state = AppState::new(config, Arc::new(gateway));
    app(Arc::new(RwLock::new(app_state)))
}

#[allow(dead_code)]
pub async fn body_to_string(body: Body) -> String {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Failed to read response body");
    String::from_utf8_lossy(&bytes).to_string()
}
