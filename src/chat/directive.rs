//! Structured intent extraction from LLM replies. Instead of
//! sniffing keywords out of prose, the system prompt requires the
//! model to end its reply with a machine-readable trailer:
//!
//! ```text
//! ACTION: {"action":"get_meetings","time_off_start":"2025-05-01","time_off_end":"2025-05-10"}
//! ```
//!
//! The trailer is parsed strictly and a missing or malformed trailer
//! means no state change, never an error surfaced to the user.

use chrono::NaiveDate;
use serde::Deserialize;

use super::state::{Action, StateUpdate};

const DIRECTIVE_PREFIX: &str = "ACTION:";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Directive {
    pub action: Action,
    #[serde(default)]
    pub time_off_start: Option<NaiveDate>,
    #[serde(default)]
    pub time_off_end: Option<NaiveDate>,
    #[serde(default)]
    pub custom_message: Option<String>,
    #[serde(default)]
    pub confirmed: Option<bool>,
}

impl Directive {
    /// The state update this directive implies. Review cursor
    /// movement is handled by the orchestrator since it depends on
    /// the current cursor.
    pub fn state_update(&self) -> StateUpdate {
        StateUpdate {
            current_action: Some(self.action),
            time_off_start: self.time_off_start,
            time_off_end: self.time_off_end,
            ..Default::default()
        }
    }
}

/// Split an LLM reply into the user-visible text and the parsed
/// directive, if any. Only the last `ACTION:` line counts and it is
/// always stripped from the visible text, parseable or not.
pub fn extract_directive(reply: &str) -> (String, Option<Directive>) {
    let directive_line = reply
        .lines()
        .rev()
        .find(|line| line.trim_start().starts_with(DIRECTIVE_PREFIX));

    let Some(line) = directive_line else {
        return (reply.trim().to_string(), None);
    };

    let visible = reply
        .lines()
        .filter(|l| *l != line)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string();

    let payload = line.trim_start().trim_start_matches(DIRECTIVE_PREFIX).trim();
    let directive = match serde_json::from_str::<Directive>(payload) {
        Ok(d) => Some(d),
        Err(e) => {
            tracing::warn!("Ignoring malformed directive {:?}: {}", payload, e);
            None
        }
    };

    (visible, directive)
}
