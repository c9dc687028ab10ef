//! Reusable prompts and email templates using Handlebars. Handlebars
//! in strict mode can't do much without explicitly registered helpers
//! which is ideal here: state values flow into prompts and mail, so
//! the templates should only ever interpolate what they are given.

use std::fmt;

use handlebars::Handlebars;
use serde::Serialize;
use serde_json::json;

use super::state::ConversationState;

#[derive(Debug)]
pub enum Prompt {
    StateContext,
    RecurringCancellation,
    OneOffReschedule,
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The fixed instruction string establishing the assistant's persona
/// and hard constraints. Prepended once per conversation, never
/// repeated mid-history.
pub const SYSTEM_PROMPT: &str = r#"You are a helpful meeting rescheduler assistant. Your role is to help users clear their calendar during time off periods.

Your capabilities:
1. Connecting to the user's calendar
2. Collecting time off dates from the user
3. Cancelling recurring meetings that fall inside the time off window
4. Sending rescheduling emails for one-off meetings
5. Walking through one-off meetings one at a time for review

Always:
- Be professional and courteous
- Confirm before making any calendar changes
- Provide clear status updates

Never:
- Make assumptions about dates or times
- Modify calendar events without explicit confirmation
- Send emails without user approval
- Share calendar information with anyone but the user

When the user's message implies one of your capabilities, end your reply with a single line of the form:

ACTION: {"action": "<name>"}

where <name> is one of: authenticate, get_meetings, cancel_recurring, send_emails, review_meetings.

Include "time_off_start" and "time_off_end" as YYYY-MM-DD strings when the user has given you both dates. Include "confirmed": true or false on a review_meetings action when the user has answered yes or no about the current meeting. Include "custom_message" on a send_emails action when the user dictated their own email text. Emit the ACTION line only when you are certain of the user's intent; otherwise omit it and ask a clarifying question instead.

Start by asking how you can help with calendar management today."#;

const STATE_CONTEXT_PROMPT: &str = r#"Current state:
{{#if authenticated}}- Connected to the calendar{{else}}- Not yet connected to the calendar{{/if}}
{{#if has_window}}- Time off period: {{time_off_start}} to {{time_off_end}}{{/if}}
{{#if recurring_count}}- Found {{recurring_count}} recurring meetings{{/if}}
{{#if one_off_count}}- Found {{one_off_count}} one-off meetings{{/if}}
{{#if current_action}}- Current action: {{current_action}}{{/if}}
{{#if last_error}}- Last error: {{last_error}}{{/if}}

Remember this state while responding to the user. Guide them through any incomplete steps so they can clear their calendar before their time off."#;

const RECURRING_CANCELLATION_TEMPLATE: &str = r#"Hi {{attendee_name}},

I hope this email finds you well. I wanted to let you know that I'll be taking some time off from {{time_off_start}} to {{time_off_end}}, and as a result, our recurring meeting "{{meeting_name}}" will be cancelled during this period.

We can resume our regular schedule when I return.

Best regards,
{{user_name}}"#;

const ONE_OFF_RESCHEDULE_TEMPLATE: &str = r#"Hi {{attendee_name}},

I hope you're doing well. I wanted to let you know that I'll be unavailable for our scheduled meeting "{{meeting_name}}" on {{meeting_date}} as I will be taking some time off.

Would it be possible to reschedule this meeting for after my return on {{time_off_end}}?

Best regards,
{{user_name}}"#;

pub fn templates<'a>() -> Handlebars<'a> {
    let mut registry = Handlebars::new();
    registry.set_strict_mode(true);
    registry
        .register_template_string(&Prompt::StateContext.to_string(), STATE_CONTEXT_PROMPT)
        .expect("Failed to register template");
    registry
        .register_template_string(
            &Prompt::RecurringCancellation.to_string(),
            RECURRING_CANCELLATION_TEMPLATE,
        )
        .expect("Failed to register template");
    registry
        .register_template_string(
            &Prompt::OneOffReschedule.to_string(),
            ONE_OFF_RESCHEDULE_TEMPLATE,
        )
        .expect("Failed to register template");
    registry
}

/// Deterministic bullet summary of the conversation state. Rendered
/// fresh each turn and injected as an ephemeral system message, never
/// stored in the transcript.
pub fn state_context(state: &ConversationState) -> String {
    let data = json!({
        "authenticated": state.authenticated,
        "has_window": state.time_off_start.is_some() && state.time_off_end.is_some(),
        "time_off_start": state
            .time_off_start
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        "time_off_end": state
            .time_off_end
            .map(|t| t.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        "recurring_count": state.recurring_meetings.len(),
        "one_off_count": state.one_off_meetings.len(),
        "current_action": state
            .current_action
            .map(|a| a.as_str())
            .unwrap_or_default(),
        "last_error": state.last_error.clone().unwrap_or_default(),
    });
    templates()
        .render(&Prompt::StateContext.to_string(), &data)
        .expect("Failed to render state context")
}

/// Parameters available to both email templates.
#[derive(Debug, Serialize)]
pub struct EmailParams {
    pub meeting_name: String,
    pub attendee_name: String,
    pub meeting_date: String,
    pub time_off_start: String,
    pub time_off_end: String,
    pub user_name: String,
}

/// The raw template body for a meeting kind. An unknown kind yields
/// an empty template, a recoverable lookup miss rather than an error.
pub fn email_template(kind: &str) -> &'static str {
    match kind {
        "recurring" => RECURRING_CANCELLATION_TEMPLATE,
        "one_off" => ONE_OFF_RESCHEDULE_TEMPLATE,
        _ => "",
    }
}

/// Render the email body for a meeting kind. An unknown kind renders
/// to an empty string.
pub fn email_body(kind: &str, params: &EmailParams) -> String {
    let template = match kind {
        "recurring" => Prompt::RecurringCancellation,
        "one_off" => Prompt::OneOffReschedule,
        _ => return String::new(),
    };
    templates()
        .render(&template.to_string(), params)
        .expect("Failed to render email template")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::state::Action;

    fn params() -> EmailParams {
        EmailParams {
            meeting_name: "Design review".to_string(),
            attendee_name: "Alice".to_string(),
            meeting_date: "2025-05-02".to_string(),
            time_off_start: "2025-05-01".to_string(),
            time_off_end: "2025-05-10".to_string(),
            user_name: "Bob".to_string(),
        }
    }

    #[test]
    fn test_system_prompt_constraints() {
        assert!(SYSTEM_PROMPT.contains("without explicit confirmation"));
        assert!(SYSTEM_PROMPT.contains("without user approval"));
        assert!(SYSTEM_PROMPT.contains("ACTION:"));
    }

    #[test]
    fn test_state_context_empty_state() {
        let state = ConversationState::new();
        let rendered = state_context(&state);
        assert!(rendered.contains("Not yet connected"));
        assert!(!rendered.contains("Time off period"));
        assert!(!rendered.contains("recurring meetings"));
        assert!(!rendered.contains("Last error"));
    }

    #[test]
    fn test_state_context_round_trip() {
        let mut state = ConversationState::new();
        state.authenticated = true;
        state.current_action = Some(Action::GetMeetings);
        for i in 0..2 {
            let raw = serde_json::from_value(serde_json::json!({
                "id": format!("r{}", i),
                "summary": "Sync",
                "start": {"dateTime": "2025-05-02T09:00:00Z"},
                "end": {"dateTime": "2025-05-02T09:30:00Z"},
                "attendees": [],
                "organizer": {"email": "a@example.com"}
            }))
            .unwrap();
            state.add_event(&raw, true).unwrap();
        }
        let raw = serde_json::from_value(serde_json::json!({
            "id": "o1",
            "summary": "1:1",
            "start": {"dateTime": "2025-05-03T09:00:00Z"},
            "end": {"dateTime": "2025-05-03T09:30:00Z"},
            "attendees": [],
            "organizer": {"email": "a@example.com"}
        }))
        .unwrap();
        state.add_event(&raw, false).unwrap();

        let rendered = state_context(&state);

        // The rendered summary must reproduce the source state's
        // counts and flags exactly
        assert!(rendered.contains("- Connected to the calendar"));
        assert!(rendered.contains("Found 2 recurring meetings"));
        assert!(rendered.contains("Found 1 one-off meetings"));
        assert!(rendered.contains("Current action: get_meetings"));
    }

    #[test]
    fn test_state_context_includes_window_and_error() {
        let mut state = ConversationState::new();
        state
            .apply(crate::chat::StateUpdate {
                time_off_start: Some("2025-05-01".parse().unwrap()),
                time_off_end: Some("2025-05-10".parse().unwrap()),
                ..Default::default()
            })
            .unwrap();
        state.set_error("cancel failed");
        let rendered = state_context(&state);
        assert!(rendered.contains("Time off period: 2025-05-01 to 2025-05-10"));
        assert!(rendered.contains("Last error: cancel failed"));
    }

    #[test]
    fn test_email_body_recurring() {
        let body = email_body("recurring", &params());
        assert!(body.contains("Hi Alice"));
        assert!(body.contains("\"Design review\""));
        assert!(body.contains("2025-05-01 to 2025-05-10"));
        assert!(body.contains("Best regards,\nBob"));
    }

    #[test]
    fn test_email_body_one_off() {
        let body = email_body("one_off", &params());
        assert!(body.contains("on 2025-05-02"));
        assert!(body.contains("after my return on 2025-05-10"));
    }

    #[test]
    fn test_unknown_email_kind_is_empty() {
        assert_eq!(email_template("quarterly"), "");
        assert_eq!(email_body("quarterly", &params()), "");
    }
}
