//! Conversation state: authentication, the time-off window, the
//! classified meeting lists, and the action the current turn implies.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::{EventStatus, MeetingEvent, RawEvent};
use crate::core::ChatError;

/// The side effect the current turn should trigger. `None` is the
/// idle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Authenticate,
    GetMeetings,
    CancelRecurring,
    SendEmails,
    ReviewMeetings,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Authenticate => "authenticate",
            Action::GetMeetings => "get_meetings",
            Action::CancelRecurring => "cancel_recurring",
            Action::SendEmails => "send_emails",
            Action::ReviewMeetings => "review_meetings",
        }
    }
}

/// An explicit, enumerated update. Every field is optional and `None`
/// leaves the state untouched, so there is no way to smuggle in an
/// unrecognized field.
#[derive(Clone, Debug, Default)]
pub struct StateUpdate {
    pub authenticated: Option<bool>,
    pub time_off_start: Option<NaiveDate>,
    pub time_off_end: Option<NaiveDate>,
    pub current_action: Option<Action>,
    pub current_meeting_index: Option<usize>,
}

#[derive(Debug, Default, Serialize)]
pub struct ConversationState {
    pub authenticated: bool,
    pub time_off_start: Option<DateTime<Utc>>,
    pub time_off_end: Option<DateTime<Utc>>,
    pub recurring_meetings: Vec<MeetingEvent>,
    pub one_off_meetings: Vec<MeetingEvent>,
    pub current_meeting_index: usize,
    pub current_action: Option<Action>,
    pub last_error: Option<String>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an update into the state. A time-off range only applies
    /// when both endpoints arrive together and the range is ordered;
    /// a half-open or inverted range fails without mutating anything.
    pub fn apply(&mut self, update: StateUpdate) -> Result<()> {
        match (update.time_off_start, update.time_off_end) {
            (Some(start), Some(end)) => {
                if end < start {
                    return Err(ChatError::ValidationFailure(format!(
                        "time off ends ({}) before it starts ({})",
                        end, start
                    ))
                    .into());
                }
                // The window covers the whole of both endpoint days
                self.time_off_start = start.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
                self.time_off_end = end.and_hms_opt(23, 59, 59).map(|dt| dt.and_utc());
            }
            (None, None) => {}
            _ => {
                return Err(ChatError::ValidationFailure(
                    "a time off range needs both a start and an end date".to_string(),
                )
                .into());
            }
        }
        if let Some(authenticated) = update.authenticated {
            self.authenticated = authenticated;
        }
        if let Some(action) = update.current_action {
            self.current_action = Some(action);
        }
        if let Some(index) = update.current_meeting_index {
            self.current_meeting_index = index.min(self.one_off_meetings.len());
        }
        Ok(())
    }

    /// Construct a meeting from a raw provider event and append it to
    /// the matching list. Fails when required event fields are absent.
    pub fn add_event(&mut self, raw: &RawEvent, is_recurring: bool) -> Result<()> {
        let meeting = MeetingEvent::from_raw(raw, is_recurring)?;
        if is_recurring {
            self.recurring_meetings.push(meeting);
        } else {
            self.one_off_meetings.push(meeting);
        }
        Ok(())
    }

    /// Replace both meeting lists and restart the review cursor. Used
    /// when a new date range re-enters `get_meetings`.
    pub fn clear_meetings(&mut self) {
        self.recurring_meetings.clear();
        self.one_off_meetings.clear();
        self.current_meeting_index = 0;
    }

    /// Update the status of the first meeting matching `event_id`,
    /// scanning recurring then one-off meetings. A missing match or a
    /// disallowed transition is a no-op, which also makes repeated
    /// calls idempotent.
    pub fn update_meeting_status(&mut self, event_id: &str, status: EventStatus) {
        let found = self
            .recurring_meetings
            .iter_mut()
            .chain(self.one_off_meetings.iter_mut())
            .find(|m| m.event_id == event_id);
        if let Some(meeting) = found {
            meeting.status = meeting.status.advance(status);
        }
    }

    pub fn set_error(&mut self, msg: &str) {
        self.last_error = Some(msg.to_string());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    /// Replace the whole state with fresh defaults. Only used on an
    /// explicit conversation clear; this is the one path that resets
    /// `authenticated`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
