//! Typed representation of calendar meetings and classification of
//! raw provider events into recurring and one-off meetings.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ChatError;

/// Meeting lifecycle. Transitions are one-way: once a meeting is
/// cancelled or notified there is no path back to pending.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventStatus {
    Pending,
    Cancelled,
    Notified,
}

impl EventStatus {
    /// Returns the next status if the transition is allowed,
    /// otherwise the current status. Repeating a transition is a
    /// no-op which makes status updates idempotent.
    pub fn advance(self, next: EventStatus) -> EventStatus {
        match (self, next) {
            (EventStatus::Pending, n) => n,
            (current, _) => current,
        }
    }
}

/// A single calendar meeting owned by the conversation state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MeetingEvent {
    pub event_id: String,
    pub summary: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_recurring: bool,
    pub attendees: Vec<String>,
    pub organizer: String,
    pub status: EventStatus,
}

impl MeetingEvent {
    /// Build a meeting from a raw provider event. Fails when required
    /// fields are missing or the times don't form a valid interval.
    pub fn from_raw(raw: &RawEvent, is_recurring: bool) -> Result<Self> {
        let summary = raw
            .summary
            .clone()
            .ok_or_else(|| anyhow!(missing_field(&raw.id, "summary")))?;
        let start_time = raw
            .start
            .as_ref()
            .and_then(RawEventTime::instant)
            .ok_or_else(|| anyhow!(missing_field(&raw.id, "start")))?;
        let end_time = raw
            .end
            .as_ref()
            .and_then(RawEventTime::instant)
            .ok_or_else(|| anyhow!(missing_field(&raw.id, "end")))?;
        if end_time <= start_time {
            return Err(ChatError::ValidationFailure(format!(
                "event {} ends before it starts",
                raw.id
            ))
            .into());
        }
        let organizer = raw
            .organizer
            .as_ref()
            .map(|o| o.email.clone())
            .ok_or_else(|| anyhow!(missing_field(&raw.id, "organizer")))?;
        // An empty list is a valid solo meeting; an absent field is an
        // incomplete provider record
        let attendees = raw
            .attendees
            .clone()
            .ok_or_else(|| anyhow!(missing_field(&raw.id, "attendees")))?
            .into_iter()
            .map(|a| a.email)
            .collect();

        Ok(Self {
            event_id: raw.id.clone(),
            summary,
            start_time,
            end_time,
            is_recurring,
            attendees,
            organizer,
            status: EventStatus::Pending,
        })
    }
}

fn missing_field(id: &str, field: &str) -> ChatError {
    ChatError::ValidationFailure(format!("event {} is missing required field {}", id, field))
}

/// Render a meeting as human-readable text. This is the single
/// formatter used for both chat replies and generated email bodies.
pub fn format_meeting(event: &MeetingEvent) -> String {
    let attendees = if event.attendees.is_empty() {
        "No attendees".to_string()
    } else {
        event.attendees.join(", ")
    };
    format!(
        "Title: {}\nWhen: {} to {}\nRecurring: {}\nAttendees: {}",
        event.summary,
        event.start_time.format("%Y-%m-%d %H:%M"),
        event.end_time.format("%Y-%m-%d %H:%M"),
        if event.is_recurring { "Yes" } else { "No" },
        attendees,
    )
}

// Raw event structures as returned by the Google Calendar API

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawEventTime {
    #[serde(rename = "dateTime", skip_serializing_if = "Option::is_none")]
    pub date_time: Option<DateTime<Utc>>,
    // All-day events carry a date instead of a dateTime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<chrono::NaiveDate>,
}

impl RawEventTime {
    fn instant(&self) -> Option<DateTime<Utc>> {
        self.date_time
            .or_else(|| self.date.and_then(|d| d.and_hms_opt(0, 0, 0)).map(|dt| dt.and_utc()))
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawAttendee {
    pub email: String,
    #[serde(rename = "displayName", skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawOrganizer {
    pub email: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawEvent {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<RawEventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<RawEventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recurrence: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attendees: Option<Vec<RawAttendee>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<RawOrganizer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl RawEvent {
    /// Classification is pure and total: an event with a recurrence
    /// rule is recurring, everything else is one-off.
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw_event(recurrence: Option<Vec<String>>) -> RawEvent {
        serde_json::from_value(serde_json::json!({
            "id": "evt_1",
            "summary": "Weekly sync",
            "start": {"dateTime": "2025-05-01T10:00:00Z"},
            "end": {"dateTime": "2025-05-01T10:30:00Z"},
            "recurrence": recurrence,
            "attendees": [{"email": "alice@example.com"}, {"email": "bob@example.com"}],
            "organizer": {"email": "alice@example.com"}
        }))
        .unwrap()
    }

    #[test]
    fn test_classification_is_exhaustive() {
        let recurring = raw_event(Some(vec!["RRULE:FREQ=WEEKLY".to_string()]));
        assert!(recurring.is_recurring());

        let one_off = raw_event(None);
        assert!(!one_off.is_recurring());

        // An empty rule list still counts as recurring, the provider
        // only includes the field for series
        let empty_rules = raw_event(Some(vec![]));
        assert!(empty_rules.is_recurring());
    }

    #[test]
    fn test_status_transitions_are_one_way() {
        assert_eq!(
            EventStatus::Pending.advance(EventStatus::Cancelled),
            EventStatus::Cancelled
        );
        assert_eq!(
            EventStatus::Pending.advance(EventStatus::Notified),
            EventStatus::Notified
        );
        assert_eq!(
            EventStatus::Cancelled.advance(EventStatus::Pending),
            EventStatus::Cancelled
        );
        assert_eq!(
            EventStatus::Notified.advance(EventStatus::Pending),
            EventStatus::Notified
        );
        assert_eq!(
            EventStatus::Cancelled.advance(EventStatus::Notified),
            EventStatus::Cancelled
        );
    }

    #[test]
    fn test_from_raw_builds_meeting() {
        let raw = raw_event(None);
        let meeting = MeetingEvent::from_raw(&raw, false).unwrap();
        assert_eq!(meeting.event_id, "evt_1");
        assert_eq!(meeting.summary, "Weekly sync");
        assert!(!meeting.is_recurring);
        assert_eq!(meeting.status, EventStatus::Pending);
        assert_eq!(meeting.attendees.len(), 2);
        assert_eq!(meeting.organizer, "alice@example.com");
    }

    #[test]
    fn test_from_raw_missing_summary_fails() {
        let mut raw = raw_event(None);
        raw.summary = None;
        let result = MeetingEvent::from_raw(&raw, false);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("summary"));
    }

    #[test]
    fn test_from_raw_inverted_interval_fails() {
        let mut raw = raw_event(None);
        std::mem::swap(&mut raw.start, &mut raw.end);
        assert!(MeetingEvent::from_raw(&raw, false).is_err());
    }

    #[test]
    fn test_from_raw_missing_attendees_fails() {
        let mut raw = raw_event(None);
        raw.attendees = None;
        let result = MeetingEvent::from_raw(&raw, false);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("attendees"));
    }

    #[test]
    fn test_from_raw_empty_attendees_is_a_solo_meeting() {
        let mut raw = raw_event(None);
        raw.attendees = Some(vec![]);
        let meeting = MeetingEvent::from_raw(&raw, false).unwrap();
        assert!(meeting.attendees.is_empty());
    }

    #[test]
    fn test_all_day_event_uses_date() {
        let raw: RawEvent = serde_json::from_value(serde_json::json!({
            "id": "evt_2",
            "summary": "Offsite",
            "start": {"date": "2025-05-01"},
            "end": {"date": "2025-05-02"},
            "attendees": [],
            "organizer": {"email": "alice@example.com"}
        }))
        .unwrap();
        let meeting = MeetingEvent::from_raw(&raw, false).unwrap();
        assert_eq!(meeting.start_time.format("%H:%M").to_string(), "00:00");
    }

    #[test]
    fn test_format_meeting() {
        let raw = raw_event(Some(vec!["RRULE:FREQ=WEEKLY".to_string()]));
        let meeting = MeetingEvent::from_raw(&raw, true).unwrap();
        let text = format_meeting(&meeting);
        assert!(text.contains("Title: Weekly sync"));
        assert!(text.contains("When: 2025-05-01 10:00 to 2025-05-01 10:30"));
        assert!(text.contains("Recurring: Yes"));
        assert!(text.contains("alice@example.com, bob@example.com"));
    }

    #[test]
    fn test_format_meeting_no_attendees() {
        let mut raw = raw_event(None);
        raw.attendees = Some(vec![]);
        let meeting = MeetingEvent::from_raw(&raw, false).unwrap();
        assert!(format_meeting(&meeting).contains("Attendees: No attendees"));
    }
}
