//! Google Calendar v3 API client for listing events in a range,
//! expanding recurring series into instances, and cancelling
//! instances.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::calendar::RawEvent;

pub const DEFAULT_API_BASE: &str = "https://www.googleapis.com/calendar/v3";

#[derive(Debug, Deserialize)]
struct EventListResponse {
    #[serde(default)]
    items: Vec<RawEvent>,
}

fn ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// List all events on the calendar between `start` and `end`. Series
/// are kept as single recurring events (no instance expansion) so
/// classification can see the recurrence rule.
pub async fn list_events(
    api_base: &str,
    access_token: &str,
    calendar_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<RawEvent>> {
    let url = format!("{}/calendars/{}/events", api_base, calendar_id);
    let resp: EventListResponse = Client::new()
        .get(url)
        .bearer_auth(access_token)
        .query(&[
            ("timeMin", ts(start).as_str()),
            ("timeMax", ts(end).as_str()),
            // singleEvents would strip the recurrence field, keep the
            // series records intact. The API refuses startTime
            // ordering for unexpanded series so this uses the default
            // order.
            ("singleEvents", "false"),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(resp.items)
}

/// List the expanded instances of a recurring series inside a window.
pub async fn list_instances(
    api_base: &str,
    access_token: &str,
    calendar_id: &str,
    event_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Vec<RawEvent>> {
    let url = format!(
        "{}/calendars/{}/events/{}/instances",
        api_base, calendar_id, event_id
    );
    let resp: EventListResponse = Client::new()
        .get(url)
        .bearer_auth(access_token)
        .query(&[
            ("timeMin", ts(start).as_str()),
            ("timeMax", ts(end).as_str()),
        ])
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(resp.items)
}

/// Mark a single event (or series instance) as cancelled, optionally
/// emailing attendees.
pub async fn cancel_event(
    api_base: &str,
    access_token: &str,
    calendar_id: &str,
    event_id: &str,
    notify: bool,
) -> Result<()> {
    let url = format!("{}/calendars/{}/events/{}", api_base, calendar_id, event_id);
    let send_updates = if notify { "all" } else { "none" };
    Client::new()
        .patch(url)
        .bearer_auth(access_token)
        .query(&[("sendUpdates", send_updates)])
        .json(&json!({"status": "cancelled"}))
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            "2025-05-01T00:00:00Z".parse().unwrap(),
            "2025-05-10T23:59:59Z".parse().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_list_events_parses_items() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/calendars/primary/events")
            .match_query(mockito::Matcher::Regex("timeMin=2025-05-01".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"items": [
                    {"id": "evt_1", "summary": "Standup",
                     "start": {"dateTime": "2025-05-02T09:00:00Z"},
                     "end": {"dateTime": "2025-05-02T09:15:00Z"},
                     "recurrence": ["RRULE:FREQ=DAILY"],
                     "organizer": {"email": "a@example.com"}}
                ]}"#,
            )
            .create();

        let (start, end) = window();
        let events = list_events(&server.url(), "token", "primary", start, end)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(events.len(), 1);
        assert!(events[0].is_recurring());
    }

    #[tokio::test]
    async fn test_list_events_empty_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/calendars/primary/events")
            .match_query(mockito::Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{}"#)
            .create();

        let (start, end) = window();
        let events = list_events(&server.url(), "token", "primary", start, end)
            .await
            .unwrap();
        assert!(events.is_empty());
    }

    #[tokio::test]
    async fn test_cancel_event_patches_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("PATCH", "/calendars/primary/events/evt_1")
            .match_query(mockito::Matcher::UrlEncoded(
                "sendUpdates".to_string(),
                "all".to_string(),
            ))
            .match_body(mockito::Matcher::JsonString(
                r#"{"status": "cancelled"}"#.to_string(),
            ))
            .with_status(200)
            .create();

        cancel_event(&server.url(), "token", "primary", "evt_1", true)
            .await
            .unwrap();
        mock.assert();
    }

    #[tokio::test]
    async fn test_cancel_event_http_error_propagates() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("PATCH", "/calendars/primary/events/evt_1")
            .match_query(mockito::Matcher::Any)
            .with_status(403)
            .create();

        let result = cancel_event(&server.url(), "token", "primary", "evt_1", false).await;
        assert!(result.is_err());
    }
}
