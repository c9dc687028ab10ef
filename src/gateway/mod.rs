//! Interface to the calendar/email provider. The orchestrator only
//! ever talks to a provider through this trait so any failure from an
//! implementation is treated as a recoverable per-item failure.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::calendar::RawEvent;

#[async_trait]
pub trait CalendarGateway: Send + Sync {
    /// Obtain or refresh credentials for the provider.
    async fn authenticate(&self) -> Result<()>;

    /// Fetch all events overlapping `start` and `end`, in the
    /// provider's stable order. Recurring series arrive as single
    /// unexpanded records carrying their recurrence rules; instances
    /// are only materialized when a series is cancelled.
    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>>;

    /// Cancel a single event, optionally notifying attendees.
    async fn cancel_event(&self, event_id: &str, notify: bool) -> Result<bool>;

    /// Cancel the instances of a recurring series that fall inside
    /// the window. Returns whether the series was found and how many
    /// instances were cancelled.
    async fn cancel_recurring_instances(
        &self,
        event_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(bool, usize)>;

    /// Send an email to the recipients from the authenticated user.
    async fn send_email(&self, recipients: &[String], subject: &str, body: &str) -> Result<bool>;

    /// The email address of the authenticated user.
    async fn authenticated_user_email(&self) -> Result<String>;
}

// Sessions share one provider connection, so the trait is also
// implemented for a shared handle by delegation.
#[async_trait]
impl<T: CalendarGateway + ?Sized> CalendarGateway for Arc<T> {
    async fn authenticate(&self) -> Result<()> {
        (**self).authenticate().await
    }

    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>> {
        (**self).fetch_events(start, end).await
    }

    async fn cancel_event(&self, event_id: &str, notify: bool) -> Result<bool> {
        (**self).cancel_event(event_id, notify).await
    }

    async fn cancel_recurring_instances(
        &self,
        event_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(bool, usize)> {
        (**self).cancel_recurring_instances(event_id, start, end).await
    }

    async fn send_email(&self, recipients: &[String], subject: &str, body: &str) -> Result<bool> {
        (**self).send_email(recipients, subject, body).await
    }

    async fn authenticated_user_email(&self) -> Result<String> {
        (**self).authenticated_user_email().await
    }
}
