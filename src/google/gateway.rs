//! `CalendarGateway` implementation backed by Google Calendar and
//! Gmail.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::calendar::RawEvent;
use crate::core::{AppConfig, ChatError};
use crate::gateway::CalendarGateway;

use super::{gcal, gmail, oauth};

pub struct GoogleGateway {
    client_id: String,
    client_secret: String,
    refresh_token: String,
    calendar_id: String,
    calendar_api_base: String,
    gmail_api_base: String,
    token_url: String,
    userinfo_url: String,
}

impl GoogleGateway {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            refresh_token: config.google_refresh_token.clone(),
            calendar_id: "primary".to_string(),
            calendar_api_base: gcal::DEFAULT_API_BASE.to_string(),
            gmail_api_base: gmail::DEFAULT_API_BASE.to_string(),
            token_url: oauth::default_token_url().to_string(),
            userinfo_url: oauth::default_userinfo_url().to_string(),
        }
    }

    /// Point every endpoint at a test server.
    #[cfg(test)]
    fn with_base_url(base: &str) -> Self {
        Self {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
            calendar_id: "primary".to_string(),
            calendar_api_base: base.to_string(),
            gmail_api_base: base.to_string(),
            token_url: format!("{}/token", base),
            userinfo_url: format!("{}/userinfo", base),
        }
    }

    async fn access_token(&self) -> Result<String> {
        let token = oauth::refresh_access_token(
            &self.client_id,
            &self.client_secret,
            &self.refresh_token,
            &self.token_url,
        )
        .await
        .map_err(|e| anyhow!(ChatError::AuthenticationFailure(e.to_string())))?;
        Ok(token.access_token)
    }
}

fn op_failure(e: anyhow::Error) -> anyhow::Error {
    anyhow!(ChatError::GatewayOperationFailure(e.to_string()))
}

#[async_trait]
impl CalendarGateway for GoogleGateway {
    async fn authenticate(&self) -> Result<()> {
        // A successful token refresh proves the stored credentials
        // still work
        self.access_token().await.map(|_| ())
    }

    async fn fetch_events(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<RawEvent>> {
        let token = self.access_token().await?;
        gcal::list_events(
            &self.calendar_api_base,
            &token,
            &self.calendar_id,
            start,
            end,
        )
        .await
        .map_err(op_failure)
    }

    async fn cancel_event(&self, event_id: &str, notify: bool) -> Result<bool> {
        let token = self.access_token().await?;
        gcal::cancel_event(
            &self.calendar_api_base,
            &token,
            &self.calendar_id,
            event_id,
            notify,
        )
        .await
        .map_err(op_failure)?;
        Ok(true)
    }

    async fn cancel_recurring_instances(
        &self,
        event_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(bool, usize)> {
        let token = self.access_token().await?;
        let instances = gcal::list_instances(
            &self.calendar_api_base,
            &token,
            &self.calendar_id,
            event_id,
            start,
            end,
        )
        .await
        .map_err(op_failure)?;
        if instances.is_empty() {
            return Ok((false, 0));
        }
        let mut cancelled = 0;
        for instance in &instances {
            gcal::cancel_event(
                &self.calendar_api_base,
                &token,
                &self.calendar_id,
                &instance.id,
                true,
            )
            .await
            .map_err(op_failure)?;
            cancelled += 1;
        }
        Ok((true, cancelled))
    }

    async fn send_email(&self, recipients: &[String], subject: &str, body: &str) -> Result<bool> {
        let token = self.access_token().await?;
        gmail::send_message(&self.gmail_api_base, &token, recipients, subject, body)
            .await
            .map_err(op_failure)?;
        Ok(true)
    }

    async fn authenticated_user_email(&self) -> Result<String> {
        let token = self.access_token().await?;
        oauth::user_email(&token, &self.userinfo_url).await
    }
}
