//! Gmail API client for sending mail as the authenticated user.

use anyhow::Result;
use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_API_BASE: &str = "https://gmail.googleapis.com/gmail/v1";

#[derive(Debug, Deserialize)]
pub struct SendResponse {
    pub id: String,
}

/// Build the raw RFC 2822 message Gmail expects, base64url encoded.
/// The Gmail API uses "me" to refer to the authenticated user.
fn encode_message(recipients: &[String], subject: &str, body: &str) -> String {
    let message = format!(
        "From: me\r\nTo: {}\r\nSubject: {}\r\nContent-Type: text/plain; charset=\"UTF-8\"\r\n\r\n{}",
        recipients.join(", "),
        subject,
        body
    );
    URL_SAFE.encode(message.as_bytes())
}

/// Send a plain-text email from the authenticated user.
pub async fn send_message(
    api_base: &str,
    access_token: &str,
    recipients: &[String],
    subject: &str,
    body: &str,
) -> Result<SendResponse> {
    let url = format!("{}/users/me/messages/send", api_base);
    let raw = encode_message(recipients, subject, body);
    let resp = Client::new()
        .post(url)
        .bearer_auth(access_token)
        .json(&json!({"raw": raw}))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(resp)
}
