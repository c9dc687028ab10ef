//! Token refresh and user identity lookups against Google's OAuth
//! endpoints. The consent flow that produces the refresh token is an
//! external concern; this module only exchanges and uses tokens.

use anyhow::{Result, anyhow};
use serde::Deserialize;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

#[derive(Debug, Deserialize)]
pub struct OauthToken {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    email: String,
}

/// Exchange a long-lived refresh token for a short-lived access
/// token.
pub async fn refresh_access_token(
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
    token_url: &str,
) -> Result<OauthToken> {
    if refresh_token.is_empty() {
        return Err(anyhow!("no refresh token configured"));
    }
    let params = [
        ("client_id", client_id),
        ("client_secret", client_secret),
        ("refresh_token", refresh_token),
        ("grant_type", "refresh_token"),
    ];
    let token = reqwest::Client::new()
        .post(token_url)
        .form(&params)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(token)
}

/// The email address of the user the access token belongs to.
pub async fn user_email(access_token: &str, userinfo_url: &str) -> Result<String> {
    let info: UserInfo = reqwest::Client::new()
        .get(userinfo_url)
        .bearer_auth(access_token)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    Ok(info.email)
}

pub fn default_token_url() -> &'static str {
    TOKEN_URL
}

pub fn default_userinfo_url() -> &'static str {
    USERINFO_URL
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refresh_access_token() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token": "ya29.test", "expires_in": 3599}"#)
            .create();

        let url = format!("{}/token", server.url());
        let token = refresh_access_token("id", "secret", "refresh", &url)
            .await
            .unwrap();

        mock.assert();
        assert_eq!(token.access_token, "ya29.test");
    }

    #[tokio::test]
    async fn test_refresh_without_token_fails_fast() {
        let result = refresh_access_token("id", "secret", "", "http://unused").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_user_email() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/userinfo")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"email": "me@example.com"}"#)
            .create();

        let url = format!("{}/userinfo", server.url());
        let email = user_email("token", &url).await.unwrap();

        mock.assert();
        assert_eq!(email, "me@example.com");
    }
}
