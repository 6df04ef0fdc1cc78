// src/services/oauth.rs
//
// Google OAuth2 authorization-code flow: authorization URL construction,
// code exchange and refresh against the token endpoint.

use serde::Deserialize;
use url::Url;

use crate::error::AppError;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scopes required for comment management plus Analytics reads.
const SCOPES: &str = "https://www.googleapis.com/auth/youtube.force-ssl \
https://www.googleapis.com/auth/yt-analytics.readonly";

/// Token endpoint response for both code exchange and refresh.
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    /// Only present on first consent; refresh responses omit it.
    pub refresh_token: Option<String>,
    pub expires_in: Option<i64>,
}

impl TokenResponse {
    pub fn expiry(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.expires_in
            .map(|secs| chrono::Utc::now() + chrono::Duration::seconds(secs))
    }
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

/// OAuth client bound to one Google application.
#[derive(Clone)]
pub struct OAuthClient {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

impl OAuthClient {
    pub fn new(
        http: reqwest::Client,
        client_id: String,
        client_secret: String,
        redirect_uri: String,
    ) -> Self {
        Self {
            http,
            token_url: TOKEN_URL.to_string(),
            client_id,
            client_secret,
            redirect_uri,
        }
    }

    /// Points the client at an alternative token endpoint. Used by tests.
    pub fn with_token_url(mut self, token_url: &str) -> Self {
        self.token_url = token_url.to_string();
        self
    }

    /// Consent-screen URL for the login redirect. Offline access and a
    /// forced consent prompt so Google always returns a refresh token.
    pub fn authorize_url(&self, state: &str) -> String {
        let mut url = Url::parse(AUTH_URL).expect("static auth URL");
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("scope", SCOPES)
            .append_pair("access_type", "offline")
            .append_pair("include_granted_scopes", "true")
            .append_pair("prompt", "consent")
            .append_pair("state", state);
        url.to_string()
    }

    /// Exchanges an authorization code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code),
            ("grant_type", "authorization_code"),
            ("redirect_uri", self.redirect_uri.as_str()),
        ])
        .await
    }

    /// Refreshes an expired access token.
    ///
    /// An `invalid_grant` answer means the refresh token itself was revoked
    /// or expired and maps to an auth error so the caller forces a re-login.
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, AppError> {
        self.token_request(&[
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ])
        .await
    }

    async fn token_request(&self, form: &[(&str, &str)]) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| AppError::InternalServerError(format!("Token request failed: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return response.json::<TokenResponse>().await.map_err(|e| {
                AppError::InternalServerError(format!("Invalid token response: {}", e))
            });
        }

        let body = response.text().await.unwrap_or_default();
        let parsed: TokenErrorBody = serde_json::from_str(&body).unwrap_or(TokenErrorBody {
            error: String::new(),
            error_description: body.clone(),
        });

        if parsed.error == "invalid_grant" {
            return Err(AppError::AuthError(
                "Token expired, please log in again".to_string(),
            ));
        }

        tracing::error!("OAuth token endpoint error {}: {}", status, body);
        Err(AppError::InternalServerError(format!(
            "OAuth error {}: {}",
            parsed.error, parsed.error_description
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OAuthClient {
        OAuthClient::new(
            reqwest::Client::new(),
            "cid".to_string(),
            "secret".to_string(),
            "http://localhost:3000/api/auth/callback".to_string(),
        )
    }

    #[test]
    fn authorize_url_carries_offline_consent() {
        let url = client().authorize_url("xyz");
        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("access_type=offline"));
        assert!(url.contains("prompt=consent"));
        assert!(url.contains("state=xyz"));
        assert!(url.contains("youtube.force-ssl"));
    }

    #[tokio::test]
    async fn refresh_maps_invalid_grant_to_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant","error_description":"Bad token"}"#)
            .create_async()
            .await;

        let client = client().with_token_url(&format!("{}/token", server.url()));
        let result = client.refresh("stale").await;
        assert!(matches!(result, Err(AppError::AuthError(_))));
    }

    #[tokio::test]
    async fn exchange_parses_token_pair() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"access_token":"at","refresh_token":"rt","expires_in":3599,"token_type":"Bearer"}"#,
            )
            .create_async()
            .await;

        let client = client().with_token_url(&format!("{}/token", server.url()));
        let token = client.exchange_code("code").await.unwrap();
        assert_eq!(token.access_token, "at");
        assert_eq!(token.refresh_token.as_deref(), Some("rt"));
        assert!(token.expiry().is_some());
    }
}
