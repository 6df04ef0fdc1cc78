use crate::config::Config;
use crate::services::{ai::GeminiClient, oauth::OAuthClient, youtube::YouTubeClient};
use axum::extract::FromRef;
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub youtube: YouTubeClient,
    pub oauth: OAuthClient,
    pub ai: GeminiClient,
}

impl AppState {
    /// Wires the shared clients from configuration. One reqwest client
    /// backs all outbound HTTP.
    pub fn new(pool: PgPool, config: Config) -> Self {
        let http = reqwest::Client::new();
        let youtube = YouTubeClient::new(http.clone());
        let oauth = OAuthClient::new(
            http.clone(),
            config.google_client_id.clone(),
            config.google_client_secret.clone(),
            config.oauth_redirect_url.clone(),
        );
        let ai = GeminiClient::new(
            http,
            config.gemini_api_key.clone(),
            config.gemini_model.clone(),
        );

        Self {
            pool,
            config,
            youtube,
            oauth,
            ai,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for YouTubeClient {
    fn from_ref(state: &AppState) -> Self {
        state.youtube.clone()
    }
}

impl FromRef<AppState> for OAuthClient {
    fn from_ref(state: &AppState) -> Self {
        state.oauth.clone()
    }
}

impl FromRef<AppState> for GeminiClient {
    fn from_ref(state: &AppState) -> Self {
        state.ai.clone()
    }
}
