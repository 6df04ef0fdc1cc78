// src/config.rs

use dotenvy::dotenv;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,

    pub google_client_id: String,
    pub google_client_secret: String,
    /// Absolute URL Google redirects back to after consent.
    pub oauth_redirect_url: String,

    /// Missing key does not prevent startup; the composer then answers
    /// with a synthetic error suggestion instead of generated text.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let google_client_id =
            env::var("GOOGLE_CLIENT_ID").expect("GOOGLE_CLIENT_ID must be set");

        let google_client_secret =
            env::var("GOOGLE_CLIENT_SECRET").expect("GOOGLE_CLIENT_SECRET must be set");

        let oauth_redirect_url = env::var("OAUTH_REDIRECT_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api/auth/callback".to_string());

        let gemini_api_key = env::var("GEMINI_API_KEY").ok();

        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-2.0-flash-exp".to_string());

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            google_client_id,
            google_client_secret,
            oauth_redirect_url,
            gemini_api_key,
            gemini_model,
        }
    }
}
