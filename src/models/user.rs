use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Represents the 'user_tokens' table: one row per authenticated channel
/// owner, holding the Google OAuth credential pair.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserTokens {
    /// The owner's YouTube channel ID, doubling as our user key.
    pub user_id: String,

    pub channel_id: String,

    /// Short-lived OAuth access token.
    /// Skipped during serialization to prevent leaking credentials.
    #[serde(skip)]
    pub access_token: String,

    /// Long-lived refresh token; absent when Google did not issue one.
    #[serde(skip)]
    pub refresh_token: Option<String>,

    pub token_expiry: Option<chrono::DateTime<chrono::Utc>>,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl UserTokens {
    /// Whether the stored access token is still usable, with a safety
    /// margin so a token never expires mid-request.
    pub fn access_token_fresh(&self) -> bool {
        match self.token_expiry {
            Some(expiry) => expiry > chrono::Utc::now() + chrono::Duration::seconds(60),
            None => false,
        }
    }
}
