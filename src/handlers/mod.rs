// src/handlers/mod.rs

pub mod actions;
pub mod auth;
pub mod comments;
pub mod generate;
pub mod videos;

use crate::error::AppError;
use crate::models::user::UserTokens;
use crate::services::oauth::OAuthClient;
use crate::store::Store;

/// Resolves a usable Google access token for the session user, refreshing
/// through the OAuth endpoint when the stored one is stale. A missing user
/// row or an unusable refresh token surfaces as 401 so the client
/// re-authenticates.
pub(crate) async fn access_token(
    store: &Store,
    oauth: &OAuthClient,
    user_id: &str,
) -> Result<(UserTokens, String), AppError> {
    let user = store
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::AuthError("User not found".to_string()))?;

    if user.access_token_fresh() {
        let token = user.access_token.clone();
        return Ok((user, token));
    }

    let refresh_token = user
        .refresh_token
        .clone()
        .ok_or_else(|| AppError::AuthError("Token expired, please log in again".to_string()))?;

    let refreshed = oauth.refresh(&refresh_token).await?;

    store
        .save_user_tokens(
            &user.user_id,
            &user.channel_id,
            &refreshed.access_token,
            refreshed.refresh_token.as_deref(),
            refreshed.expiry(),
        )
        .await?;

    let token = refreshed.access_token;
    Ok((user, token))
}
