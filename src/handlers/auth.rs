// src/handlers/auth.rs

use axum::{Extension, Json, extract::Query, extract::State, response::IntoResponse};
use serde::Deserialize;
use serde_json::json;

use crate::{
    config::Config,
    error::AppError,
    services::{oauth::OAuthClient, youtube::YouTubeClient},
    store::Store,
    utils::jwt::{Claims, TokenPurpose, sign_jwt, verify_jwt},
};

/// Lifetime of the CSRF state token carried through the consent redirect.
const STATE_TTL_SECONDS: u64 = 600;

/// Starts the login flow: hands the client the Google consent URL.
///
/// The `state` parameter is a short-lived signed token, verified again in
/// the callback, so no server-side session is needed. Its purpose claim
/// keeps it from being replayed as a session token.
pub async fn login(
    State(config): State<Config>,
    State(oauth): State<OAuthClient>,
) -> Result<impl IntoResponse, AppError> {
    let state = sign_jwt(
        "oauth",
        "state",
        TokenPurpose::OauthState,
        &config.jwt_secret,
        STATE_TTL_SECONDS,
    )?;
    let auth_url = oauth.authorize_url(&state);

    Ok(Json(json!({ "auth_url": auth_url })))
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: String,
    pub state: String,
}

/// OAuth callback: exchanges the authorization code, looks up the owner's
/// channel id, persists the credential pair and issues a session JWT.
pub async fn callback(
    State(config): State<Config>,
    State(oauth): State<OAuthClient>,
    State(youtube): State<YouTubeClient>,
    State(store): State<Store>,
    Query(params): Query<CallbackParams>,
) -> Result<impl IntoResponse, AppError> {
    verify_jwt(&params.state, &config.jwt_secret, TokenPurpose::OauthState)
        .map_err(|_| AppError::AuthError("Invalid OAuth state".to_string()))?;

    let tokens = oauth.exchange_code(&params.code).await?;

    let channel = youtube
        .my_channel(&tokens.access_token, "id")
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::AuthError("No channel for this Google account".to_string()))?;

    // The channel id doubles as our user key.
    store
        .save_user_tokens(
            &channel.id,
            &channel.id,
            &tokens.access_token,
            tokens.refresh_token.as_deref(),
            tokens.expiry(),
        )
        .await?;

    let token = sign_jwt(
        &channel.id,
        &channel.id,
        TokenPurpose::Session,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "channel_id": channel.id,
    })))
}

/// Logout: deletes the stored credential pair. The session JWT simply
/// expires; without tokens it cannot reach the remote API anymore.
pub async fn logout(
    State(store): State<Store>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    store.delete_user(&claims.sub).await?;
    Ok(Json(json!({ "status": "success" })))
}
