// src/utils/jwt.rs

use std::time::{SystemTime, UNIX_EPOCH};

use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::Config, error::AppError};

/// What a token authorizes. Signed into the `purpose` claim so the
/// short-lived OAuth state token and the session token can never stand
/// in for each other, even though both use the same signing secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenPurpose {
    Session,
    OauthState,
}

/// JWT Claims structure.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Claims {
    /// Subject - stores the user ID (the owner's channel ID).
    pub sub: String,
    /// The owner's YouTube channel ID, used for reply classification.
    pub channel: String,
    /// What this token is good for; checked on every verification.
    pub purpose: TokenPurpose,
    /// Expiration time as Unix timestamp.
    pub exp: usize,
}

/// Signs a new JWT for the given purpose.
pub fn sign_jwt(
    user_id: &str,
    channel_id: &str,
    purpose: TokenPurpose,
    secret: &str,
    expiration_seconds: u64,
) -> Result<String, AppError> {
    let expiration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?
        .as_secs() as usize
        + expiration_seconds as usize;

    let claims = Claims {
        sub: user_id.to_string(),
        channel: channel_id.to_string(),
        purpose,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::InternalServerError(e.to_string()))
}

/// Verifies and decodes a JWT string.
///
/// Returns the `Claims` if the signature, expiry and purpose all check
/// out; a valid token of the wrong purpose is rejected the same as a
/// forged one.
pub fn verify_jwt(token: &str, secret: &str, expected: TokenPurpose) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::AuthError("Invalid token".to_string()))?;

    if token_data.claims.purpose != expected {
        return Err(AppError::AuthError("Invalid token".to_string()));
    }

    Ok(token_data.claims)
}

/// Axum Middleware: Authentication.
///
/// Intercepts requests, validates the 'Authorization: Bearer <token>' header.
/// If valid, injects `Claims` into the request extensions for handlers to use.
/// If invalid, returns 401 Unauthorized.
pub async fn auth_middleware(
    State(config): State<Config>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let token = match auth_header {
        Some(header) if header.starts_with("Bearer ") => &header[7..],
        _ => return Err(StatusCode::UNAUTHORIZED),
    };

    match verify_jwt(token, &config.jwt_secret, TokenPurpose::Session) {
        Ok(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        Err(_) => Err(StatusCode::UNAUTHORIZED),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_and_verify_roundtrip() {
        let token = sign_jwt("UC_abc", "UC_abc", TokenPurpose::Session, "secret", 600).unwrap();
        let claims = verify_jwt(&token, "secret", TokenPurpose::Session).unwrap();
        assert_eq!(claims.sub, "UC_abc");
        assert_eq!(claims.channel, "UC_abc");
    }

    #[test]
    fn verify_rejects_wrong_secret() {
        let token = sign_jwt("UC_abc", "UC_abc", TokenPurpose::Session, "secret", 600).unwrap();
        assert!(verify_jwt(&token, "other", TokenPurpose::Session).is_err());
    }

    #[test]
    fn purposes_do_not_cross_over() {
        // An OAuth state token must never pass as a session and vice versa,
        // even though both are signed with the same secret.
        let state = sign_jwt("oauth", "state", TokenPurpose::OauthState, "secret", 600).unwrap();
        assert!(verify_jwt(&state, "secret", TokenPurpose::Session).is_err());
        assert!(verify_jwt(&state, "secret", TokenPurpose::OauthState).is_ok());

        let session = sign_jwt("UC_abc", "UC_abc", TokenPurpose::Session, "secret", 600).unwrap();
        assert!(verify_jwt(&session, "secret", TokenPurpose::OauthState).is_err());
    }
}
