// src/handlers/actions.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::comment::{
        DeleteCommentRequest, PostReplyRequest, RateCommentRequest, ThreadStateRequest,
    },
    services::{oauth::OAuthClient, replies, youtube::YouTubeClient},
    store::Store,
    utils::jwt::Claims,
};

use super::access_token;

/// Posts a reply under a top-level comment.
///
/// After a successful post the thread's local pending marker is cleared
/// (best effort: a cleanup failure is logged, not returned) and the reply
/// is appended to the log that feeds the composer's few-shot examples.
pub async fn post_reply(
    State(store): State<Store>,
    State(oauth): State<OAuthClient>,
    State(youtube): State<YouTubeClient>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<PostReplyRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (_, token) = access_token(&store, &oauth, &claims.sub).await?;

    let posted = youtube
        .insert_reply(&token, &payload.parent_id, &payload.reply_text)
        .await
        .map_err(AppError::from)?;

    replies::record_posted_reply(
        &store,
        &claims.sub,
        &payload.video_id,
        &payload.parent_id,
        &payload.original_comment,
        payload.ai_suggestion.as_deref(),
        &payload.reply_text,
    )
    .await;

    Ok(Json(json!({
        "status": "success",
        "id": posted.id,
        "author_name": posted.snippet.author_display_name,
        "author_image": posted.snippet.author_profile_image_url,
        "published_at": posted.snippet.published_at,
    })))
}

/// Deletes a comment (a reply of ours, or a viewer comment on our video).
pub async fn delete_comment(
    State(store): State<Store>,
    State(oauth): State<OAuthClient>,
    State(youtube): State<YouTubeClient>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<DeleteCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (_, token) = access_token(&store, &oauth, &claims.sub).await?;

    youtube
        .delete_comment(&token, &payload.comment_id)
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({ "status": "success" })))
}

/// Sets the viewer rating on a comment: 'like', 'dislike' or 'none'.
pub async fn rate_comment(
    State(store): State<Store>,
    State(oauth): State<OAuthClient>,
    State(youtube): State<YouTubeClient>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<RateCommentRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (_, token) = access_token(&store, &oauth, &claims.sub).await?;

    youtube
        .set_rating(&token, &payload.comment_id, &payload.rating)
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({ "status": "success" })))
}

/// Marks a thread as handled without replying. The marker is a purely
/// local annotation; the classifier shows such threads as 'pending' until
/// an actual reply supersedes them.
pub async fn mark_complete(
    State(store): State<Store>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ThreadStateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    store
        .mark_thread_complete(&claims.sub, &payload.comment_id)
        .await?;

    Ok(Json(json!({ "status": "success" })))
}

/// Removes a thread's handled marker.
pub async fn unmark_complete(
    State(store): State<Store>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ThreadStateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    store
        .clear_thread_state(&claims.sub, &payload.comment_id)
        .await?;

    Ok(Json(json!({ "status": "success" })))
}
