// src/handlers/videos.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::video::{ReplyStatsParams, VideoListParams, VideoSort},
    services::{oauth::OAuthClient, videos, youtube::YouTubeClient},
    store::Store,
    utils::jwt::Claims,
};

use super::access_token;

/// Channel display info for the dashboard header.
pub async fn channel(
    State(store): State<Store>,
    State(oauth): State<OAuthClient>,
    State(youtube): State<YouTubeClient>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let (_, token) = access_token(&store, &oauth, &claims.sub).await?;

    let info = videos::channel_info(&youtube, &token)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound("Channel not found".to_string()))?;

    Ok(Json(info))
}

/// Lists recent uploads with statistics.
pub async fn list_videos(
    State(store): State<Store>,
    State(oauth): State<OAuthClient>,
    State(youtube): State<YouTubeClient>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<VideoListParams>,
) -> Result<impl IntoResponse, AppError> {
    let (user, token) = access_token(&store, &oauth, &claims.sub).await?;

    let sort = VideoSort::parse(params.sort.as_deref());
    let limit = params.limit.unwrap_or(videos::DEFAULT_VIDEO_LIMIT);

    // The completed-marker set feeds the per-video classifier pass used by
    // the unreplied_desc sort; other sorts ignore it.
    let completed = store.completed_threads(&claims.sub).await?;

    let listing = videos::recent_videos(&youtube, &token, &user.channel_id, &completed, limit, sort)
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({ "videos": listing })))
}

/// Channel-wide reply-rate estimate over the latest few videos, plus the
/// trailing-24h reply count for quota displays.
pub async fn reply_stats(
    State(store): State<Store>,
    State(oauth): State<OAuthClient>,
    State(youtube): State<YouTubeClient>,
    Extension(claims): Extension<Claims>,
    Query(params): Query<ReplyStatsParams>,
) -> Result<impl IntoResponse, AppError> {
    let (user, token) = access_token(&store, &oauth, &claims.sub).await?;

    let limit = params.limit.unwrap_or(videos::DEFAULT_STATS_SAMPLE);
    let completed = store.completed_threads(&claims.sub).await?;

    let stats =
        videos::aggregated_reply_stats(&youtube, &token, &user.channel_id, &completed, limit)
            .await
            .map_err(AppError::from)?;

    let daily_replies = store.daily_reply_count(&claims.sub).await?;

    Ok(Json(json!({
        "stats": stats,
        "daily_replies": daily_replies,
    })))
}
