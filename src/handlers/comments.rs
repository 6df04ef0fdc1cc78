// src/handlers/comments.rs

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::{
    error::AppError,
    models::comment::{CommentListParams, CommentSort},
    services::{
        classifier::{self, ClassifyOptions},
        oauth::OAuthClient,
        videos,
        youtube::{AuthorizedThreads, YouTubeClient},
    },
    store::Store,
    utils::jwt::Claims,
};

use super::access_token;

/// Classified comment listing for one video: buckets in fixed order
/// (unreplied, pending, replied) plus stats and the video's details.
pub async fn list_comments(
    State(store): State<Store>,
    State(oauth): State<OAuthClient>,
    State(youtube): State<YouTubeClient>,
    Extension(claims): Extension<Claims>,
    Path(video_id): Path<String>,
    Query(params): Query<CommentListParams>,
) -> Result<impl IntoResponse, AppError> {
    let (user, token) = access_token(&store, &oauth, &claims.sub).await?;

    let completed = store.completed_threads(&claims.sub).await?;
    let sort = CommentSort::parse(params.sort.as_deref());

    let source = AuthorizedThreads {
        client: &youtube,
        token: &token,
    };
    let page = classifier::video_comments(
        &source,
        &video_id,
        &user.channel_id,
        &completed,
        ClassifyOptions {
            sort,
            max_pages: None,
        },
    )
    .await
    .map_err(AppError::from)?;

    let video = videos::video_details(&youtube, &token, &video_id)
        .await
        .map_err(AppError::from)?;

    Ok(Json(json!({
        "video": video,
        "comments": page.comments,
        "stats": page.stats,
    })))
}
