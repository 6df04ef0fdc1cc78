// src/services/videos.rs
//
// Upload listing and reply-rate aggregation over the channel's videos.

use std::collections::{HashMap, HashSet};

use crate::models::comment::{CommentSort, CommentStats};
use crate::models::video::{ChannelInfo, Video, VideoDetails, VideoSort};
use crate::services::classifier::{self, ClassifyOptions};
use crate::services::youtube::{
    AuthorizedThreads, ID_BATCH_SIZE, VideoAnalytics, YouTubeClient, YouTubeError, pick_thumbnail,
};

/// Default number of uploads listed per call.
pub const DEFAULT_VIDEO_LIMIT: usize = 200;

/// Reduced limit for the unreplied_desc sort, which costs one comment
/// listing call per video on top of the playlist pagination.
pub const UNREPLIED_SORT_LIMIT: usize = 50;

/// Default sample size for the aggregated reply-rate estimate.
pub const DEFAULT_STATS_SAMPLE: usize = 5;

/// Fetches the owner channel's display info.
pub async fn channel_info(
    yt: &YouTubeClient,
    token: &str,
) -> Result<Option<ChannelInfo>, YouTubeError> {
    let Some(channel) = yt.my_channel(token, "snippet,statistics").await? else {
        return Ok(None);
    };

    let (name, icon) = channel
        .snippet
        .map(|s| {
            let icon = s
                .thumbnails
                .get("default")
                .map(|t| t.url.clone())
                .unwrap_or_default();
            (s.title, icon)
        })
        .unwrap_or_default();

    let subscriber_count = channel
        .statistics
        .and_then(|s| s.subscriber_count)
        .and_then(|c| c.parse().ok())
        .unwrap_or(0);

    Ok(Some(ChannelInfo {
        name,
        icon,
        subscriber_count,
    }))
}

/// Lists recent uploads with statistics and best-effort analytics.
///
/// For `unreplied_desc` the limit drops to 50 and each listed video gets a
/// one-page classifier pass purely to obtain an approximate unreplied
/// count; per-video failures default that count to zero instead of
/// aborting the listing.
pub async fn recent_videos(
    yt: &YouTubeClient,
    token: &str,
    owner_channel_id: &str,
    completed: &HashSet<String>,
    limit: usize,
    sort: VideoSort,
) -> Result<Vec<Video>, YouTubeError> {
    let limit = if sort == VideoSort::UnrepliedDesc {
        limit.min(UNREPLIED_SORT_LIMIT)
    } else {
        limit
    };

    let uploads_playlist = yt
        .my_channel(token, "contentDetails")
        .await?
        .and_then(|c| c.content_details)
        .map(|d| d.related_playlists.uploads)
        .ok_or_else(|| YouTubeError::Api {
            status: 404,
            reason: "channelNotFound".to_string(),
            message: "No channel for the authenticated user".to_string(),
        })?;

    // Page through the uploads playlist, 50 items per call.
    let mut items = Vec::new();
    let mut page_token: Option<String> = None;
    while items.len() < limit {
        let batch = limit - items.len();
        let page = yt
            .playlist_items(token, &uploads_playlist, batch, page_token.as_deref())
            .await?;
        items.extend(page.items);
        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    if items.is_empty() {
        return Ok(Vec::new());
    }

    let video_ids: Vec<String> = items
        .iter()
        .map(|i| i.content_details.video_id.clone())
        .collect();

    // Statistics lookups batched at the API's 50-id ceiling.
    let mut view_counts: HashMap<String, u64> = HashMap::new();
    for chunk in video_ids.chunks(ID_BATCH_SIZE) {
        let stats = yt.videos(token, chunk, "statistics").await?;
        for item in stats.items {
            let views = item
                .statistics
                .and_then(|s| s.view_count)
                .and_then(|v| v.parse().ok())
                .unwrap_or(0);
            view_counts.insert(item.id, views);
        }
    }

    // Analytics is best effort: a failed batch logs a warning and leaves
    // those videos at zero watch time.
    let mut analytics: HashMap<String, VideoAnalytics> = HashMap::new();
    for chunk in video_ids.chunks(ID_BATCH_SIZE) {
        match yt.video_analytics(token, chunk).await {
            Ok(batch) => analytics.extend(batch),
            Err(e) => {
                tracing::warn!("Analytics batch failed: {}", e);
            }
        }
    }

    let mut videos: Vec<Video> = items
        .into_iter()
        .map(|item| {
            let id = item.content_details.video_id;
            let stats = analytics.get(&id).copied().unwrap_or_default();
            Video {
                view_count: view_counts.get(&id).copied().unwrap_or(0),
                watch_time_mins: stats.estimated_minutes_watched,
                avg_watch_time_sec: stats.average_view_duration,
                unreplied_count: 0,
                title: item.snippet.title,
                thumbnail: pick_thumbnail(&item.snippet.thumbnails),
                published_at: item.snippet.published_at,
                id,
            }
        })
        .collect();

    match sort {
        VideoSort::DateDesc => videos.sort_by(|a, b| b.published_at.cmp(&a.published_at)),
        VideoSort::DateAsc => videos.sort_by(|a, b| a.published_at.cmp(&b.published_at)),
        VideoSort::ViewsDesc => videos.sort_by(|a, b| b.view_count.cmp(&a.view_count)),
        VideoSort::WatchTimeDesc => {
            videos.sort_by(|a, b| b.watch_time_mins.cmp(&a.watch_time_mins))
        }
        VideoSort::UnrepliedDesc => {
            let source = AuthorizedThreads { client: yt, token };
            for video in &mut videos {
                let opts = ClassifyOptions {
                    sort: CommentSort::DateDesc,
                    max_pages: Some(1),
                };
                let result =
                    classifier::video_comments(&source, &video.id, owner_channel_id, completed, opts)
                        .await;
                match result {
                    Ok(page) => video.unreplied_count = page.stats.unreplied,
                    Err(e) => {
                        tracing::warn!("Failed to fetch comments for video {}: {}", video.id, e);
                        video.unreplied_count = 0;
                    }
                }
            }
            videos.sort_by(|a, b| b.unreplied_count.cmp(&a.unreplied_count));
        }
    }

    Ok(videos)
}

/// Title and thumbnail for a single video, `None` when it does not exist.
pub async fn video_details(
    yt: &YouTubeClient,
    token: &str,
    video_id: &str,
) -> Result<Option<VideoDetails>, YouTubeError> {
    let ids = [video_id.to_string()];
    let response = yt.videos(token, &ids, "snippet").await?;

    Ok(response.items.into_iter().next().and_then(|item| {
        item.snippet.map(|snippet| VideoDetails {
            id: video_id.to_string(),
            title: snippet.title,
            thumbnail: pick_thumbnail(&snippet.thumbnails),
        })
    }))
}

/// Estimates the channel-wide reply rate from the latest `limit` videos.
///
/// Per-video classification failures are skipped; the estimate combines
/// whatever videos could be read. Rate uses the same truncating division
/// as the per-video stats.
pub async fn aggregated_reply_stats(
    yt: &YouTubeClient,
    token: &str,
    owner_channel_id: &str,
    completed: &HashSet<String>,
    limit: usize,
) -> Result<CommentStats, YouTubeError> {
    let videos = recent_videos(yt, token, owner_channel_id, completed, limit, VideoSort::DateDesc)
        .await?;

    let source = AuthorizedThreads { client: yt, token };
    let mut totals = CommentStats::default();

    for video in videos {
        match classifier::video_comments(
            &source,
            &video.id,
            owner_channel_id,
            completed,
            ClassifyOptions::default(),
        )
        .await
        {
            Ok(page) => {
                totals.replied += page.stats.replied;
                totals.pending += page.stats.pending;
                totals.unreplied += page.stats.unreplied;
            }
            Err(e) => {
                tracing::warn!("Skipping video {} in reply stats: {}", video.id, e);
            }
        }
    }

    totals.total = totals.replied + totals.pending + totals.unreplied;
    totals.rate = classifier::reply_rate(totals.replied, totals.total);
    Ok(totals)
}
