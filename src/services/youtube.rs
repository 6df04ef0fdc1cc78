// src/services/youtube.rs

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use serde::Deserialize;

/// Errors surfaced by the YouTube Data / Analytics APIs.
///
/// `TokenExpired` and `CommentsDisabled` get dedicated variants because the
/// caller reacts to them specifically: the former invalidates the session,
/// the latter is treated as an empty result rather than a failure.
#[derive(Debug)]
pub enum YouTubeError {
    /// The access token was rejected (401 invalid_credentials).
    TokenExpired,

    /// Comments are turned off for the requested video (403 commentsDisabled).
    CommentsDisabled,

    /// Any other error envelope returned by the API.
    Api {
        status: u16,
        reason: String,
        message: String,
    },

    /// Transport-level failure before an API response was obtained.
    Http(reqwest::Error),
}

impl fmt::Display for YouTubeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YouTubeError::TokenExpired => write!(f, "YouTube access token expired"),
            YouTubeError::CommentsDisabled => write!(f, "Comments are disabled for this video"),
            YouTubeError::Api {
                status,
                reason,
                message,
            } => write!(f, "YouTube API error {} ({}): {}", status, reason, message),
            YouTubeError::Http(e) => write!(f, "YouTube request failed: {}", e),
        }
    }
}

impl std::error::Error for YouTubeError {}

impl From<reqwest::Error> for YouTubeError {
    fn from(err: reqwest::Error) -> Self {
        YouTubeError::Http(err)
    }
}

/// Standard Google API error envelope.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
    #[serde(default)]
    errors: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: String,
}

// ---------------------------------------------------------------------------
// Wire resources (subset of the YouTube Data API v3 JSON contract)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct Thumbnail {
    pub url: String,
}

/// Picks the medium thumbnail, falling back to default, then to any entry.
pub fn pick_thumbnail(thumbnails: &HashMap<String, Thumbnail>) -> String {
    thumbnails
        .get("medium")
        .or_else(|| thumbnails.get("default"))
        .or_else(|| thumbnails.values().next())
        .map(|t| t.url.clone())
        .unwrap_or_default()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelListResponse {
    #[serde(default)]
    pub items: Vec<ChannelResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResource {
    pub id: String,
    pub snippet: Option<ChannelSnippet>,
    pub statistics: Option<ChannelStatistics>,
    pub content_details: Option<ChannelContentDetails>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelSnippet {
    pub title: String,
    #[serde(default)]
    pub thumbnails: HashMap<String, Thumbnail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStatistics {
    /// The API serializes counters as strings.
    #[serde(default)]
    pub subscriber_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelContentDetails {
    pub related_playlists: RelatedPlaylists,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelatedPlaylists {
    pub uploads: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemListResponse {
    #[serde(default)]
    pub items: Vec<PlaylistItemResource>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemResource {
    pub snippet: PlaylistItemSnippet,
    pub content_details: PlaylistItemContentDetails,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemSnippet {
    pub title: String,
    #[serde(default)]
    pub thumbnails: HashMap<String, Thumbnail>,
    pub published_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItemContentDetails {
    pub video_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoListResponse {
    #[serde(default)]
    pub items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoResource {
    pub id: String,
    pub snippet: Option<VideoSnippet>,
    pub statistics: Option<VideoStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoSnippet {
    pub title: String,
    #[serde(default)]
    pub thumbnails: HashMap<String, Thumbnail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoStatistics {
    #[serde(default)]
    pub view_count: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentThreadListResponse {
    #[serde(default)]
    pub items: Vec<ThreadResource>,
    pub next_page_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadResource {
    pub id: String,
    pub snippet: ThreadSnippet,
    pub replies: Option<ReplyList>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThreadSnippet {
    pub top_level_comment: CommentResource,
    #[serde(default)]
    pub total_reply_count: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyList {
    #[serde(default)]
    pub comments: Vec<CommentResource>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResource {
    pub id: String,
    pub snippet: CommentSnippet,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSnippet {
    pub author_channel_id: Option<AuthorChannelId>,
    #[serde(default)]
    pub author_display_name: String,
    #[serde(default)]
    pub author_profile_image_url: String,
    #[serde(default)]
    pub text_display: String,
    #[serde(default)]
    pub like_count: i64,
    /// 'like', 'dislike' or 'none'; absent for replies.
    pub viewer_rating: Option<String>,
    pub published_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthorChannelId {
    pub value: String,
}

impl CommentSnippet {
    pub fn author_channel(&self) -> &str {
        self.author_channel_id
            .as_ref()
            .map(|c| c.value.as_str())
            .unwrap_or("")
    }
}

/// One page of comment threads for a video.
#[derive(Debug, Default)]
pub struct ThreadPage {
    pub items: Vec<ThreadResource>,
    pub next_page_token: Option<String>,
}

/// Pagination seam for the comment classifier. The production
/// implementation talks to the Data API; tests substitute a fake.
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn page(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<ThreadPage, YouTubeError>;
}

/// Analytics rows keyed by video id.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoAnalytics {
    pub estimated_minutes_watched: u64,
    pub average_view_duration: u64,
}

#[derive(Debug, Deserialize)]
struct AnalyticsResponse {
    /// Rows are heterogeneous arrays: [video_id, minutes, avg_duration].
    #[serde(default)]
    rows: Option<Vec<Vec<serde_json::Value>>>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

const DATA_API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const ANALYTICS_API_BASE: &str = "https://youtubeanalytics.googleapis.com/v2";

/// Page size ceiling for commentThreads.list.
pub const COMMENT_PAGE_SIZE: usize = 100;

/// Batch-size ceiling for id-list lookups (videos.list, Analytics filters).
pub const ID_BATCH_SIZE: usize = 50;

/// Thin HTTP client over the YouTube Data API v3 and Analytics API v2.
///
/// Holds no credentials itself: every call takes the caller's access token,
/// so one client instance serves all users.
#[derive(Clone)]
pub struct YouTubeClient {
    http: reqwest::Client,
    api_base: String,
    analytics_base: String,
}

impl YouTubeClient {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            api_base: DATA_API_BASE.to_string(),
            analytics_base: ANALYTICS_API_BASE.to_string(),
        }
    }

    /// Points the client at alternative base URLs. Used by tests.
    pub fn with_base_urls(http: reqwest::Client, api_base: &str, analytics_base: &str) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            analytics_base: analytics_base.trim_end_matches('/').to_string(),
        }
    }

    async fn check<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, YouTubeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }
        Err(Self::error_from_response(status.as_u16(), response).await)
    }

    async fn error_from_response(status: u16, response: reqwest::Response) -> YouTubeError {
        let body = response.text().await.unwrap_or_default();
        let (reason, message) = match serde_json::from_str::<ErrorEnvelope>(&body) {
            Ok(envelope) => {
                let reason = envelope
                    .error
                    .errors
                    .first()
                    .map(|d| d.reason.clone())
                    .unwrap_or_default();
                (reason, envelope.error.message)
            }
            Err(_) => (String::new(), body),
        };

        if status == 401 {
            return YouTubeError::TokenExpired;
        }
        if status == 403 && reason == "commentsDisabled" {
            return YouTubeError::CommentsDisabled;
        }
        YouTubeError::Api {
            status,
            reason,
            message,
        }
    }

    /// channels.list mine=true for the authenticated owner.
    pub async fn my_channel(
        &self,
        token: &str,
        part: &str,
    ) -> Result<Option<ChannelResource>, YouTubeError> {
        let response = self
            .http
            .get(format!("{}/channels", self.api_base))
            .bearer_auth(token)
            .query(&[("mine", "true"), ("part", part)])
            .send()
            .await?;

        let list: ChannelListResponse = Self::check(response).await?;
        Ok(list.items.into_iter().next())
    }

    /// playlistItems.list: one page of the uploads playlist.
    pub async fn playlist_items(
        &self,
        token: &str,
        playlist_id: &str,
        max_results: usize,
        page_token: Option<&str>,
    ) -> Result<PlaylistItemListResponse, YouTubeError> {
        let max_results = max_results.min(ID_BATCH_SIZE).to_string();
        let mut query = vec![
            ("playlistId", playlist_id),
            ("part", "snippet,contentDetails"),
            ("maxResults", max_results.as_str()),
        ];
        if let Some(page) = page_token {
            query.push(("pageToken", page));
        }

        let response = self
            .http
            .get(format!("{}/playlistItems", self.api_base))
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?;

        Self::check(response).await
    }

    /// videos.list for a batch of ids (caller keeps batches at 50).
    pub async fn videos(
        &self,
        token: &str,
        ids: &[String],
        part: &str,
    ) -> Result<VideoListResponse, YouTubeError> {
        let response = self
            .http
            .get(format!("{}/videos", self.api_base))
            .bearer_auth(token)
            .query(&[("part", part), ("id", ids.join(",").as_str())])
            .send()
            .await?;

        Self::check(response).await
    }

    /// commentThreads.list: one page of top-level comments with inline replies.
    pub async fn comment_threads(
        &self,
        token: &str,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<CommentThreadListResponse, YouTubeError> {
        let max_results = COMMENT_PAGE_SIZE.to_string();
        let mut query = vec![
            ("videoId", video_id),
            ("part", "snippet,replies"),
            ("maxResults", max_results.as_str()),
            ("textFormat", "plainText"),
        ];
        if let Some(page) = page_token {
            query.push(("pageToken", page));
        }

        let response = self
            .http
            .get(format!("{}/commentThreads", self.api_base))
            .bearer_auth(token)
            .query(&query)
            .send()
            .await?;

        Self::check(response).await
    }

    /// comments.insert: posts a reply under a top-level comment.
    pub async fn insert_reply(
        &self,
        token: &str,
        parent_id: &str,
        text: &str,
    ) -> Result<CommentResource, YouTubeError> {
        let body = serde_json::json!({
            "snippet": {
                "parentId": parent_id,
                "textOriginal": text,
            }
        });

        let response = self
            .http
            .post(format!("{}/comments", self.api_base))
            .bearer_auth(token)
            .query(&[("part", "snippet")])
            .json(&body)
            .send()
            .await?;

        Self::check(response).await
    }

    /// comments.delete.
    pub async fn delete_comment(&self, token: &str, comment_id: &str) -> Result<(), YouTubeError> {
        let response = self
            .http
            .delete(format!("{}/comments", self.api_base))
            .bearer_auth(token)
            .query(&[("id", comment_id)])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(Self::error_from_response(status.as_u16(), response).await)
    }

    /// comments/setRating: raw authorized call; the API answers 204 on
    /// success and anything else is an error.
    pub async fn set_rating(
        &self,
        token: &str,
        comment_id: &str,
        rating: &str,
    ) -> Result<(), YouTubeError> {
        let response = self
            .http
            .post(format!("{}/comments/setRating", self.api_base))
            .bearer_auth(token)
            .query(&[("id", comment_id), ("rating", rating)])
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 204 {
            return Ok(());
        }
        Err(Self::error_from_response(status.as_u16(), response).await)
    }

    /// Analytics reports.query for a batch of video ids. Returns watch-time
    /// metrics keyed by video id; videos without rows are simply absent.
    pub async fn video_analytics(
        &self,
        token: &str,
        ids: &[String],
    ) -> Result<HashMap<String, VideoAnalytics>, YouTubeError> {
        let end_date = chrono::Utc::now().format("%Y-%m-%d").to_string();
        let filters = format!("video=={}", ids.join(","));

        let response = self
            .http
            .get(format!("{}/reports", self.analytics_base))
            .bearer_auth(token)
            .query(&[
                ("ids", "channel==MINE"),
                ("startDate", "2010-01-01"),
                ("endDate", end_date.as_str()),
                ("metrics", "estimatedMinutesWatched,averageViewDuration"),
                ("dimensions", "video"),
                ("filters", filters.as_str()),
            ])
            .send()
            .await?;

        let report: AnalyticsResponse = Self::check(response).await?;

        let mut map = HashMap::new();
        for row in report.rows.unwrap_or_default() {
            let Some(video_id) = row.first().and_then(|v| v.as_str()) else {
                continue;
            };
            let minutes = row.get(1).and_then(|v| v.as_f64()).unwrap_or(0.0);
            let avg = row.get(2).and_then(|v| v.as_f64()).unwrap_or(0.0);
            map.insert(
                video_id.to_string(),
                VideoAnalytics {
                    estimated_minutes_watched: minutes as u64,
                    average_view_duration: avg as u64,
                },
            );
        }
        Ok(map)
    }
}

/// A `CommentSource` bound to one user's access token.
pub struct AuthorizedThreads<'a> {
    pub client: &'a YouTubeClient,
    pub token: &'a str,
}

#[async_trait]
impl CommentSource for AuthorizedThreads<'_> {
    async fn page(
        &self,
        video_id: &str,
        page_token: Option<&str>,
    ) -> Result<ThreadPage, YouTubeError> {
        let response = self
            .client
            .comment_threads(self.token, video_id, page_token)
            .await?;
        Ok(ThreadPage {
            items: response.items,
            next_page_token: response.next_page_token,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_comment_thread_listing() {
        let body = serde_json::json!({
            "items": [{
                "id": "thread1",
                "snippet": {
                    "totalReplyCount": 1,
                    "topLevelComment": {
                        "id": "comment1",
                        "snippet": {
                            "authorChannelId": {"value": "UC_viewer"},
                            "authorDisplayName": "Viewer",
                            "authorProfileImageUrl": "http://example.com/a.jpg",
                            "textDisplay": "Nice video",
                            "likeCount": 5,
                            "viewerRating": "none",
                            "publishedAt": "2024-03-01T00:00:00Z",
                            "updatedAt": "2024-03-01T00:00:00Z"
                        }
                    }
                },
                "replies": {
                    "comments": [{
                        "id": "reply1",
                        "snippet": {
                            "authorChannelId": {"value": "UC_owner"},
                            "authorDisplayName": "Me",
                            "authorProfileImageUrl": "http://example.com/me.jpg",
                            "textDisplay": "Thanks!",
                            "publishedAt": "2024-03-02T00:00:00Z"
                        }
                    }]
                }
            }],
            "nextPageToken": "CAUQAA"
        });

        let parsed: CommentThreadListResponse = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.next_page_token.as_deref(), Some("CAUQAA"));

        let thread = &parsed.items[0];
        assert_eq!(thread.snippet.top_level_comment.id, "comment1");
        assert_eq!(thread.snippet.top_level_comment.snippet.like_count, 5);
        assert_eq!(
            thread.snippet.top_level_comment.snippet.author_channel(),
            "UC_viewer"
        );
        let replies = thread.replies.as_ref().unwrap();
        assert_eq!(replies.comments[0].snippet.author_channel(), "UC_owner");
    }

    #[test]
    fn error_envelope_reason_extraction() {
        let body = serde_json::json!({
            "error": {
                "code": 403,
                "message": "The video identified by videoId has disabled comments.",
                "errors": [{"reason": "commentsDisabled"}]
            }
        });
        let parsed: ErrorEnvelope = serde_json::from_value(body).unwrap();
        assert_eq!(parsed.error.code, 403);
        assert_eq!(parsed.error.errors[0].reason, "commentsDisabled");
    }

    #[test]
    fn thumbnail_prefers_medium_over_default() {
        let mut thumbs = HashMap::new();
        thumbs.insert(
            "default".to_string(),
            Thumbnail {
                url: "http://example.com/default.jpg".into(),
            },
        );
        assert_eq!(pick_thumbnail(&thumbs), "http://example.com/default.jpg");

        thumbs.insert(
            "medium".to_string(),
            Thumbnail {
                url: "http://example.com/medium.jpg".into(),
            },
        );
        assert_eq!(pick_thumbnail(&thumbs), "http://example.com/medium.jpg");
    }
}
