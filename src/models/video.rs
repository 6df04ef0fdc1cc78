use serde::{Deserialize, Serialize};

/// A channel upload with its statistics and best-effort analytics data.
#[derive(Debug, Clone, Serialize)]
pub struct Video {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
    pub published_at: chrono::DateTime<chrono::Utc>,
    pub view_count: u64,
    /// Estimated minutes watched, 0 when Analytics data was unavailable.
    pub watch_time_mins: u64,
    /// Average view duration in seconds, 0 when Analytics data was unavailable.
    pub avg_watch_time_sec: u64,
    /// Approximate unreplied comment count. Populated only for the
    /// unreplied_desc sort and capped at one page of threads per video.
    pub unreplied_count: usize,
}

/// Lightweight video lookup result for the comment listing page.
#[derive(Debug, Clone, Serialize)]
pub struct VideoDetails {
    pub id: String,
    pub title: String,
    pub thumbnail: String,
}

/// The owner channel's display info.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelInfo {
    pub name: String,
    pub icon: String,
    pub subscriber_count: u64,
}

/// Sort order for the video listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoSort {
    #[default]
    DateDesc,
    DateAsc,
    ViewsDesc,
    WatchTimeDesc,
    /// Most unreplied comments first. Quota-expensive: triggers a one-page
    /// classifier pass per video and caps the listing at 50 videos.
    UnrepliedDesc,
}

impl VideoSort {
    /// Unknown or missing sort keys fall back to newest-first.
    pub fn parse(key: Option<&str>) -> Self {
        match key {
            Some("date_asc") => VideoSort::DateAsc,
            Some("views_desc") => VideoSort::ViewsDesc,
            Some("watch_time_desc") => VideoSort::WatchTimeDesc,
            Some("unreplied_desc") => VideoSort::UnrepliedDesc,
            _ => VideoSort::DateDesc,
        }
    }
}

/// Query parameters for the video listing endpoint.
#[derive(Debug, Deserialize)]
pub struct VideoListParams {
    pub sort: Option<String>,

    /// Number of uploads to list (default: 200, capped at 50 for
    /// unreplied_desc).
    pub limit: Option<usize>,
}

/// Query parameters for the aggregated reply stats endpoint.
#[derive(Debug, Deserialize)]
pub struct ReplyStatsParams {
    /// How many recent videos to sample (default: 5).
    pub limit: Option<usize>,
}
