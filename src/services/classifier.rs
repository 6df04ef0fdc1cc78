// src/services/classifier.rs
//
// Comment-thread classification: turns paginated commentThreads listings
// into unreplied / pending / replied buckets with aggregate stats.

use std::collections::HashSet;

use crate::models::comment::{
    CommentPage, CommentSort, CommentStats, CommentThread, Reply, ReplyStatus,
};
use crate::services::youtube::{CommentSource, ThreadResource, YouTubeError};

/// Options for one classification pass.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassifyOptions {
    pub sort: CommentSort,

    /// Upper bound on listing pages fetched (100 threads per page). Used to
    /// cap quota cost when only an approximate status summary is needed;
    /// `None` pages until the listing is exhausted.
    pub max_pages: Option<usize>,
}

/// Fetches and classifies every comment thread of a video.
///
/// A `commentsDisabled` response from the listing yields an empty page with
/// zeroed stats. Any other remote error propagates; partial results are
/// never silently returned.
pub async fn video_comments(
    source: &dyn CommentSource,
    video_id: &str,
    owner_channel_id: &str,
    completed: &HashSet<String>,
    opts: ClassifyOptions,
) -> Result<CommentPage, YouTubeError> {
    let mut threads = Vec::new();
    let mut page_token: Option<String> = None;
    let mut page_count = 0usize;

    loop {
        if let Some(max) = opts.max_pages {
            if page_count >= max {
                break;
            }
        }

        let page = match source.page(video_id, page_token.as_deref()).await {
            Ok(page) => page,
            Err(YouTubeError::CommentsDisabled) => {
                tracing::debug!("Comments disabled for video {}", video_id);
                return Ok(CommentPage::default());
            }
            Err(e) => return Err(e),
        };
        page_count += 1;

        for item in page.items {
            if let Some(thread) = classify_thread(item, video_id, owner_channel_id, completed) {
                threads.push(thread);
            }
        }

        match page.next_page_token {
            Some(token) => page_token = Some(token),
            None => break,
        }
    }

    Ok(assemble(threads, opts.sort))
}

/// Converts one thread resource into a classified `CommentThread`.
///
/// Returns `None` for self-comments: a thread whose top-level author is the
/// channel owner is not a reply target and is skipped entirely.
pub fn classify_thread(
    item: ThreadResource,
    video_id: &str,
    owner_channel_id: &str,
    completed: &HashSet<String>,
) -> Option<CommentThread> {
    let top = item.snippet.top_level_comment;
    if top.snippet.author_channel() == owner_channel_id {
        return None;
    }

    let replies: Vec<Reply> = item
        .replies
        .map(|list| {
            list.comments
                .into_iter()
                .map(|reply| {
                    let is_mine = reply.snippet.author_channel() == owner_channel_id;
                    Reply {
                        id: reply.id,
                        text: reply.snippet.text_display,
                        author_id: reply
                            .snippet
                            .author_channel_id
                            .map(|c| c.value)
                            .unwrap_or_default(),
                        author_name: reply.snippet.author_display_name,
                        author_image: reply.snippet.author_profile_image_url,
                        published_at: reply.snippet.published_at,
                        is_mine,
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let replied_by_me = replies.iter().any(|r| r.is_mine);

    // Precedence: an actual reply from the owner always overrides a stale
    // local "completed" marker.
    let status = if replied_by_me {
        ReplyStatus::Replied
    } else if completed.contains(&top.id) {
        ReplyStatus::Pending
    } else {
        ReplyStatus::Unreplied
    };

    let published_at = top.snippet.published_at;
    let updated_at = top.snippet.updated_at.unwrap_or(published_at);

    Some(CommentThread {
        is_edited: updated_at != published_at,
        id: top.id,
        video_id: video_id.to_string(),
        text: top.snippet.text_display,
        author_id: top
            .snippet
            .author_channel_id
            .map(|c| c.value)
            .unwrap_or_default(),
        author_name: top.snippet.author_display_name,
        author_image: top.snippet.author_profile_image_url,
        published_at,
        updated_at,
        like_count: top.snippet.like_count,
        viewer_rating: top.snippet.viewer_rating.unwrap_or_else(|| "none".to_string()),
        total_reply_count: item.snippet.total_reply_count,
        replies,
        status,
    })
}

/// Buckets classified threads, sorts each bucket, concatenates the buckets
/// in fixed presentation order (unreplied, pending, replied) and computes
/// the aggregate stats.
pub fn assemble(threads: Vec<CommentThread>, sort: CommentSort) -> CommentPage {
    let mut unreplied = Vec::new();
    let mut pending = Vec::new();
    let mut replied = Vec::new();

    for thread in threads {
        match thread.status {
            ReplyStatus::Unreplied => unreplied.push(thread),
            ReplyStatus::Pending => pending.push(thread),
            ReplyStatus::Replied => replied.push(thread),
        }
    }

    sort_bucket(&mut unreplied, sort);
    sort_bucket(&mut pending, sort);
    sort_bucket(&mut replied, sort);

    let stats = CommentStats {
        total: unreplied.len() + pending.len() + replied.len(),
        replied: replied.len(),
        pending: pending.len(),
        unreplied: unreplied.len(),
        rate: reply_rate(replied.len(), unreplied.len() + pending.len() + replied.len()),
    };

    let mut comments = unreplied;
    comments.append(&mut pending);
    comments.append(&mut replied);

    CommentPage { comments, stats }
}

fn sort_bucket(bucket: &mut [CommentThread], sort: CommentSort) {
    match sort {
        CommentSort::DateDesc => {
            bucket.sort_by(|a, b| b.published_at.cmp(&a.published_at));
        }
        CommentSort::DateAsc => {
            bucket.sort_by(|a, b| a.published_at.cmp(&b.published_at));
        }
        CommentSort::LikesDesc => {
            bucket.sort_by(|a, b| b.like_count.cmp(&a.like_count));
        }
    }
}

/// Reply rate in whole percent, truncated toward zero; 0 for an empty set.
pub fn reply_rate(replied: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    (replied * 100 / total) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::youtube::ThreadPage;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    const OWNER: &str = "UC_owner";

    fn thread(
        id: &str,
        status: ReplyStatus,
        published_day: u32,
        like_count: i64,
    ) -> CommentThread {
        CommentThread {
            id: id.to_string(),
            video_id: "vid1".to_string(),
            text: format!("comment {}", id),
            author_id: "UC_viewer".to_string(),
            author_name: "Viewer".to_string(),
            author_image: String::new(),
            published_at: Utc.with_ymd_and_hms(2024, 3, published_day, 0, 0, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 3, published_day, 0, 0, 0).unwrap(),
            like_count,
            viewer_rating: "none".to_string(),
            total_reply_count: 0,
            replies: Vec::new(),
            status,
            is_edited: false,
        }
    }

    fn resource(id: &str, author: &str, reply_authors: &[&str]) -> ThreadResource {
        serde_json::from_value(serde_json::json!({
            "id": format!("thread_{}", id),
            "snippet": {
                "totalReplyCount": reply_authors.len(),
                "topLevelComment": {
                    "id": id,
                    "snippet": {
                        "authorChannelId": {"value": author},
                        "authorDisplayName": "someone",
                        "authorProfileImageUrl": "",
                        "textDisplay": "hello",
                        "likeCount": 0,
                        "publishedAt": "2024-03-01T00:00:00Z"
                    }
                }
            },
            "replies": {
                "comments": reply_authors.iter().enumerate().map(|(i, a)| serde_json::json!({
                    "id": format!("{}_r{}", id, i),
                    "snippet": {
                        "authorChannelId": {"value": a},
                        "authorDisplayName": "replier",
                        "authorProfileImageUrl": "",
                        "textDisplay": "re",
                        "publishedAt": "2024-03-02T00:00:00Z"
                    }
                })).collect::<Vec<_>>()
            }
        }))
        .unwrap()
    }

    /// Serves pre-canned pages; can also fail with a fixed error.
    struct FakeSource {
        pages: Mutex<Vec<Result<ThreadPage, YouTubeError>>>,
    }

    impl FakeSource {
        fn new(pages: Vec<Result<ThreadPage, YouTubeError>>) -> Self {
            Self {
                pages: Mutex::new(pages),
            }
        }
    }

    #[async_trait]
    impl CommentSource for FakeSource {
        async fn page(
            &self,
            _video_id: &str,
            _page_token: Option<&str>,
        ) -> Result<ThreadPage, YouTubeError> {
            self.pages.lock().unwrap().remove(0)
        }
    }

    #[test]
    fn owner_top_level_comment_is_skipped() {
        let item = resource("c1", OWNER, &[]);
        assert!(classify_thread(item, "vid1", OWNER, &HashSet::new()).is_none());
    }

    #[test]
    fn owner_reply_classifies_as_replied() {
        let item = resource("c1", "UC_viewer", &["UC_other", OWNER]);
        let thread = classify_thread(item, "vid1", OWNER, &HashSet::new()).unwrap();
        assert_eq!(thread.status, ReplyStatus::Replied);
        assert!(thread.replies[1].is_mine);
        assert!(!thread.replies[0].is_mine);
    }

    #[test]
    fn replied_wins_over_completed_marker() {
        let completed: HashSet<String> = ["c1".to_string()].into();
        let item = resource("c1", "UC_viewer", &[OWNER]);
        let thread = classify_thread(item, "vid1", OWNER, &completed).unwrap();
        assert_eq!(thread.status, ReplyStatus::Replied);
    }

    #[test]
    fn completed_marker_without_reply_is_pending() {
        let completed: HashSet<String> = ["c1".to_string()].into();
        let item = resource("c1", "UC_viewer", &["UC_other"]);
        let thread = classify_thread(item, "vid1", OWNER, &completed).unwrap();
        assert_eq!(thread.status, ReplyStatus::Pending);
    }

    #[test]
    fn no_reply_no_marker_is_unreplied() {
        let item = resource("c1", "UC_viewer", &[]);
        let thread = classify_thread(item, "vid1", OWNER, &HashSet::new()).unwrap();
        assert_eq!(thread.status, ReplyStatus::Unreplied);
    }

    #[test]
    fn buckets_concatenate_unreplied_pending_replied() {
        // Interleave statuses; the combined list must come out grouped.
        let threads = vec![
            thread("r1", ReplyStatus::Replied, 1, 0),
            thread("u1", ReplyStatus::Unreplied, 2, 0),
            thread("p1", ReplyStatus::Pending, 3, 0),
            thread("u2", ReplyStatus::Unreplied, 4, 0),
        ];
        let page = assemble(threads, CommentSort::DateAsc);
        let order: Vec<&str> = page.comments.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(order, vec!["u1", "u2", "p1", "r1"]);
    }

    #[test]
    fn date_desc_is_default_within_buckets() {
        let threads = vec![
            thread("old", ReplyStatus::Unreplied, 1, 0),
            thread("new", ReplyStatus::Unreplied, 5, 0),
        ];
        let page = assemble(threads, CommentSort::DateDesc);
        assert_eq!(page.comments[0].id, "new");
        assert_eq!(page.comments[1].id, "old");
    }

    #[test]
    fn likes_desc_orders_by_like_count() {
        let threads = vec![
            thread("few", ReplyStatus::Unreplied, 5, 2),
            thread("many", ReplyStatus::Unreplied, 1, 10),
        ];
        let page = assemble(threads, CommentSort::LikesDesc);
        assert_eq!(page.comments[0].id, "many");
    }

    #[test]
    fn unknown_sort_key_falls_back_to_date_desc() {
        assert_eq!(CommentSort::parse(Some("bogus")), CommentSort::DateDesc);
        assert_eq!(CommentSort::parse(None), CommentSort::DateDesc);
        assert_eq!(CommentSort::parse(Some("likes_desc")), CommentSort::LikesDesc);
    }

    #[test]
    fn reply_rate_truncates() {
        assert_eq!(reply_rate(1, 3), 33);
        assert_eq!(reply_rate(2, 3), 66);
        assert_eq!(reply_rate(0, 0), 0);
        assert_eq!(reply_rate(2, 5), 40);
    }

    #[tokio::test]
    async fn end_to_end_stats_across_buckets() {
        // 5 threads: 2 replied by owner, 1 marked complete, 2 untouched.
        let completed: HashSet<String> = ["c3".to_string()].into();
        let items = vec![
            resource("c1", "UC_viewer", &[OWNER]),
            resource("c2", "UC_viewer", &[OWNER]),
            resource("c3", "UC_viewer", &[]),
            resource("c4", "UC_viewer", &[]),
            resource("c5", "UC_viewer", &["UC_other"]),
        ];
        let source = FakeSource::new(vec![Ok(ThreadPage {
            items,
            next_page_token: None,
        })]);

        let page = video_comments(&source, "vid1", OWNER, &completed, ClassifyOptions::default())
            .await
            .unwrap();

        assert_eq!(page.stats.total, 5);
        assert_eq!(page.stats.replied, 2);
        assert_eq!(page.stats.pending, 1);
        assert_eq!(page.stats.unreplied, 2);
        assert_eq!(page.stats.rate, 40);
        assert_eq!(page.comments.len(), 5);
    }

    #[tokio::test]
    async fn comments_disabled_yields_empty_page() {
        let source = FakeSource::new(vec![Err(YouTubeError::CommentsDisabled)]);
        let page = video_comments(
            &source,
            "vid1",
            OWNER,
            &HashSet::new(),
            ClassifyOptions::default(),
        )
        .await
        .unwrap();

        assert!(page.comments.is_empty());
        assert_eq!(page.stats, CommentStats::default());
    }

    #[tokio::test]
    async fn other_api_errors_propagate() {
        let source = FakeSource::new(vec![Err(YouTubeError::Api {
            status: 500,
            reason: "backendError".to_string(),
            message: "boom".to_string(),
        })]);
        let result = video_comments(
            &source,
            "vid1",
            OWNER,
            &HashSet::new(),
            ClassifyOptions::default(),
        )
        .await;
        assert!(matches!(result, Err(YouTubeError::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn max_pages_caps_pagination() {
        let page1 = ThreadPage {
            items: vec![resource("c1", "UC_viewer", &[])],
            next_page_token: Some("page2".to_string()),
        };
        // A second fetch would panic (no more canned pages), so reaching
        // only the first page proves the cap held.
        let source = FakeSource::new(vec![Ok(page1)]);

        let page = video_comments(
            &source,
            "vid1",
            OWNER,
            &HashSet::new(),
            ClassifyOptions {
                sort: CommentSort::DateDesc,
                max_pages: Some(1),
            },
        )
        .await
        .unwrap();

        assert_eq!(page.stats.total, 1);
    }

    #[tokio::test]
    async fn pagination_follows_next_page_token() {
        let source = FakeSource::new(vec![
            Ok(ThreadPage {
                items: vec![resource("c1", "UC_viewer", &[])],
                next_page_token: Some("page2".to_string()),
            }),
            Ok(ThreadPage {
                items: vec![resource("c2", "UC_viewer", &[OWNER])],
                next_page_token: None,
            }),
        ]);

        let page = video_comments(
            &source,
            "vid1",
            OWNER,
            &HashSet::new(),
            ClassifyOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(page.stats.total, 2);
        assert_eq!(page.stats.unreplied, 1);
        assert_eq!(page.stats.replied, 1);
        assert_eq!(page.stats.rate, 50);
    }
}
