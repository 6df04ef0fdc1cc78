use serde::{Deserialize, Serialize};
use validator::Validate;

/// Reply status of a comment thread. Every thread lands in exactly one
/// bucket; an actual reply from the channel owner always wins over a
/// local "marked complete" annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplyStatus {
    Unreplied,
    Pending,
    Replied,
}

/// A top-level comment on a video, together with its inline replies and
/// the derived classification state.
#[derive(Debug, Clone, Serialize)]
pub struct CommentThread {
    /// ID of the top-level comment (not the thread resource ID); replies
    /// and ratings are addressed against this.
    pub id: String,
    pub video_id: String,
    pub text: String,
    pub author_id: String,
    pub author_name: String,
    pub author_image: String,
    pub published_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
    pub like_count: i64,
    /// The authenticated viewer's own rating: 'like', 'dislike' or 'none'.
    pub viewer_rating: String,
    pub total_reply_count: i64,
    pub replies: Vec<Reply>,
    pub status: ReplyStatus,
    /// True when the commenter edited their comment after posting.
    pub is_edited: bool,
}

/// An inline reply within a comment thread.
#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub id: String,
    pub text: String,
    pub author_id: String,
    pub author_name: String,
    pub author_image: String,
    pub published_at: chrono::DateTime<chrono::Utc>,
    /// Whether this reply was written by the channel owner.
    pub is_mine: bool,
}

/// Aggregate reply statistics for a set of threads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CommentStats {
    pub total: usize,
    pub replied: usize,
    pub pending: usize,
    pub unreplied: usize,
    /// Reply rate in whole percent, truncated (1 of 3 replied -> 33).
    pub rate: u32,
}

/// A fully classified comment listing: buckets concatenated in fixed
/// presentation order (unreplied, pending, replied) plus stats.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentPage {
    pub comments: Vec<CommentThread>,
    pub stats: CommentStats,
}

/// Within-bucket sort order requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CommentSort {
    #[default]
    DateDesc,
    DateAsc,
    LikesDesc,
}

impl CommentSort {
    /// Unknown or missing sort keys fall back to newest-first.
    pub fn parse(key: Option<&str>) -> Self {
        match key {
            Some("date_asc") => CommentSort::DateAsc,
            Some("likes_desc") => CommentSort::LikesDesc,
            _ => CommentSort::DateDesc,
        }
    }
}

/// DTO for generating reply suggestions for a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, max = 10000, message = "Comment must not be empty"))]
    pub comment: String,

    /// Optional style instruction overriding the default tone.
    #[validate(length(max = 1000))]
    pub instruction: Option<String>,
}

/// DTO for posting a reply to a top-level comment.
#[derive(Debug, Deserialize, Validate)]
pub struct PostReplyRequest {
    #[validate(length(min = 1, message = "parent_id is required"))]
    pub parent_id: String,

    #[validate(length(min = 1, max = 10000, message = "Reply text must not be empty"))]
    pub reply_text: String,

    /// Video the comment belongs to, kept for the reply log.
    #[serde(default)]
    pub video_id: String,

    /// Original comment text, kept for the reply log.
    #[serde(default)]
    pub original_comment: String,

    /// The AI suggestion the user started from, if any. Compared against
    /// `reply_text` to decide whether the reply counts as edited.
    pub ai_suggestion: Option<String>,
}

/// DTO for deleting a comment.
#[derive(Debug, Deserialize, Validate)]
pub struct DeleteCommentRequest {
    #[validate(length(min = 1, message = "comment_id is required"))]
    pub comment_id: String,
}

/// DTO for rating a comment: 'like', 'dislike' or 'none'.
#[derive(Debug, Deserialize, Validate)]
pub struct RateCommentRequest {
    #[validate(length(min = 1, message = "comment_id is required"))]
    pub comment_id: String,

    #[validate(custom(function = validate_rating))]
    pub rating: String,
}

fn validate_rating(rating: &str) -> Result<(), validator::ValidationError> {
    match rating {
        "like" | "dislike" | "none" => Ok(()),
        _ => Err(validator::ValidationError::new("invalid_rating")),
    }
}

/// DTO for marking or unmarking a thread as handled.
#[derive(Debug, Deserialize, Validate)]
pub struct ThreadStateRequest {
    #[validate(length(min = 1, message = "comment_id is required"))]
    pub comment_id: String,
}

/// Query parameters for the comment listing endpoint.
#[derive(Debug, Deserialize)]
pub struct CommentListParams {
    pub sort: Option<String>,
}
