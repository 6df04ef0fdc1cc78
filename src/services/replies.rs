// src/services/replies.rs
//
// Post-reply bookkeeping: clearing the local pending marker and feeding
// the reply log that powers the composer's few-shot examples.

use crate::store::ReplyJournal;

/// Runs the bookkeeping that follows a successfully posted reply.
///
/// By the time this runs the reply is already live on YouTube, so both
/// steps are best effort: a failed marker cleanup or log append is logged
/// and swallowed rather than turned into an error for an action that
/// succeeded. Clearing an absent marker is a no-op.
pub async fn record_posted_reply(
    journal: &dyn ReplyJournal,
    user_id: &str,
    video_id: &str,
    parent_id: &str,
    original_comment: &str,
    ai_suggestion: Option<&str>,
    final_reply: &str,
) {
    if let Err(e) = journal.clear_thread_state(user_id, parent_id).await {
        tracing::warn!("Failed to clear pending marker for {}: {}", parent_id, e);
    }

    if let Err(e) = journal
        .append_reply_log(
            user_id,
            video_id,
            parent_id,
            original_comment,
            ai_suggestion,
            final_reply,
        )
        .await
    {
        tracing::warn!("Failed to append reply log: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// In-memory journal: a marker set plus an append-only log.
    struct FakeJournal {
        markers: Mutex<HashSet<String>>,
        log: Mutex<Vec<(String, String)>>,
        fail_clear: bool,
    }

    impl FakeJournal {
        fn with_markers(markers: &[&str]) -> Self {
            Self {
                markers: Mutex::new(markers.iter().map(|m| m.to_string()).collect()),
                log: Mutex::new(Vec::new()),
                fail_clear: false,
            }
        }
    }

    #[async_trait]
    impl ReplyJournal for FakeJournal {
        async fn clear_thread_state(
            &self,
            _user_id: &str,
            comment_id: &str,
        ) -> Result<(), AppError> {
            if self.fail_clear {
                return Err(AppError::InternalServerError("marker store down".into()));
            }
            // Removing an absent marker succeeds, like the blind DELETE.
            self.markers.lock().unwrap().remove(comment_id);
            Ok(())
        }

        async fn append_reply_log(
            &self,
            _user_id: &str,
            _video_id: &str,
            comment_id: &str,
            _original_comment: &str,
            _ai_suggestion: Option<&str>,
            final_reply: &str,
        ) -> Result<(), AppError> {
            self.log
                .lock()
                .unwrap()
                .push((comment_id.to_string(), final_reply.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn posting_clears_the_pending_marker() {
        let journal = FakeJournal::with_markers(&["c1", "c2"]);

        record_posted_reply(&journal, "UC_owner", "vid1", "c1", "hi", None, "thanks!").await;

        let markers = journal.markers.lock().unwrap();
        assert!(!markers.contains("c1"));
        assert!(markers.contains("c2"));
        assert_eq!(journal.log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn posting_without_a_marker_still_logs() {
        let journal = FakeJournal::with_markers(&[]);

        record_posted_reply(&journal, "UC_owner", "vid1", "c1", "hi", None, "thanks!").await;

        assert!(journal.markers.lock().unwrap().is_empty());
        let log = journal.log.lock().unwrap();
        assert_eq!(log.as_slice(), &[("c1".to_string(), "thanks!".to_string())]);
    }

    #[tokio::test]
    async fn marker_cleanup_failure_does_not_block_the_log() {
        let mut journal = FakeJournal::with_markers(&["c1"]);
        journal.fail_clear = true;

        record_posted_reply(&journal, "UC_owner", "vid1", "c1", "hi", Some("thanks!"), "thanks!")
            .await;

        // The marker survived, the log entry did not get lost.
        assert!(journal.markers.lock().unwrap().contains("c1"));
        assert_eq!(journal.log.lock().unwrap().len(), 1);
    }
}
