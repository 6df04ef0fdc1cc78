// src/store.rs
//
// Single persistence interface over Postgres: OAuth tokens, the
// append-only reply log, usage accounting and the thread-state annotation
// layer. All remote comment data stays in the YouTube API; only local
// annotations and logs live here.

use std::collections::HashSet;

use async_trait::async_trait;
use axum::extract::FromRef;
use sqlx::PgPool;

use crate::error::AppError;
use crate::models::reply_log::{FewShotExample, TokenUsage};
use crate::models::user::UserTokens;
use crate::state::AppState;

/// Number of few-shot examples fed to the composer.
pub const FEW_SHOT_LIMIT: i64 = 3;

/// The slice of the store touched by post-reply bookkeeping. A seam so
/// the clear-marker-then-log sequence can be driven without Postgres.
#[async_trait]
pub trait ReplyJournal: Send + Sync {
    async fn clear_thread_state(&self, user_id: &str, comment_id: &str) -> Result<(), AppError>;

    async fn append_reply_log(
        &self,
        user_id: &str,
        video_id: &str,
        comment_id: &str,
        original_comment: &str,
        ai_suggestion: Option<&str>,
        final_reply: &str,
    ) -> Result<(), AppError>;
}

#[derive(Clone)]
pub struct Store {
    pool: PgPool,
}

impl FromRef<AppState> for Store {
    fn from_ref(state: &AppState) -> Self {
        Store {
            pool: state.pool.clone(),
        }
    }
}

impl Store {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // -- Token store --------------------------------------------------------

    pub async fn get_user(&self, user_id: &str) -> Result<Option<UserTokens>, AppError> {
        let user = sqlx::query_as::<_, UserTokens>(
            r#"
            SELECT user_id, channel_id, access_token, refresh_token,
                   token_expiry, created_at, updated_at
            FROM user_tokens
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Upserts the credential pair for a user. A missing refresh token on
    /// re-consent keeps the previously stored one.
    pub async fn save_user_tokens(
        &self,
        user_id: &str,
        channel_id: &str,
        access_token: &str,
        refresh_token: Option<&str>,
        token_expiry: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO user_tokens (user_id, channel_id, access_token, refresh_token, token_expiry)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id) DO UPDATE SET
                channel_id = EXCLUDED.channel_id,
                access_token = EXCLUDED.access_token,
                refresh_token = COALESCE(EXCLUDED.refresh_token, user_tokens.refresh_token),
                token_expiry = EXCLUDED.token_expiry,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(channel_id)
        .bind(access_token)
        .bind(refresh_token)
        .bind(token_expiry)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn delete_user(&self, user_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM user_tokens WHERE user_id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // -- Reply log ----------------------------------------------------------

    /// Appends a posted reply to the log. `is_edited` records whether the
    /// owner changed the AI suggestion; a reply without any suggestion
    /// counts as edited (fully manual).
    pub async fn append_reply_log(
        &self,
        user_id: &str,
        video_id: &str,
        comment_id: &str,
        original_comment: &str,
        ai_suggestion: Option<&str>,
        final_reply: &str,
    ) -> Result<(), AppError> {
        let is_edited = match ai_suggestion {
            Some(suggestion) => suggestion != final_reply,
            None => true,
        };

        sqlx::query(
            r#"
            INSERT INTO reply_logs
                (user_id, video_id, comment_id, original_comment, ai_suggestion, final_reply, is_edited)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(user_id)
        .bind(video_id)
        .bind(comment_id)
        .bind(original_comment)
        .bind(ai_suggestion)
        .bind(final_reply)
        .bind(is_edited)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Most recent *edited* replies, newest first. Only rows where the
    /// owner corrected the model carry style signal worth imitating.
    pub async fn few_shot_examples(&self, user_id: &str) -> Result<Vec<FewShotExample>, AppError> {
        let examples = sqlx::query_as::<_, FewShotExample>(
            r#"
            SELECT original_comment, final_reply
            FROM reply_logs
            WHERE user_id = $1 AND is_edited = TRUE
            ORDER BY created_at DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(FEW_SHOT_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(examples)
    }

    /// Replies posted in the trailing 24 hours.
    pub async fn daily_reply_count(&self, user_id: &str) -> Result<i64, AppError> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*)
            FROM reply_logs
            WHERE user_id = $1 AND created_at >= NOW() - INTERVAL '1 day'
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    pub async fn log_usage(&self, user_id: &str, usage: &TokenUsage) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO usage_logs (user_id, input_tokens, output_tokens, model_name)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user_id)
        .bind(usage.input_tokens)
        .bind(usage.output_tokens)
        .bind(&usage.model_name)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // -- Thread states ------------------------------------------------------

    /// Marks a thread as handled. Re-marking an already marked thread is a
    /// no-op thanks to the conflict clause.
    pub async fn mark_thread_complete(
        &self,
        user_id: &str,
        comment_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO thread_states (user_id, comment_id, status)
            VALUES ($1, $2, 'completed')
            ON CONFLICT (user_id, comment_id) DO UPDATE SET
                status = EXCLUDED.status,
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(comment_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Removes a thread's local marker. Deleting an absent marker is a
    /// no-op, which makes the post-reply cleanup safe to call blindly.
    pub async fn clear_thread_state(&self, user_id: &str, comment_id: &str) -> Result<(), AppError> {
        sqlx::query("DELETE FROM thread_states WHERE user_id = $1 AND comment_id = $2")
            .bind(user_id)
            .bind(comment_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// All comment ids the user marked completed. Fetched once per
    /// classification call, not per thread.
    pub async fn completed_threads(&self, user_id: &str) -> Result<HashSet<String>, AppError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT comment_id FROM thread_states WHERE user_id = $1 AND status = 'completed'",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}

#[async_trait]
impl ReplyJournal for Store {
    async fn clear_thread_state(&self, user_id: &str, comment_id: &str) -> Result<(), AppError> {
        Store::clear_thread_state(self, user_id, comment_id).await
    }

    async fn append_reply_log(
        &self,
        user_id: &str,
        video_id: &str,
        comment_id: &str,
        original_comment: &str,
        ai_suggestion: Option<&str>,
        final_reply: &str,
    ) -> Result<(), AppError> {
        Store::append_reply_log(
            self,
            user_id,
            video_id,
            comment_id,
            original_comment,
            ai_suggestion,
            final_reply,
        )
        .await
    }
}
