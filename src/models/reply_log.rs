use serde::Serialize;
use sqlx::FromRow;

/// An (input, output) pair fed to the composer as a style example.
/// Sourced from edited reply-log rows only: those are the ones where the
/// owner corrected the model, so they carry the most signal.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FewShotExample {
    pub original_comment: String,
    pub final_reply: String,
}

/// Token accounting returned by the generation backend, persisted to
/// 'usage_logs' for cost tracking.
#[derive(Debug, Clone, Serialize)]
pub struct TokenUsage {
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub model_name: String,
}
