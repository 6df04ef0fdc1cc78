// src/handlers/generate.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::comment::GenerateRequest,
    services::ai::GeminiClient,
    store::Store,
    utils::jwt::Claims,
};

/// Generates up to three reply suggestions for a viewer comment.
///
/// Few-shot examples come from the user's edited reply log; fetching them
/// is best effort, and the composer itself never fails: the response
/// always carries a displayable suggestion list. Token usage is logged
/// when generation succeeded.
pub async fn generate_reply(
    State(store): State<Store>,
    State(ai): State<GeminiClient>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<GenerateRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let examples = match store.few_shot_examples(&claims.sub).await {
        Ok(examples) => examples,
        Err(e) => {
            tracing::warn!("Failed to fetch few-shot examples: {}", e);
            Vec::new()
        }
    };

    let (suggestions, usage) = ai
        .suggest_replies(&payload.comment, payload.instruction.as_deref(), &examples)
        .await;

    if let Some(usage) = usage {
        if let Err(e) = store.log_usage(&claims.sub, &usage).await {
            tracing::warn!("Failed to log token usage: {}", e);
        }
    }

    Ok(Json(json!({ "suggestions": suggestions })))
}
