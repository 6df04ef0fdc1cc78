// src/services/ai.rs
//
// Reply composer: builds the generation prompt from the live comment, the
// owner's edited-reply history and a fixed safety policy, then parses the
// model output into at most three suggestions.

use serde::{Deserialize, Serialize};

use crate::models::reply_log::{FewShotExample, TokenUsage};

/// Sampling temperature for reply generation.
const TEMPERATURE: f32 = 0.7;

/// Maximum number of suggestions returned to the caller.
const MAX_SUGGESTIONS: usize = 3;

const DEFAULT_TONE_INSTRUCTION: &str = "Use a friendly, approachable tone, \
always close with a brief word of thanks, and include exactly one emoji.";

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

// ---------------------------------------------------------------------------
// Gemini generateContent wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<i32>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<i32>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Client for the Gemini text-generation endpoint.
///
/// The composer never raises: any internal failure is converted into a
/// single synthetic error suggestion so callers always get a displayable
/// list.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_base: String,
    api_key: Option<String>,
    model: String,
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_key: Option<String>, model: String) -> Self {
        Self {
            http,
            api_base: GEMINI_API_BASE.to_string(),
            api_key,
            model,
        }
    }

    /// Points the client at an alternative base URL. Used by tests.
    pub fn with_base_url(
        http: reqwest::Client,
        api_base: &str,
        api_key: Option<String>,
        model: String,
    ) -> Self {
        Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
            model,
        }
    }

    /// Generates up to three reply suggestions for a viewer comment.
    ///
    /// Returns the suggestions plus token accounting when generation
    /// succeeded; on any failure the list contains one error message and
    /// the usage is `None`.
    pub async fn suggest_replies(
        &self,
        comment_text: &str,
        custom_instruction: Option<&str>,
        examples: &[FewShotExample],
    ) -> (Vec<String>, Option<TokenUsage>) {
        let Some(api_key) = self.api_key.as_deref() else {
            return (vec!["Error: GEMINI_API_KEY not set.".to_string()], None);
        };

        let prompt = build_prompt(comment_text, custom_instruction, examples);

        match self.generate(api_key, &prompt).await {
            Ok((text, usage)) => {
                let suggestions = parse_suggestions(&text);
                (suggestions, usage)
            }
            Err(e) => {
                tracing::error!("Gemini API error: {}", e);
                (vec![format!("Error generating reply: {}", e)], None)
            }
        }
    }

    async fn generate(
        &self,
        api_key: &str,
        prompt: &str,
    ) -> Result<(String, Option<TokenUsage>), String> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.api_base, self.model
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let response = self
            .http
            .post(&url)
            .query(&[("key", api_key)])
            .json(&request)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("{}: {}", status, body));
        }

        let parsed: GenerateContentResponse =
            response.json().await.map_err(|e| e.to_string())?;

        let text = parsed
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .and_then(|c| c.parts.first())
            .and_then(|p| p.text.clone())
            .ok_or_else(|| "empty response from model".to_string())?;

        let usage = parsed.usage_metadata.map(|u| TokenUsage {
            input_tokens: u.prompt_token_count.unwrap_or(0),
            output_tokens: u.candidates_token_count.unwrap_or(0),
            model_name: self.model.clone(),
        });

        Ok((text, usage))
    }
}

/// Assembles the full generation prompt.
pub fn build_prompt(
    comment_text: &str,
    custom_instruction: Option<&str>,
    examples: &[FewShotExample],
) -> String {
    let instruction = custom_instruction.unwrap_or(DEFAULT_TONE_INSTRUCTION);

    let examples_block = if examples.is_empty() {
        "(No training data: act as a generally friendly, approachable YouTuber.)\n".to_string()
    } else {
        let mut block = String::from(
            "[Training data - ground truth for your voice]\n\
             Imitate the wording, emoji choice and sentence length of \"your reply\" in the \
             past exchanges below as closely as possible. Adapt the content to the new \
             comment, but copy the speech habits exactly.\n\n",
        );
        for (i, example) in examples.iter().enumerate() {
            block.push_str(&format!(
                "Example {}:\nViewer: {}\nYour reply: {}\n\n",
                i + 1,
                example.original_comment,
                example.final_reply
            ));
        }
        block
    };

    format!(
        "Role: you are the owner of a YouTube channel.\n\n\
         {examples_block}\n\
         [Safety policy - strictly enforced]\n\
         Never generate replies touching the following topics. If the comment falls into \
         one of them, suggest a bland greeting or suggest not replying at all.\n\
         1. Financial or investment advice (crypto, stocks, ...)\n\
         2. Violence, hate speech, discriminatory language\n\
         3. Links or solicitations to external sites\n\
         4. Mutual-subscription requests (sub4sub)\n\
         5. Probing for personal information\n\n\
         [Task]\n\
         For the viewer comment below, keep the learned voice and produce three replies \
         with distinct approaches.\n\n\
         Viewer comment: \"{comment_text}\"\n\n\
         [The three patterns]\n\
         1. Empathetic/thankful: deeply relate to the comment and express gratitude.\n\
         2. Question/engagement: ask a related follow-up question to keep the conversation going.\n\
         3. Short/witty: a brief, clever one-liner or reaction.\n\n\
         [Constraints]\n\
         - Output exactly three lines, each starting with \"- \".\n\
         - Each line contains only the reply text, no pattern names.\n\
         - No preamble or commentary.\n\
         - Additional instruction: {instruction}\n"
    )
}

/// Extracts bullet-prefixed suggestions from the raw model output.
///
/// Keeps at most three bullet lines; when no bullets are found but the
/// response has text, the whole text becomes the single suggestion.
pub fn parse_suggestions(raw: &str) -> Vec<String> {
    let mut suggestions: Vec<String> = raw
        .lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            trimmed
                .strip_prefix('-')
                .map(|rest| rest.trim().to_string())
        })
        .filter(|s| !s.is_empty())
        .collect();

    if suggestions.is_empty() && !raw.trim().is_empty() {
        suggestions.push(raw.trim().to_string());
    }

    suggestions.truncate(MAX_SUGGESTIONS);
    suggestions
}
