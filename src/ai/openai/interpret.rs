//! OpenAI implementation of the dream interpretation call.

use super::client::OpenAiHttpClient;
use super::types::{ChatCompletionRequest, ChatMessage, JsonSchema, ResponseFormat};
use crate::ai::InterpretationService;
use crate::models::{Config, DreamRequest, Interpretation};
use crate::{prompts, Error, Result};
use async_trait::async_trait;
use std::time::Duration;

const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 2000;

pub struct OpenAiInterpretationClient {
    http: OpenAiHttpClient,
    model: String,
    max_completion_tokens: u32,
}

impl OpenAiInterpretationClient {
    pub fn new(api_key: String, model: String) -> Self {
        Self::new_with_client(api_key, model, reqwest::Client::new())
    }

    pub fn new_with_client(api_key: String, model: String, client: reqwest::Client) -> Self {
        Self {
            http: OpenAiHttpClient::new_with_client(api_key, Duration::from_secs(60), client),
            model,
            max_completion_tokens: DEFAULT_MAX_COMPLETION_TOKENS,
        }
    }

    /// Build a client from runtime configuration. Fails when no API key is set.
    pub fn from_config(config: &Config, client: reqwest::Client) -> Result<Self> {
        let api_key = config.require_api_key()?.to_string();
        Ok(Self {
            http: OpenAiHttpClient::new_with_client(api_key, config.timeout, client)
                .with_base_url(config.base_url.clone()),
            model: config.model.clone(),
            max_completion_tokens: config.max_completion_tokens,
        })
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.http = self.http.with_base_url(base_url);
        self
    }

    pub fn with_max_completion_tokens(mut self, max_completion_tokens: u32) -> Self {
        self.max_completion_tokens = max_completion_tokens;
        self
    }

    fn build_request(&self, request: &DreamRequest) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(prompts::INTERPRET_SYSTEM),
                ChatMessage::user(prompts::interpret_user(request)),
            ],
            max_completion_tokens: self.max_completion_tokens,
            response_format: Some(ResponseFormat {
                format_type: "json_schema".to_string(),
                json_schema: JsonSchema {
                    name: "dream_interpretation".to_string(),
                    schema: interpretation_schema(),
                    strict: true,
                },
            }),
        }
    }
}

#[async_trait]
impl InterpretationService for OpenAiInterpretationClient {
    async fn interpret(&self, request: &DreamRequest) -> Result<Interpretation> {
        request.validate()?;

        tracing::debug!(
            "Requesting interpretation ({} chars, mood: {}, {} tags)",
            request.dream_text.len(),
            request.mood.is_some(),
            request.tags.len()
        );

        let response = self.http.chat_completion(&self.build_request(request)).await?;

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or_else(|| Error::Decoding("No content in OpenAI chat response".to_string()))?;

        parse_interpretation(content)
    }
}

/// Decode completion content into an [`Interpretation`].
///
/// Accepts content wrapped in a Markdown code fence. Any upstream
/// `dreamParentId` is discarded.
pub fn parse_interpretation(content: &str) -> Result<Interpretation> {
    let json = strip_code_fence(content);
    let mut interpretation: Interpretation = serde_json::from_str(json).map_err(|e| {
        tracing::error!("Interpretation content did not match shape: {}", e);
        Error::Decoding(format!("Invalid interpretation payload: {}", e))
    })?;
    interpretation.dream_parent_id = None;
    Ok(interpretation)
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the optional language tag on the opening fence line.
    let body = match rest.find('\n') {
        Some(idx) => &rest[idx + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

fn interpretation_schema() -> serde_json::Value {
    let string = serde_json::json!({ "type": "string" });
    serde_json::json!({
        "type": "object",
        "properties": {
            "dreamTitle": string,
            "dreamSummary": string,
            "fullInterpretation": string,
            "moodInsights": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "emoji": string,
                        "label": string,
                        "score": { "type": "number", "description": "Strength between 0 and 1" }
                    },
                    "required": ["emoji", "label", "score"],
                    "additionalProperties": false
                }
            },
            "symbolism": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": { "icon": string, "meaning": string },
                    "required": ["icon", "meaning"],
                    "additionalProperties": false
                }
            },
            "reflectionPrompts": { "type": "array", "items": string },
            "quote": {
                "type": "object",
                "properties": { "text": string, "author": string },
                "required": ["text", "author"],
                "additionalProperties": false
            },
            "tags": { "type": "array", "items": string }
        },
        "required": [
            "dreamTitle",
            "dreamSummary",
            "fullInterpretation",
            "moodInsights",
            "symbolism",
            "reflectionPrompts",
            "quote",
            "tags"
        ],
        "additionalProperties": false
    })
}
