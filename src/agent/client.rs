//! Gemini API client

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::agent::types::{Message, ModelResponse, Role, TokenUsage};
use crate::config::{GeminiConfig, SafetySetting};
use crate::core::ChatModel;
use crate::error::{Error, Result};

/// Gemini `generateContent` client
#[derive(Clone)]
pub struct GeminiClient {
    /// HTTP client
    client: Client,
    /// Configuration
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new Gemini client
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();

        let mut api_key = header::HeaderValue::from_str(config.api_key.expose_secret())
            .map_err(|e| Error::Config(format!("Invalid API key format: {}", e)))?;
        api_key.set_sensitive(true);
        headers.insert("x-goog-api-key", api_key);

        let mut builder = Client::builder().default_headers(headers);
        if config.timeout_secs > 0 {
            builder = builder.timeout(std::time::Duration::from_secs(config.timeout_secs));
        }
        let client = builder.build()?;

        Ok(GeminiClient { client, config })
    }

    /// Model identifier used in the request path
    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn build_request<'a>(&'a self, messages: &'a [Message]) -> GenerateContentRequest<'a> {
        let contents = messages
            .iter()
            .map(|m| Content {
                role: m.role,
                parts: vec![TextPart { text: &m.content }],
            })
            .collect();

        let generation_config =
            if self.config.temperature.is_some() || self.config.max_output_tokens.is_some() {
                Some(GenerationConfig {
                    temperature: self.config.temperature,
                    max_output_tokens: self.config.max_output_tokens,
                })
            } else {
                None
            };

        GenerateContentRequest {
            contents,
            safety_settings: &self.config.safety_settings,
            generation_config,
        }
    }
}

#[async_trait]
impl ChatModel for GeminiClient {
    fn model_label(&self) -> &str {
        &self.config.model_label
    }

    async fn converse(&self, messages: &[Message]) -> Result<ModelResponse> {
        if messages.is_empty() {
            return Err(Error::InvalidInput(
                "at least one message is required".to_string(),
            ));
        }

        let request = self.build_request(messages);
        debug!(
            model = %self.config.model,
            messages = messages.len(),
            "Sending request to Gemini"
        );

        let response = self
            .client
            .post(self.endpoint())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::BackendUnavailable(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(%status, "Gemini returned an error");

            return Err(
                if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    Error::BackendUnavailable(format!("API error ({}): {}", status, error_text))
                } else {
                    Error::BackendRejected(format!("API error ({}): {}", status, error_text))
                },
            );
        }

        let body: GenerateContentResponse = response.json().await.map_err(|e| {
            if e.is_decode() {
                Error::BackendRejected(format!("malformed response: {}", e))
            } else {
                Error::BackendUnavailable(format!("failed to read response: {}", e))
            }
        })?;

        let result = flatten_response(body)?;
        info!(
            model = %self.config.model,
            input_tokens = result.usage.input_tokens,
            output_tokens = result.usage.output_tokens,
            finish_reason = %result.finish_reason,
            "Gemini response"
        );

        Ok(result)
    }
}

/// Reduce the nested response to text, usage and finish reason
fn flatten_response(body: GenerateContentResponse) -> Result<ModelResponse> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        warn!(%reason, "Prompt blocked by Gemini");
        return Err(Error::BackendRejected(format!("prompt blocked: {}", reason)));
    }

    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::BackendRejected("response contained no candidates".to_string()))?;

    let finish_reason = candidate
        .finish_reason
        .unwrap_or_else(|| "FINISH_REASON_UNSPECIFIED".to_string());

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(Error::BackendRejected(format!(
            "candidate contained no text (finish reason: {})",
            finish_reason
        )));
    }

    let usage = body.usage_metadata.unwrap_or_default();
    let total_tokens = if usage.total_token_count > 0 {
        usage.total_token_count
    } else {
        usage.prompt_token_count.saturating_add(usage.candidates_token_count)
    };

    Ok(ModelResponse {
        text,
        usage: TokenUsage {
            input_tokens: usage.prompt_token_count,
            output_tokens: usage.candidates_token_count,
            total_tokens,
        },
        finish_reason,
    })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    safety_settings: &'a [SafetySetting],
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: Role,
    parts: Vec<TextPart<'a>>,
}

#[derive(Debug, Serialize)]
struct TextPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}
