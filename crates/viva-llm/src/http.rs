//! OpenAI-compatible HTTP adapter.
//!
//! Talks to any `/v1/chat/completions`-shaped backend with JSON response
//! mode. One request per operation, bounded by the configured timeout.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::client::LlmClient;
use crate::errors::{LlmError, Result};
use crate::prompts;
use crate::types::{AnswerAssessment, EvaluationRequest, GeneratedQuestion, GenerationRequest};

/// Configuration for the OpenAI-compatible adapter.
#[derive(Clone, Debug)]
pub struct OpenAiConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    /// Bearer token.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".into(),
            api_key: String::new(),
            model: "gpt-4o-mini".into(),
            timeout_ms: 30_000,
        }
    }
}

/// [`LlmClient`] implementation over an OpenAI-compatible chat API.
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OpenAiClient {
    /// Build a client from config. Fails only if the underlying HTTP client
    /// cannot be constructed.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self { http, config })
    }

    #[instrument(skip_all, fields(model = %self.config.model))]
    async fn chat(&self, system: &str, user: &str, json_mode: bool) -> Result<String> {
        let body = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            response_format: json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        };

        let response = self
            .http
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        timeout_ms: self.config.timeout_ms,
                    }
                } else {
                    LlmError::Http(e)
                }
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("no choices in response".into()))?;
        debug!(chars = content.len(), "chat completion received");
        Ok(content)
    }
}

/// Strip a Markdown code fence if the model wrapped its JSON in one.
fn strip_fence(content: &str) -> &str {
    let trimmed = content.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map_or(trimmed, str::trim)
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate_question(&self, request: &GenerationRequest) -> Result<GeneratedQuestion> {
        let content = self
            .chat(prompts::QUESTION_SYSTEM, &prompts::question_prompt(request), true)
            .await?;
        serde_json::from_str(strip_fence(&content))
            .map_err(|e| LlmError::InvalidResponse(format!("question JSON: {e}")))
    }

    async fn generate_ideal_answer(&self, question_text: &str) -> Result<String> {
        self.chat(
            "You are an expert technical interviewer.",
            &prompts::ideal_answer_prompt(question_text),
            false,
        )
        .await
    }

    async fn generate_rationale(&self, question_text: &str, ideal_answer: &str) -> Result<String> {
        self.chat(
            "You are an expert technical interviewer.",
            &prompts::rationale_prompt(question_text, ideal_answer),
            false,
        )
        .await
    }

    async fn evaluate_answer(&self, request: &EvaluationRequest) -> Result<AnswerAssessment> {
        let content = self
            .chat(
                prompts::EVALUATION_SYSTEM,
                &prompts::evaluation_prompt(request),
                true,
            )
            .await?;
        serde_json::from_str(strip_fence(&content))
            .map_err(|e| LlmError::InvalidResponse(format!("assessment JSON: {e}")))
    }
}
