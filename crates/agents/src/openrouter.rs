//! OpenRouter chat-completions client (OpenAI-compatible wire format).

use crate::error::{error_details, send_error, truncate_for_error, AiError, AiResult};
use crate::provider::CompletionProvider;
use async_trait::async_trait;
use media_core::config::OpenRouterConfig;
use media_reporting::AnalysisSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const PROVIDER: &str = "OpenRouter AI";

/// Model ids offered for selection. Any other OpenRouter id is accepted too.
pub const KNOWN_OPENROUTER_MODELS: [&str; 6] = [
    "openai/gpt-3.5-turbo",
    "openai/gpt-4o-mini",
    "google/gemini-flash-1.5",
    "mistralai/mistral-7b-instruct",
    "meta-llama/llama-3-8b-instruct",
    "deepseek/deepseek-chat",
];

pub struct OpenRouterClient {
    config: OpenRouterConfig,
    api_key: String,
    http: reqwest::Client,
}

impl OpenRouterClient {
    pub fn new(config: OpenRouterConfig) -> AiResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AiError::MissingApiKey("OpenRouter"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AiError::Request {
                provider: PROVIDER,
                message: format!("failed to build http client: {e}"),
            })?;

        Ok(Self {
            config,
            api_key,
            http,
        })
    }
}

#[async_trait]
impl CompletionProvider for OpenRouterClient {
    fn source(&self) -> AnalysisSource {
        AnalysisSource::OpenRouter
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete_json(&self, prompt: &str) -> AiResult<String> {
        let payload = ChatCompletionsRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        debug!(model = %self.config.model, prompt_len = prompt.len(), "Sending OpenRouter request");

        let response = self
            .http
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.config.referer)
            .header("X-Title", &self.config.title)
            .json(&payload)
            .send()
            .await
            .map_err(|e| send_error(PROVIDER, e, self.config.timeout_secs))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| AiError::Request {
            provider: PROVIDER,
            message: format!("failed to read response body: {e}"),
        })?;

        if !status.is_success() {
            warn!(status = status.as_u16(), "OpenRouter returned an error status");
            return Err(AiError::Http {
                provider: PROVIDER,
                status: status.as_u16(),
                details: error_details(&body),
            });
        }

        let parsed: ChatCompletionsResponse = serde_json::from_str(&body).map_err(|e| {
            AiError::MalformedResponse(format!(
                "invalid JSON from OpenRouter: {e} (body={})",
                truncate_for_error(&body)
            ))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| {
                AiError::MalformedResponse(
                    "OpenRouter response had no message content".to_string(),
                )
            })
    }
}

#[derive(Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    response_format: ResponseFormat,
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
struct ChatCompletionsResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: Option<String>,
}
