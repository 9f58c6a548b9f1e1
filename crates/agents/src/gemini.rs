//! Google Gemini `generateContent` client.

use crate::error::{error_details, send_error, truncate_for_error, AiError, AiResult};
use crate::provider::CompletionProvider;
use async_trait::async_trait;
use media_core::config::GeminiConfig;
use media_reporting::AnalysisSource;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

const PROVIDER: &str = "Gemini AI";

pub const KNOWN_GEMINI_MODELS: [&str; 3] =
    ["gemini-1.5-flash", "gemini-1.5-pro", "gemini-2.0-flash"];

pub struct GeminiClient {
    config: GeminiConfig,
    api_key: String,
    http: reqwest::Client,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> AiResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.trim().is_empty())
            .ok_or(AiError::MissingApiKey("Gemini"))?;

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

    fn generate_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

#[async_trait]
impl CompletionProvider for GeminiClient {
    fn source(&self) -> AnalysisSource {
        AnalysisSource::Gemini
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete_json(&self, prompt: &str) -> AiResult<String> {
        let payload = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        };

        debug!(model = %self.config.model, prompt_len = prompt.len(), "Sending Gemini request");

        let response = self
            .http
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
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
            warn!(status = status.as_u16(), "Gemini returned an error status");
            return Err(AiError::Http {
                provider: PROVIDER,
                status: status.as_u16(),
                details: error_details(&body),
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            AiError::MalformedResponse(format!(
                "invalid JSON from Gemini: {e} (body={})",
                truncate_for_error(&body)
            ))
        })?;

        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.trim().is_empty() {
            return Err(AiError::MalformedResponse(
                "Gemini response had no candidate text".to_string(),
            ));
        }
        Ok(text)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
}

#[derive(Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}
