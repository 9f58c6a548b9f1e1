//! Interchangeable AI completion providers.

use crate::error::{AiError, AiResult};
use crate::gemini::GeminiClient;
use crate::openrouter::OpenRouterClient;
use async_trait::async_trait;
use media_core::config::AiConfig;
use media_reporting::AnalysisSource;
use std::sync::Arc;
use tracing::debug;

/// A chat model that answers a prompt with a JSON document.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    fn source(&self) -> AnalysisSource;

    fn model(&self) -> &str;

    /// Send `prompt` and return the raw text content of the reply.
    async fn complete_json(&self, prompt: &str) -> AiResult<String>;
}

/// Per-request values that take precedence over configuration.
#[derive(Debug, Clone, Default)]
pub struct ProviderOverrides {
    pub api_key: Option<String>,
    pub model: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Construct the client for `source` from configuration plus overrides.
pub fn build_provider(
    source: AnalysisSource,
    config: &AiConfig,
    overrides: ProviderOverrides,
) -> AiResult<Arc<dyn CompletionProvider>> {
    let api_key = non_empty(overrides.api_key);
    let model = non_empty(overrides.model);

    match source {
        AnalysisSource::BuiltIn => Err(AiError::UnsupportedSource(source.to_string())),
        AnalysisSource::OpenRouter => {
            let mut cfg = config.openrouter.clone();
            cfg.api_key = api_key.or_else(|| non_empty(cfg.api_key.take()));
            if let Some(model) = model {
                cfg.model = model;
            }
            debug!(model = %cfg.model, "Building OpenRouter provider");
            Ok(Arc::new(OpenRouterClient::new(cfg)?))
        }
        AnalysisSource::Gemini => {
            let mut cfg = config.gemini.clone();
            cfg.api_key = api_key.or_else(|| non_empty(cfg.api_key.take()));
            if let Some(model) = model {
                cfg.model = model;
            }
            debug!(model = %cfg.model, "Building Gemini provider");
            Ok(Arc::new(GeminiClient::new(cfg)?))
        }
    }
}
