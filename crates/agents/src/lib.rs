//! AI-generated analyses: interchangeable completion providers and the
//! prompts that turn campaign data into summaries and chart insights.

pub mod analyst;
pub mod error;
pub mod gemini;
pub mod openrouter;
pub mod provider;

pub use analyst::AiAnalyst;
pub use error::{AiError, AiResult};
pub use gemini::{GeminiClient, KNOWN_GEMINI_MODELS};
pub use openrouter::{OpenRouterClient, KNOWN_OPENROUTER_MODELS};
pub use provider::{build_provider, CompletionProvider, ProviderOverrides};
