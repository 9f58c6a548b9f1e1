use thiserror::Error;

pub type AiResult<T> = Result<T, AiError>;

/// Longest upstream body or model output quoted in an error message.
pub const ERROR_BODY_LIMIT: usize = 400;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("Please enter your {0} API Key.")]
    MissingApiKey(&'static str),

    #[error("No data available to send to AI for analysis.")]
    EmptyData,

    #[error("'{0}' is not an AI provider")]
    UnsupportedSource(String),

    #[error("{provider} request timed out after {seconds}s. Please try again.")]
    Timeout {
        provider: &'static str,
        seconds: u64,
    },

    #[error("{provider} request failed with HTTP {status}. Check API key and network. Details: {details}")]
    Http {
        provider: &'static str,
        status: u16,
        details: String,
    },

    #[error("{provider} request failed: {message}. Check API key and network.")]
    Request {
        provider: &'static str,
        message: String,
    },

    #[error("Failed to encode prompt data: {0}")]
    PromptEncoding(String),

    #[error("Malformed AI response: {0}")]
    MalformedResponse(String),

    #[error("Failed to parse AI response as JSON: {error}. Raw content: {raw}")]
    InvalidJson { error: String, raw: String },
}

impl AiError {
    /// Errors the caller can fix by changing the request.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AiError::MissingApiKey(_) | AiError::EmptyData | AiError::UnsupportedSource(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, AiError::Timeout { .. })
    }

    /// Failures on this side before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(self, AiError::PromptEncoding(_))
    }
}

/// Cut `value` to [`ERROR_BODY_LIMIT`] characters for inclusion in errors.
pub fn truncate_for_error(value: &str) -> String {
    match value.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((idx, _)) => format!("{}...", &value[..idx]),
        None => value.to_string(),
    }
}

/// Map a failed `send()` to a timeout or a request error for `provider`.
pub(crate) fn send_error(provider: &'static str, e: reqwest::Error, timeout_secs: u64) -> AiError {
    if e.is_timeout() {
        AiError::Timeout {
            provider,
            seconds: timeout_secs,
        }
    } else {
        AiError::Request {
            provider,
            message: e.to_string(),
        }
    }
}

/// Pull a human message out of an error body: `error.message`, then
/// `message`, then the raw body.
pub(crate) fn error_details(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        let message = value
            .pointer("/error/message")
            .or_else(|| value.get("message"))
            .and_then(|m| m.as_str());
        if let Some(message) = message {
            return truncate_for_error(message);
        }
    }
    truncate_for_error(body)
}
