use crate::error::MediaResult;
use serde::Deserialize;
use std::path::Path;

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `MEDIA_INTEL__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub ai: AiConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_http_port")]
    pub http_port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IngestConfig {
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
}

// Default functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_http_port() -> u16 {
    8080
}
fn default_metrics_enabled() -> bool {
    true
}
fn default_metrics_port() -> u16 {
    9091
}
fn default_max_upload_bytes() -> usize {
    20 * 1024 * 1024
}
fn default_max_sessions() -> usize {
    256
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            http_port: default_http_port(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
            port: default_metrics_port(),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: default_max_upload_bytes(),
            max_sessions: default_max_sessions(),
        }
    }
}

// ─── AI Provider Config ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Rows of the filtered dataset included in an analysis prompt.
    #[serde(default = "default_sample_rows")]
    pub sample_rows: usize,
    #[serde(default)]
    pub openrouter: OpenRouterConfig,
    #[serde(default)]
    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OpenRouterConfig {
    #[serde(default = "default_openrouter_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_openrouter_model")]
    pub model: String,
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default = "default_app_title")]
    pub title: String,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    #[serde(default = "default_gemini_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub model: String,
    #[serde(default = "default_ai_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_sample_rows() -> usize { 50 }
fn default_openrouter_endpoint() -> String { "https://openrouter.ai/api/v1/chat/completions".to_string() }
fn default_openrouter_model() -> String { "openai/gpt-3.5-turbo".to_string() }
fn default_referer() -> String { "https://media-intelligence-dashboard.streamlit.app".to_string() }
fn default_app_title() -> String { "Interactive Media Intelligence Dashboard".to_string() }
fn default_ai_timeout_secs() -> u64 { 60 }
fn default_gemini_endpoint() -> String { "https://generativelanguage.googleapis.com/v1beta".to_string() }
fn default_gemini_model() -> String { "gemini-1.5-flash".to_string() }

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            sample_rows: default_sample_rows(),
            openrouter: OpenRouterConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Default for OpenRouterConfig {
    fn default() -> Self {
        Self {
            endpoint: default_openrouter_endpoint(),
            api_key: None,
            model: default_openrouter_model(),
            referer: default_referer(),
            title: default_app_title(),
            timeout_secs: default_ai_timeout_secs(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            endpoint: default_gemini_endpoint(),
            api_key: None,
            model: default_gemini_model(),
            timeout_secs: default_ai_timeout_secs(),
        }
    }
}

// ─── Report Config ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_title")]
    pub title: String,
    #[serde(default = "default_footer_lines")]
    pub footer_lines: Vec<String>,
    #[serde(default = "default_report_file_name")]
    pub file_name: String,
}

fn default_report_title() -> String { "Media Intelligence Report".to_string() }
fn default_footer_lines() -> Vec<String> {
    vec![
        "Powered by Gemini AI".to_string(),
        "Copyright Media Intelligence Vokasi UI".to_string(),
    ]
}
fn default_report_file_name() -> String { "media_intelligence_report.pdf".to_string() }

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_report_title(),
            footer_lines: default_footer_lines(),
            file_name: default_report_file_name(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            metrics: MetricsConfig::default(),
            ingest: IngestConfig::default(),
            ai: AiConfig::default(),
            report: ReportConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional TOML file overlaid with
    /// environment variables. A missing file is not an error.
    pub fn load_from(file: Option<&Path>) -> MediaResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(false),
            );
        }
        let builder = builder.add_source(
            config::Environment::with_prefix("MEDIA_INTEL")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("report.footer_lines"),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }
}
