//! Mapping of library errors onto HTTP responses.

use crate::rest::ErrorResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use media_agents::AiError;
use media_core::MediaError;
use thiserror::Error;
use tracing::{error, warn};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("dataset {0} not found")]
    DatasetNotFound(Uuid),

    #[error("dataset not found: {0}")]
    MalformedDatasetId(String),

    #[error("unknown chart '{0}'")]
    UnknownChart(String),

    #[error("no analysis has been generated for this dataset")]
    NoAnalysis,

    #[error("generate an analysis before exporting a report")]
    ReportUnavailable,

    #[error("{message}")]
    Body { status: StatusCode, message: String },

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Ai(#[from] AiError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DatasetNotFound(_)
            | ApiError::MalformedDatasetId(_)
            | ApiError::UnknownChart(_)
            | ApiError::NoAnalysis => StatusCode::NOT_FOUND,
            ApiError::ReportUnavailable => StatusCode::CONFLICT,
            ApiError::Body { status, .. } => *status,
            ApiError::Media(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Media(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ai(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ApiError::Ai(e) if e.is_timeout() => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Ai(e) if e.is_local() => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ai(_) => StatusCode::BAD_GATEWAY,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::DatasetNotFound(_) | ApiError::MalformedDatasetId(_) => "dataset_not_found",
            ApiError::UnknownChart(_) => "unknown_chart",
            ApiError::NoAnalysis => "analysis_not_found",
            ApiError::ReportUnavailable => "report_unavailable",
            ApiError::Body { .. } => "invalid_body",
            ApiError::Media(MediaError::InvalidFilter(_)) => "invalid_filter",
            ApiError::Media(e) if e.is_client_error() => "invalid_dataset",
            ApiError::Media(_) => "internal_error",
            ApiError::Ai(AiError::MissingApiKey(_)) => "missing_api_key",
            ApiError::Ai(e) if e.is_client_error() => "invalid_ai_request",
            ApiError::Ai(e) if e.is_timeout() => "ai_timeout",
            ApiError::Ai(e) if e.is_local() => "internal_error",
            ApiError::Ai(_) => "ai_upstream_error",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "Request failed");
        } else {
            warn!(error = %self, status = status.as_u16(), "Request rejected");
        }

        let message = match &self {
            ApiError::Media(e) if !e.is_client_error() => "Internal processing error".to_string(),
            other => other.to_string(),
        };
        (
            status,
            Json(ErrorResponse {
                error: self.code().to_string(),
                message,
            }),
        )
            .into_response()
    }
}
