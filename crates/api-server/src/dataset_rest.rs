//! Dataset REST API: upload, filtering, dashboard, analyses and PDF export.

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, OptionalJson};
use crate::rest::{AppState, ErrorResponse};
use crate::session::{DatasetSession, StoredAnalysis};
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use chrono::{DateTime, Utc};
use media_agents::{
    build_provider, AiAnalyst, ProviderOverrides, KNOWN_GEMINI_MODELS, KNOWN_OPENROUTER_MODELS,
};
use media_core::filter::{FilterCriteria, FilterOptions};
use media_core::ingest::{parse_and_clean_bytes, CleaningReport};
use media_core::types::{DateBounds, MediaPost};
use media_reporting::{
    built_in_analysis, render_pdf, Analysis, AnalysisSource, ChartKind, ChartPanel,
    DashboardSnapshot, ReportContent, ReportScope,
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

const DEFAULT_FILE_NAME: &str = "upload.csv";

// ─── Request / response types ───────────────────────────────────────────────

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UploadParams {
    /// Name of the uploaded file, shown in overviews.
    pub file_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UploadResponse {
    pub id: Uuid,
    pub file_name: String,
    pub report: CleaningReport,
    pub columns: Vec<String>,
    pub filter_options: FilterOptions,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DatasetOverview {
    pub id: Uuid,
    pub file_name: String,
    pub report: CleaningReport,
    pub columns: Vec<String>,
    pub filters: FilterCriteria,
    pub filtered_records: usize,
    pub current_source: Option<AnalysisSource>,
    pub available_analyses: Vec<AnalysisSource>,
    pub created_at: DateTime<Utc>,
    pub last_access: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FiltersResponse {
    pub options: FilterOptions,
    pub criteria: FilterCriteria,
    pub description: String,
    pub filtered_records: usize,
}

/// Which analysis to run. Keys and models fall back to configuration; an
/// empty body runs the built-in analysis.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AnalysisRequest {
    #[serde(default = "default_source")]
    pub source: AnalysisSource,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

fn default_source() -> AnalysisSource {
    AnalysisSource::BuiltIn
}

impl Default for AnalysisRequest {
    fn default() -> Self {
        Self {
            source: default_source(),
            api_key: None,
            model: None,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnalysisResponse {
    pub analysis: Analysis,
    pub scope: ReportScope,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ChartInsightsResponse {
    pub chart: ChartKind,
    pub title: String,
    pub source: AnalysisSource,
    pub insights: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ModelsResponse {
    pub open_router: Vec<String>,
    pub gemini: Vec<String>,
    pub default_open_router: String,
    pub default_gemini: String,
}

// ─── Helpers ────────────────────────────────────────────────────────────────

fn session<R>(
    state: &AppState,
    id: Uuid,
    f: impl FnOnce(&mut DatasetSession) -> R,
) -> Result<R, ApiError> {
    state
        .sessions
        .with_session(id, f)
        .ok_or(ApiError::DatasetNotFound(id))
}

fn filters_response(session: &DatasetSession) -> Result<FiltersResponse, ApiError> {
    Ok(FiltersResponse {
        options: FilterOptions::from_posts(&session.posts),
        criteria: session.filters.clone(),
        description: session.filters.describe(),
        filtered_records: session.filtered_posts()?.len(),
    })
}

/// Filtered posts plus what a report needs to describe them.
struct AnalysisInput {
    posts: Vec<MediaPost>,
    columns: Vec<String>,
    filters: String,
}

fn analysis_input(state: &AppState, id: Uuid) -> Result<AnalysisInput, ApiError> {
    session(state, id, |s| -> Result<AnalysisInput, ApiError> {
        Ok(AnalysisInput {
            posts: s.filtered_posts()?,
            columns: s.columns.clone(),
            filters: s.filters.describe(),
        })
    })?
}

fn overrides(request: &AnalysisRequest) -> ProviderOverrides {
    ProviderOverrides {
        api_key: request.api_key.clone(),
        model: request.model.clone(),
    }
}

// ─── Datasets ───────────────────────────────────────────────────────────────

/// POST /v1/datasets: Upload a CSV file and start a dataset session.
#[utoipa::path(
    post,
    path = "/v1/datasets",
    tag = "Datasets",
    params(UploadParams),
    request_body(content = String, content_type = "text/csv", description = "Raw CSV file"),
    responses(
        (status = 201, description = "File cleaned and stored", body = UploadResponse),
        (status = 400, description = "File could not be parsed", body = ErrorResponse),
        (status = 413, description = "File exceeds the upload limit", body = ErrorResponse),
    )
)]
pub async fn handle_upload(
    State(state): State<AppState>,
    Query(params): Query<UploadParams>,
    body: Result<Bytes, BytesRejection>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let body = body?;

    let file_name = params
        .file_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());

    let dataset = parse_and_clean_bytes(&body)?;
    let report = dataset.report.clone();
    let columns = dataset.columns.clone();
    let filter_options = FilterOptions::from_posts(&dataset.posts);

    metrics::counter!("ingest.uploads").increment(1);
    metrics::counter!("ingest.rows_dropped").increment(report.dropped_invalid_dates as u64);

    let id = state
        .sessions
        .insert(DatasetSession::new(file_name.clone(), dataset));

    info!(
        dataset_id = %id,
        file_name = %file_name,
        bytes = body.len(),
        valid_records = report.valid_records,
        dropped = report.dropped_invalid_dates,
        "Dataset uploaded"
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id,
            file_name,
            report,
            columns,
            filter_options,
        }),
    ))
}

/// GET /v1/datasets/:id: Dataset overview.
#[utoipa::path(
    get,
    path = "/v1/datasets/{id}",
    tag = "Datasets",
    params(("id" = Uuid, Path, description = "Dataset id")),
    responses(
        (status = 200, description = "Dataset overview", body = DatasetOverview),
        (status = 404, description = "Unknown dataset", body = ErrorResponse),
    )
)]
pub async fn handle_get_dataset(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<DatasetOverview>, ApiError> {
    let overview = session(&state, id, |s| -> Result<DatasetOverview, ApiError> {
        let mut available: Vec<AnalysisSource> = s.analyses.keys().copied().collect();
        available.sort_by_key(|source| source.to_string());
        Ok(DatasetOverview {
            id: s.id,
            file_name: s.file_name.clone(),
            report: s.report.clone(),
            columns: s.columns.clone(),
            filters: s.filters.clone(),
            filtered_records: s.filtered_posts()?.len(),
            current_source: s.current_source,
            available_analyses: available,
            created_at: s.created_at,
            last_access: s.last_access,
        })
    })??;
    Ok(Json(overview))
}

/// DELETE /v1/datasets/:id: Drop a dataset session.
#[utoipa::path(
    delete,
    path = "/v1/datasets/{id}",
    tag = "Datasets",
    params(("id" = Uuid, Path, description = "Dataset id")),
    responses(
        (status = 204, description = "Dataset removed"),
        (status = 404, description = "Unknown dataset", body = ErrorResponse),
    )
)]
pub async fn handle_delete_dataset(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    if state.sessions.remove(id) {
        info!(dataset_id = %id, "Dataset removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::DatasetNotFound(id))
    }
}

// ─── Filters ────────────────────────────────────────────────────────────────

/// GET /v1/datasets/:id/filters: Filter options and active criteria.
#[utoipa::path(
    get,
    path = "/v1/datasets/{id}/filters",
    tag = "Filters",
    params(("id" = Uuid, Path, description = "Dataset id")),
    responses(
        (status = 200, description = "Filter state", body = FiltersResponse),
        (status = 404, description = "Unknown dataset", body = ErrorResponse),
    )
)]
pub async fn handle_get_filters(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<FiltersResponse>, ApiError> {
    Ok(Json(session(&state, id, |s| filters_response(s))??))
}

/// PUT /v1/datasets/:id/filters: Replace the active criteria.
#[utoipa::path(
    put,
    path = "/v1/datasets/{id}/filters",
    tag = "Filters",
    params(("id" = Uuid, Path, description = "Dataset id")),
    request_body = FilterCriteria,
    responses(
        (status = 200, description = "Filters applied", body = FiltersResponse),
        (status = 400, description = "Start date after end date", body = ErrorResponse),
        (status = 404, description = "Unknown dataset", body = ErrorResponse),
    )
)]
pub async fn handle_set_filters(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(criteria): ApiJson<FilterCriteria>,
) -> Result<Json<FiltersResponse>, ApiError> {
    criteria.validate()?;
    let response = session(&state, id, |s| {
        s.filters = criteria;
        filters_response(s)
    })??;
    info!(
        dataset_id = %id,
        active_filters = response.criteria.active_count(),
        filters = %response.description,
        filtered_records = response.filtered_records,
        "Filters updated"
    );
    Ok(Json(response))
}

/// DELETE /v1/datasets/:id/filters: Reset every filter to "All".
#[utoipa::path(
    delete,
    path = "/v1/datasets/{id}/filters",
    tag = "Filters",
    params(("id" = Uuid, Path, description = "Dataset id")),
    responses(
        (status = 200, description = "Filters reset", body = FiltersResponse),
        (status = 404, description = "Unknown dataset", body = ErrorResponse),
    )
)]
pub async fn handle_reset_filters(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<FiltersResponse>, ApiError> {
    let response = session(&state, id, |s| {
        s.filters = FilterCriteria::default();
        filters_response(s)
    })??;
    Ok(Json(response))
}

// ─── Dashboard & charts ─────────────────────────────────────────────────────

/// GET /v1/datasets/:id/dashboard: Charts and rule-based insights.
#[utoipa::path(
    get,
    path = "/v1/datasets/{id}/dashboard",
    tag = "Dashboard",
    params(("id" = Uuid, Path, description = "Dataset id")),
    responses(
        (status = 200, description = "Dashboard over the filtered posts", body = DashboardSnapshot),
        (status = 404, description = "Unknown dataset", body = ErrorResponse),
    )
)]
pub async fn handle_dashboard(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<DashboardSnapshot>, ApiError> {
    let posts = session(&state, id, |s| s.filtered_posts())??;
    Ok(Json(DashboardSnapshot::build(&posts)))
}

/// POST /v1/datasets/:id/charts/:chart/ai-insights: Top insights for one
/// chart from an AI provider. `built_in` returns the rule-based insights.
#[utoipa::path(
    post,
    path = "/v1/datasets/{id}/charts/{chart}/ai-insights",
    tag = "Dashboard",
    params(
        ("id" = Uuid, Path, description = "Dataset id"),
        ("chart" = String, Path, description = "sentiment, engagement-trend, platforms, media-types or locations"),
    ),
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Chart insights", body = ChartInsightsResponse),
        (status = 400, description = "Missing API key or no data", body = ErrorResponse),
        (status = 404, description = "Unknown dataset or chart", body = ErrorResponse),
        (status = 502, description = "AI provider failed", body = ErrorResponse),
        (status = 504, description = "AI provider timed out", body = ErrorResponse),
    )
)]
pub async fn handle_chart_insights(
    State(state): State<AppState>,
    ApiPath((id, chart)): ApiPath<(Uuid, String)>,
    OptionalJson(request): OptionalJson<AnalysisRequest>,
) -> Result<Json<ChartInsightsResponse>, ApiError> {
    let kind = ChartKind::from_slug(&chart).ok_or(ApiError::UnknownChart(chart))?;
    let input = analysis_input(&state, id)?;
    let panel = ChartPanel::build(kind, &input.posts);

    let insights = if request.source.is_ai() {
        let provider = build_provider(request.source, &state.config.ai, overrides(&request))?;
        let analyst = AiAnalyst::new(provider, state.config.ai.sample_rows);
        analyst.chart_insights(&panel).await.map_err(|e| {
            metrics::counter!("analysis.ai_errors").increment(1);
            warn!(dataset_id = %id, chart = kind.slug(), error = %e, "AI chart insights failed");
            e
        })?
    } else {
        panel.insights.clone()
    };

    Ok(Json(ChartInsightsResponse {
        chart: kind,
        title: panel.title,
        source: request.source,
        insights,
    }))
}

// ─── Analyses ───────────────────────────────────────────────────────────────

/// POST /v1/datasets/:id/analysis: Generate a summary with recommendations
/// and make it the current analysis.
#[utoipa::path(
    post,
    path = "/v1/datasets/{id}/analysis",
    tag = "Analysis",
    params(("id" = Uuid, Path, description = "Dataset id")),
    request_body = AnalysisRequest,
    responses(
        (status = 200, description = "Analysis generated", body = AnalysisResponse),
        (status = 400, description = "Missing API key or no data", body = ErrorResponse),
        (status = 404, description = "Unknown dataset", body = ErrorResponse),
        (status = 502, description = "AI provider failed", body = ErrorResponse),
        (status = 504, description = "AI provider timed out", body = ErrorResponse),
    )
)]
pub async fn handle_generate_analysis(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
    OptionalJson(request): OptionalJson<AnalysisRequest>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let input = analysis_input(&state, id)?;

    let analysis = if request.source.is_ai() {
        let provider = build_provider(request.source, &state.config.ai, overrides(&request))?;
        let analyst = AiAnalyst::new(provider, state.config.ai.sample_rows);
        analyst
            .analyze(&input.posts, &input.columns)
            .await
            .map_err(|e| {
                metrics::counter!("analysis.ai_errors").increment(1);
                warn!(dataset_id = %id, source = %request.source, error = %e, "AI analysis failed");
                e
            })?
    } else {
        built_in_analysis(&input.posts)
    };

    let scope = ReportScope {
        records_analyzed: input.posts.len(),
        date_bounds: DateBounds::of(&input.posts),
        filters: input.filters,
        source: analysis.source.display_name().to_string(),
    };
    let stored = StoredAnalysis {
        analysis: analysis.clone(),
        scope: scope.clone(),
    };
    // The session may have been deleted while the provider was working.
    session(&state, id, |s| s.record_analysis(stored))?;

    metrics::counter!("analysis.generated", "source" => analysis.source.to_string()).increment(1);
    info!(
        dataset_id = %id,
        source = %analysis.source,
        records = scope.records_analyzed,
        recommendations = analysis.recommendations.len(),
        "Analysis generated"
    );

    Ok(Json(AnalysisResponse { analysis, scope }))
}

/// GET /v1/datasets/:id/analysis: The current analysis.
#[utoipa::path(
    get,
    path = "/v1/datasets/{id}/analysis",
    tag = "Analysis",
    params(("id" = Uuid, Path, description = "Dataset id")),
    responses(
        (status = 200, description = "Current analysis", body = AnalysisResponse),
        (status = 404, description = "Unknown dataset or no analysis yet", body = ErrorResponse),
    )
)]
pub async fn handle_get_analysis(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<AnalysisResponse>, ApiError> {
    let stored = session(&state, id, |s| s.current_analysis().cloned())?
        .ok_or(ApiError::NoAnalysis)?;
    Ok(Json(AnalysisResponse {
        analysis: stored.analysis,
        scope: stored.scope,
    }))
}

/// GET /v1/datasets/:id/report.pdf: PDF of the current analysis.
#[utoipa::path(
    get,
    path = "/v1/datasets/{id}/report.pdf",
    tag = "Analysis",
    params(("id" = Uuid, Path, description = "Dataset id")),
    responses(
        (status = 200, description = "PDF report", content_type = "application/pdf"),
        (status = 404, description = "Unknown dataset", body = ErrorResponse),
        (status = 409, description = "No analysis generated yet", body = ErrorResponse),
    )
)]
pub async fn handle_report_pdf(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let stored = session(&state, id, |s| s.current_analysis().cloned())?
        .ok_or(ApiError::ReportUnavailable)?;

    let content =
        ReportContent::from_analysis(&stored.analysis, &state.config.report, Some(stored.scope));
    let bytes = render_pdf(&content)?;

    metrics::counter!("report.exported").increment(1);
    info!(dataset_id = %id, bytes = bytes.len(), "Report exported");

    let disposition = format!("attachment; filename=\"{}\"", state.config.report.file_name);
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}

// ─── AI catalog ─────────────────────────────────────────────────────────────

/// GET /v1/ai/models: Selectable model ids per provider.
#[utoipa::path(
    get,
    path = "/v1/ai/models",
    tag = "Analysis",
    responses((status = 200, description = "Known models", body = ModelsResponse))
)]
pub async fn handle_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    Json(ModelsResponse {
        open_router: KNOWN_OPENROUTER_MODELS.iter().map(|m| m.to_string()).collect(),
        gemini: KNOWN_GEMINI_MODELS.iter().map(|m| m.to_string()).collect(),
        default_open_router: state.config.ai.openrouter.model.clone(),
        default_gemini: state.config.ai.gemini.model.clone(),
    })
}

#[cfg(test)]
mod tests {
    use crate::rest::AppState;
    use crate::server::build_router;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use axum::routing::post;
    use axum::Router;
    use media_core::AppConfig;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    const SAMPLE: &str = "\
Date,Platform,Sentiment,Location,Engagements,Media Type,Influencer Brand,Post Type
2024-03-01,Instagram,Positive,Jakarta,120,Video,BrandA,Organic
2024-03-02 14:30:00,TikTok,Negative,Bandung,,Image,BrandB,Paid
not-a-date,Twitter,Neutral,Surabaya,40,Text,BrandC,Organic
2024-03-05,Instagram,Neutral,Jakarta,60,Carousel,BrandA,Paid
";

    fn app_with(config: AppConfig) -> Router {
        build_router(AppState::new(config))
    }

    fn app() -> Router {
        app_with(AppConfig::default())
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, body.to_vec())
    }

    async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let (status, body) = send(app, request).await;
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, value)
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn upload(app: &Router, csv: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/v1/datasets?file_name=campaign.csv")
            .header(header::CONTENT_TYPE, "text/csv")
            .body(Body::from(csv.to_string()))
            .unwrap();
        send_json(app, request).await
    }

    async fn upload_id(app: &Router) -> String {
        let (status, body) = upload(app, SAMPLE).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = send_json(&app(), get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["active_datasets"], 0);
    }

    #[tokio::test]
    async fn test_upload_reports_cleaning() {
        let app = app();
        let (status, body) = upload(&app, SAMPLE).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["file_name"], "campaign.csv");
        assert_eq!(body["report"]["original_records"], 4);
        assert_eq!(body["report"]["valid_records"], 3);
        assert_eq!(body["report"]["dropped_invalid_dates"], 1);
        assert_eq!(body["filter_options"]["platforms"], json!(["All", "Instagram", "TikTok"]));

        let id = body["id"].as_str().unwrap();
        let (status, overview) = send_json(&app, get(&format!("/v1/datasets/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(overview["filtered_records"], 3);
        assert_eq!(overview["current_source"], Value::Null);
    }

    #[tokio::test]
    async fn test_upload_missing_columns() {
        let (status, body) = upload(&app(), "Date,Platform\n2024-01-01,Instagram\n").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_dataset");
        assert!(body["message"].as_str().unwrap().contains("sentiment"));
    }

    #[tokio::test]
    async fn test_upload_over_limit() {
        let mut config = AppConfig::default();
        config.ingest.max_upload_bytes = 64;
        let (status, _) = upload(&app_with(config), SAMPLE).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_unknown_dataset() {
        let uri = format!("/v1/datasets/{}/dashboard", uuid::Uuid::new_v4());
        let (status, body) = send_json(&app(), get(&uri)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "dataset_not_found");
    }

    #[tokio::test]
    async fn test_filters_roundtrip() {
        let app = app();
        let id = upload_id(&app).await;
        let uri = format!("/v1/datasets/{id}/filters");

        let (status, body) = send_json(
            &app,
            json_request("PUT", &uri, json!({"platform": "Instagram", "sentiment": "All"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filtered_records"], 2);
        assert_eq!(body["description"], "Platform: Instagram");

        let (status, body) = send_json(
            &app,
            json_request(
                "PUT",
                &uri,
                json!({"start_date": "2024-03-05", "end_date": "2024-03-01"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_filter");

        let request = Request::builder()
            .method("DELETE")
            .uri(&uri)
            .body(Body::empty())
            .unwrap();
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["filtered_records"], 3);
        assert_eq!(body["description"], "All records");
    }

    #[tokio::test]
    async fn test_dashboard_follows_filters() {
        let app = app();
        let id = upload_id(&app).await;
        send_json(
            &app,
            json_request(
                "PUT",
                &format!("/v1/datasets/{id}/filters"),
                json!({"platform": "TikTok"}),
            ),
        )
        .await;

        let (status, body) = send_json(&app, get(&format!("/v1/datasets/{id}/dashboard"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total_posts"], 1);
        assert_eq!(body["charts"].as_array().unwrap().len(), 5);
        assert_eq!(body["charts"][0]["data"]["chart_type"], "donut");
    }

    #[tokio::test]
    async fn test_report_requires_analysis() {
        let app = app();
        let id = upload_id(&app).await;

        let (status, body) = send_json(&app, get(&format!("/v1/datasets/{id}/report.pdf"))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "report_unavailable");

        let (status, _) = send_json(&app, get(&format!("/v1/datasets/{id}/analysis"))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_built_in_analysis_and_report() {
        let app = app();
        let id = upload_id(&app).await;

        let (status, body) = send_json(
            &app,
            json_request(
                "POST",
                &format!("/v1/datasets/{id}/analysis"),
                json!({"source": "built_in"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["source"], "built_in");
        assert_eq!(body["scope"]["records_analyzed"], 3);
        assert!(body["analysis"]["summary"]
            .as_str()
            .unwrap()
            .starts_with("Analyzed a total of 3 posts"));

        let (status, overview) = send_json(&app, get(&format!("/v1/datasets/{id}"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(overview["current_source"], "built_in");

        let response = app
            .clone()
            .oneshot(get(&format!("/v1/datasets/{id}/report.pdf")))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"media_intelligence_report.pdf\""
        );
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(body.starts_with(b"%PDF"));
    }

    #[tokio::test]
    async fn test_ai_analysis_without_key() {
        let app = app();
        let id = upload_id(&app).await;
        let (status, body) = send_json(
            &app,
            json_request(
                "POST",
                &format!("/v1/datasets/{id}/analysis"),
                json!({"source": "open_router"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "missing_api_key");
        assert_eq!(body["message"], "Please enter your OpenRouter API Key.");
    }

    #[tokio::test]
    async fn test_ai_analysis_with_fake_provider() {
        let upstream = Router::new().route(
            "/chat",
            post(|| async {
                axum::Json(json!({"choices": [{"message": {"content":
                    "{\"summary\": \"Instagram drives reach\", \"recommendations\": [\"Post more video\"]}"
                }}]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, upstream).await.unwrap() });

        let mut config = AppConfig::default();
        config.ai.openrouter.endpoint = format!("http://{addr}/chat");
        let app = app_with(config);
        let id = upload_id(&app).await;

        let (status, body) = send_json(
            &app,
            json_request(
                "POST",
                &format!("/v1/datasets/{id}/analysis"),
                json!({"source": "open_router", "api_key": "sk-test"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["summary"], "Instagram drives reach");
        assert_eq!(body["analysis"]["model"], "openai/gpt-3.5-turbo");
        assert_eq!(body["scope"]["source"], "OpenRouter AI");
    }

    #[tokio::test]
    async fn test_chart_insights_built_in_and_unknown_chart() {
        let app = app();
        let id = upload_id(&app).await;

        let (status, body) = send_json(
            &app,
            json_request(
                "POST",
                &format!("/v1/datasets/{id}/charts/platforms/ai-insights"),
                json!({"source": "built_in"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chart"], "platform_engagements");
        assert!(!body["insights"].as_array().unwrap().is_empty());

        let (status, body) = send_json(
            &app,
            json_request(
                "POST",
                &format!("/v1/datasets/{id}/charts/pie/ai-insights"),
                json!({}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "unknown_chart");
    }

    #[tokio::test]
    async fn test_malformed_ids_and_bodies_are_json_errors() {
        let app = app();
        let response = app.clone().oneshot(get("/v1/datasets/not-a-uuid")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(body["error"], "dataset_not_found");

        let (status, body) = send_json(
            &app,
            json_request("POST", "/v1/datasets/123/charts/platforms/ai-insights", json!({})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "dataset_not_found");

        let id = upload_id(&app).await;
        let (status, body) = send_json(
            &app,
            json_request(
                "PUT",
                &format!("/v1/datasets/{id}/filters"),
                json!({"start_date": "31/03/2024"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_body");

        let request = Request::builder()
            .method("PUT")
            .uri(format!("/v1/datasets/{id}/filters"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, body) = send_json(&app, request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "invalid_body");
    }

    #[tokio::test]
    async fn test_empty_body_runs_built_in() {
        let app = app();
        let id = upload_id(&app).await;
        let empty_post = |uri: String| {
            Request::builder()
                .method("POST")
                .uri(uri)
                .body(Body::empty())
                .unwrap()
        };

        let (status, body) =
            send_json(&app, empty_post(format!("/v1/datasets/{id}/analysis"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["source"], "built_in");

        let (status, body) = send_json(
            &app,
            empty_post(format!("/v1/datasets/{id}/charts/sentiment/ai-insights")),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "built_in");
        assert_eq!(body["chart"], "sentiment_breakdown");
    }

    #[tokio::test]
    async fn test_ai_chart_insights_with_fake_provider() {
        let upstream = Router::new().route(
            "/chat",
            post(|| async {
                axum::Json(json!({"choices": [{"message": {"content":
                    "```json{\"insights\": [\"Instagram leads\", \"TikTok trails\", \"Add reels\", \"Extra\"]}```"
                }}]}))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, upstream).await.unwrap() });

        let mut config = AppConfig::default();
        config.ai.openrouter.endpoint = format!("http://{addr}/chat");
        config.ai.openrouter.api_key = Some("sk-config".to_string());
        let app = app_with(config);
        let id = upload_id(&app).await;

        let (status, body) = send_json(
            &app,
            json_request(
                "POST",
                &format!("/v1/datasets/{id}/charts/platforms/ai-insights"),
                json!({"source": "open_router"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["source"], "open_router");
        assert_eq!(body["title"], "Platform Engagements");
        assert_eq!(
            body["insights"],
            json!(["Instagram leads", "TikTok trails", "Add reels"])
        );
    }

    #[tokio::test]
    async fn test_models_and_delete() {
        let app = app();
        let (status, body) = send_json(&app, get("/v1/ai/models")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["default_gemini"], "gemini-1.5-flash");

        let id = upload_id(&app).await;
        let delete = || {
            Request::builder()
                .method("DELETE")
                .uri(format!("/v1/datasets/{id}"))
                .body(Body::empty())
                .unwrap()
        };
        let (status, _) = send(&app, delete()).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&app, delete()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
