//! API server: REST routes, OpenAPI docs and the metrics exporter.

use crate::dataset_rest;
use crate::rest::{self, AppState};
use crate::swagger::ApiDoc;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use media_core::AppConfig;
use std::net::SocketAddr;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub struct ApiServer {
    state: AppState,
}

impl ApiServer {
    pub fn new(config: AppConfig) -> Self {
        Self {
            state: AppState::new(config),
        }
    }

    /// Start the HTTP REST server.
    pub async fn start_http(&self) -> anyhow::Result<()> {
        let config = &self.state.config;
        let addr = SocketAddr::new(config.api.host.parse()?, config.api.http_port);
        let app = build_router(self.state.clone());

        info!(addr = %addr, "Starting HTTP server");

        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app).await?;

        Ok(())
    }

    /// Start the metrics server on a separate port.
    pub fn start_metrics(&self) -> anyhow::Result<()> {
        let config = &self.state.config;
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(SocketAddr::new(
                config.api.host.parse()?,
                config.metrics.port,
            ))
            .install()?;

        info!(port = config.metrics.port, "Metrics exporter started");
        Ok(())
    }
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.ingest.max_upload_bytes;

    let datasets = Router::new()
        .route("/v1/datasets", post(dataset_rest::handle_upload))
        .route(
            "/v1/datasets/:id",
            get(dataset_rest::handle_get_dataset).delete(dataset_rest::handle_delete_dataset),
        )
        .route(
            "/v1/datasets/:id/filters",
            get(dataset_rest::handle_get_filters)
                .put(dataset_rest::handle_set_filters)
                .delete(dataset_rest::handle_reset_filters),
        )
        .route("/v1/datasets/:id/dashboard", get(dataset_rest::handle_dashboard))
        .route(
            "/v1/datasets/:id/charts/:chart/ai-insights",
            post(dataset_rest::handle_chart_insights),
        )
        .route(
            "/v1/datasets/:id/analysis",
            get(dataset_rest::handle_get_analysis).post(dataset_rest::handle_generate_analysis),
        )
        .route("/v1/datasets/:id/report.pdf", get(dataset_rest::handle_report_pdf))
        .route("/v1/ai/models", get(dataset_rest::handle_models))
        .layer(DefaultBodyLimit::max(upload_limit));

    Router::new()
        .merge(datasets)
        // Operational endpoints
        .route("/health", get(rest::health_check))
        .route("/ready", get(rest::readiness))
        .route("/live", get(rest::liveness))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Middleware
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
