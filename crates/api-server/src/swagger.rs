//! OpenAPI specification and Swagger UI configuration.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Media Intelligence API",
        version = "0.1.0",
        description = "Upload social media campaign exports, filter them, explore chart datasets with insights, and generate built-in or AI analyses exported as PDF reports.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Datasets", description = "CSV upload and dataset sessions"),
        (name = "Filters", description = "Date range and category filters"),
        (name = "Dashboard", description = "Chart datasets and chart insights"),
        (name = "Analysis", description = "Summaries, recommendations and PDF reports"),
        (name = "Operations", description = "Health, readiness, and liveness probes"),
    ),
    paths(
        // Datasets
        crate::dataset_rest::handle_upload,
        crate::dataset_rest::handle_get_dataset,
        crate::dataset_rest::handle_delete_dataset,
        // Filters
        crate::dataset_rest::handle_get_filters,
        crate::dataset_rest::handle_set_filters,
        crate::dataset_rest::handle_reset_filters,
        // Dashboard
        crate::dataset_rest::handle_dashboard,
        crate::dataset_rest::handle_chart_insights,
        // Analysis
        crate::dataset_rest::handle_generate_analysis,
        crate::dataset_rest::handle_get_analysis,
        crate::dataset_rest::handle_report_pdf,
        crate::dataset_rest::handle_models,
        // Operations
        crate::rest::health_check,
        crate::rest::readiness,
        crate::rest::liveness,
    ),
    components(schemas(
        // Data model
        media_core::types::MediaPost,
        media_core::types::DateBounds,
        media_core::types::Dimension,
        media_core::ingest::CleaningReport,
        media_core::filter::FilterCriteria,
        media_core::filter::FilterOptions,
        // Reporting
        media_reporting::charts::ChartKind,
        media_reporting::charts::ChartData,
        media_reporting::charts::CategoryShare,
        media_reporting::charts::CategoryTotal,
        media_reporting::charts::TrendPoint,
        media_reporting::dashboard::ChartPanel,
        media_reporting::dashboard::DashboardSnapshot,
        media_reporting::summary::Analysis,
        media_reporting::summary::AnalysisSource,
        media_reporting::pdf::ReportScope,
        // Request/response types
        crate::dataset_rest::UploadResponse,
        crate::dataset_rest::DatasetOverview,
        crate::dataset_rest::FiltersResponse,
        crate::dataset_rest::AnalysisRequest,
        crate::dataset_rest::AnalysisResponse,
        crate::dataset_rest::ChartInsightsResponse,
        crate::dataset_rest::ModelsResponse,
        crate::rest::ErrorResponse,
        crate::rest::HealthResponse,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_dataset_routes() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&String> = doc.paths.paths.keys().collect();
        assert!(paths.iter().any(|p| p.as_str() == "/v1/datasets"));
        assert!(paths.iter().any(|p| p.as_str() == "/v1/datasets/{id}/report.pdf"));
        assert!(paths.iter().any(|p| p.as_str() == "/health"));
    }
}
