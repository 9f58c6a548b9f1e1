//! Media Intelligence: campaign dashboard service and command-line analyst.
//!
//! `serve` runs the REST API; `analyze` and `report` work on a local CSV.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use media_agents::{build_provider, AiAnalyst, ProviderOverrides};
use media_api::ApiServer;
use media_core::config::AppConfig;
use media_core::filter::{self, FilterCriteria};
use media_core::ingest::{parse_and_clean_path, CleaningReport};
use media_core::types::{DateBounds, MediaPost};
use media_reporting::{
    built_in_analysis, render_pdf, Analysis, AnalysisSource, DashboardSnapshot, ReportContent,
    ReportScope,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

#[derive(Parser, Debug)]
#[command(name = "media-intel")]
#[command(about = "Interactive media intelligence: campaign charts, insights and reports")]
#[command(version)]
struct Cli {
    /// TOML configuration file; skipped when missing
    #[arg(long, global = true, env = "MEDIA_INTEL_CONFIG", default_value = "media-intel.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the REST API server
    Serve(ServeArgs),
    /// Clean a CSV file and print insights and an analysis
    Analyze(AnalyzeArgs),
    /// Clean a CSV file and write the analysis as a PDF report
    Report(ReportArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Bind address (overrides config)
    #[arg(long)]
    host: Option<String>,

    /// HTTP port (overrides config)
    #[arg(long)]
    http_port: Option<u16>,

    /// Prometheus exporter port (overrides config)
    #[arg(long)]
    metrics_port: Option<u16>,

    /// Do not start the metrics exporter
    #[arg(long, default_value_t = false)]
    no_metrics: bool,
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// First day to include (YYYY-MM-DD)
    #[arg(long)]
    start_date: Option<NaiveDate>,

    /// Last day to include (YYYY-MM-DD)
    #[arg(long)]
    end_date: Option<NaiveDate>,

    #[arg(long)]
    platform: Option<String>,

    #[arg(long)]
    sentiment: Option<String>,

    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    media_type: Option<String>,
}

impl FilterArgs {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            start_date: self.start_date,
            end_date: self.end_date,
            platform: filter::normalize_selection(self.platform.clone()),
            sentiment: filter::normalize_selection(self.sentiment.clone()),
            location: filter::normalize_selection(self.location.clone()),
            media_type: filter::normalize_selection(self.media_type.clone()),
        }
    }
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// built-in, open-router or gemini
    #[arg(long, default_value = "built-in")]
    source: AnalysisSource,

    /// Model id for AI sources (overrides config)
    #[arg(long)]
    model: Option<String>,

    /// API key for AI sources (overrides config)
    #[arg(long, env = "MEDIA_INTEL_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// CSV file to analyze
    #[arg(long, short)]
    input: PathBuf,

    #[command(flatten)]
    filters: FilterArgs,

    #[command(flatten)]
    source: SourceArgs,

    /// Print a JSON document instead of text
    #[arg(long, default_value_t = false)]
    json: bool,
}

#[derive(Args, Debug)]
struct ReportArgs {
    /// CSV file to analyze
    #[arg(long, short)]
    input: PathBuf,

    /// Where to write the PDF
    #[arg(long, short)]
    output: PathBuf,

    #[command(flatten)]
    filters: FilterArgs,

    #[command(flatten)]
    source: SourceArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so `analyze --json` output stays parseable.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "media_intel=info,media_api=info,tower_http=info".into()),
        )
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load_from(Some(cli.config.as_path())).unwrap_or_else(|e| {
        warn!(error = %e, path = %cli.config.display(), "Failed to load config, using defaults");
        AppConfig::default()
    });

    match cli.command {
        Command::Serve(args) => serve(config, args).await,
        Command::Analyze(args) => analyze(&config, args).await,
        Command::Report(args) => report(&config, args).await,
    }
}

async fn serve(mut config: AppConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(host) = args.host {
        config.api.host = host;
    }
    if let Some(port) = args.http_port {
        config.api.http_port = port;
    }
    if let Some(port) = args.metrics_port {
        config.metrics.port = port;
    }
    if args.no_metrics {
        config.metrics.enabled = false;
    }

    info!(
        host = %config.api.host,
        http_port = config.api.http_port,
        metrics = config.metrics.enabled,
        max_sessions = config.ingest.max_sessions,
        "Configuration loaded"
    );

    let api_server = ApiServer::new(config.clone());

    if config.metrics.enabled {
        if let Err(e) = api_server.start_metrics() {
            error!(error = %e, "Failed to start metrics exporter");
        }
    }

    info!("Media Intelligence API is ready to serve traffic");
    api_server.start_http().await
}

/// Everything the offline commands compute for one input file.
#[derive(Serialize)]
struct AnalysisRun {
    file: String,
    cleaning: CleaningReport,
    filters: String,
    dashboard: DashboardSnapshot,
    analysis: Analysis,
}

async fn run_analysis(
    config: &AppConfig,
    input: &Path,
    filters: &FilterArgs,
    source: &SourceArgs,
) -> anyhow::Result<(AnalysisRun, Vec<MediaPost>)> {
    let dataset = parse_and_clean_path(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let criteria = filters.criteria();
    let posts = filter::apply(&dataset.posts, &criteria)?;

    info!(
        file = %input.display(),
        valid_records = dataset.report.valid_records,
        filtered_records = posts.len(),
        filters = %criteria.describe(),
        "Dataset prepared"
    );

    let analysis = if source.source.is_ai() {
        let provider = build_provider(
            source.source,
            &config.ai,
            ProviderOverrides {
                api_key: source.api_key.clone(),
                model: source.model.clone(),
            },
        )?;
        AiAnalyst::new(provider, config.ai.sample_rows)
            .analyze(&posts, &dataset.columns)
            .await?
    } else {
        built_in_analysis(&posts)
    };

    let run = AnalysisRun {
        file: input.display().to_string(),
        cleaning: dataset.report,
        filters: criteria.describe(),
        dashboard: DashboardSnapshot::build(&posts),
        analysis,
    };
    Ok((run, posts))
}

async fn analyze(config: &AppConfig, args: AnalyzeArgs) -> anyhow::Result<()> {
    let (run, _) = run_analysis(config, &args.input, &args.filters, &args.source).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
        return Ok(());
    }

    let report = &run.cleaning;
    println!("File: {}", run.file);
    println!(
        "Records: {} read, {} valid, {} dropped (invalid dates)",
        report.original_records, report.valid_records, report.dropped_invalid_dates
    );
    println!("Filters: {}", run.filters);
    println!(
        "Posts: {}  Engagements: {}",
        run.dashboard.total_posts, run.dashboard.total_engagements
    );
    if let Some(bounds) = run.dashboard.date_bounds {
        println!("Dates: {bounds}");
    }

    for panel in &run.dashboard.charts {
        println!("\n{}", panel.title);
        for insight in &panel.insights {
            println!("  - {insight}");
        }
    }

    let analysis = &run.analysis;
    println!("\nAnalysis from {}", analysis.source.display_name());
    println!("{}", analysis.summary);
    println!("\nCampaign Recommendations:");
    for (i, rec) in analysis.recommendations.iter().enumerate() {
        println!("  {}. {rec}", i + 1);
    }
    Ok(())
}

async fn report(config: &AppConfig, args: ReportArgs) -> anyhow::Result<()> {
    let (run, posts) = run_analysis(config, &args.input, &args.filters, &args.source).await?;

    let scope = ReportScope {
        records_analyzed: posts.len(),
        date_bounds: DateBounds::of(&posts),
        filters: run.filters.clone(),
        source: run.analysis.source.display_name().to_string(),
    };
    let content = ReportContent::from_analysis(&run.analysis, &config.report, Some(scope));
    let bytes = render_pdf(&content)?;

    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("failed to write {}", args.output.display()))?;

    info!(
        output = %args.output.display(),
        bytes = bytes.len(),
        source = %run.analysis.source,
        "Report written"
    );
    println!("Report written to {}", args.output.display());
    Ok(())
}
