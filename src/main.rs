//! CLI entry point for the sales report rater.
//!
//! Provides subcommands for pulling the emailed report exports into the data
//! directory, scoring them into `state_metrics.json`, or both in one run.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sales_rater::fetch::{BasicClient, auth::ApiKey};
use sales_rater::infra::credentials::{CredentialProvider, TokenFile, export_token_from_env};
use sales_rater::infra::gmail::GmailClient;
use sales_rater::metrics::SegmentMap;
use sales_rater::output::log_summary;
use sales_rater::pipeline::{build_metrics, fetch_reports};
use sales_rater::reports;
use sales_rater::resolver::ReportResolver;
use sales_rater::retriever::FileRetriever;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "sales_rater")]
#[command(about = "Pull emailed sales reports and score regions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct DataArgs {
    /// Directory holding the canonical report CSVs
    #[arg(short = 'd', long, default_value = "data")]
    data_dir: PathBuf,
}

#[derive(clap::Args)]
struct FetchArgs {
    /// OAuth token file for the inbox API
    #[arg(long, default_value = "token.json")]
    token_file: PathBuf,
}

#[derive(clap::Args)]
struct AggregateArgs {
    /// Where to write the scored metrics
    #[arg(short, long, default_value = "state_metrics.json")]
    output: PathBuf,

    /// Optional JSON segment map (segments, classification columns, role lookup)
    #[arg(short, long)]
    segments: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every report, then score them
    Run {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        fetch: FetchArgs,
        #[command(flatten)]
        aggregate: AggregateArgs,
    },
    /// Resolve report emails and download their exports
    Fetch {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        fetch: FetchArgs,
    },
    /// Score the CSVs already in the data directory
    Aggregate {
        #[command(flatten)]
        data: DataArgs,
        #[command(flatten)]
        aggregate: AggregateArgs,
    },
    /// List the reports and the files they are saved as
    ListReports,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/sales_rater.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("sales_rater.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(env_filter("RUST_LOG", LevelFilter::INFO));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(env_filter("RUST_LOG_JSON", LevelFilter::DEBUG));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            data,
            fetch,
            aggregate,
        } => {
            // Load the segment map first so a bad config fails before any download.
            let segments = load_segments(aggregate.segments.as_deref())?;
            fetch_all(&data.data_dir, &fetch.token_file).await?;
            aggregate_all(&data.data_dir, &aggregate.output, &segments)?;
        }
        Commands::Fetch { data, fetch } => {
            fetch_all(&data.data_dir, &fetch.token_file).await?;
        }
        Commands::Aggregate { data, aggregate } => {
            let segments = load_segments(aggregate.segments.as_deref())?;
            aggregate_all(&data.data_dir, &aggregate.output, &segments)?;
        }
        Commands::ListReports => {
            for spec in reports::catalog() {
                info!(
                    report = spec.name,
                    file = spec.canonical_filename,
                    kind = ?spec.kind,
                    category = %spec.category,
                    "Report"
                );
            }
        }
    }

    Ok(())
}

/// `RUST_LOG`-style filter from `var`, defaulting to `default` when unset.
fn env_filter(var: &str, default: LevelFilter) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(default.into())
        .with_env_var(var)
        .from_env_lossy()
}

fn load_segments(path: Option<&str>) -> Result<SegmentMap> {
    match path {
        Some(path) => {
            let map = SegmentMap::load(path)?;
            info!(path, segments = ?map.segments, roles = map.roles.len(), "Loaded segment map");
            Ok(map)
        }
        None => Ok(SegmentMap::default()),
    }
}

/// Resolves and downloads every report into `data_dir`.
#[tracing::instrument(skip_all, fields(data_dir = %data_dir.display()))]
async fn fetch_all(data_dir: &Path, token_file: &Path) -> Result<()> {
    // The export token is checked before anything touches the network.
    let export_token = export_token_from_env()?;

    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create {}", data_dir.display()))?;

    let inbox_token = TokenFile::new(token_file).bearer_token().await?;
    let inbox = GmailClient::new(ApiKey::bearer(BasicClient::new(), &inbox_token)?);

    let resolver = ReportResolver::new(
        inbox,
        ApiKey::bearer(BasicClient::without_redirects()?, &export_token)?,
    );
    let retriever = FileRetriever::new(
        ApiKey::bearer(BasicClient::new(), &export_token)?,
        BasicClient::new(),
    );

    fetch_reports(&resolver, &retriever, data_dir).await?;
    Ok(())
}

fn aggregate_all(data_dir: &Path, output: &Path, segments: &SegmentMap) -> Result<()> {
    let metrics = build_metrics(data_dir, output, segments)?;
    log_summary(&metrics);
    info!(output = %output.display(), "Done");
    Ok(())
}
