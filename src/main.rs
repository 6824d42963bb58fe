use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use ratings_console_server::config::{load_file_config, AppConfig, CliConfig};
use ratings_console_server::dataset::{load_dataset, Dataset};
use ratings_console_server::server::{metrics, run_server, RequestsLoggingLevel};

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
struct CliArgs {
    /// Path to a TOML config file. Values found there override the flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Path to the CSV file of release events (one row per movie).
    #[clap(long, value_parser = parse_path)]
    pub events_csv: Option<PathBuf>,

    /// Path to the CSV file of individual ratings.
    #[clap(long, value_parser = parse_path)]
    pub ratings_csv: Option<PathBuf>,

    /// The port to listen on.
    #[clap(short, long, default_value_t = 3001)]
    pub port: u16,

    /// The port for the metrics server (Prometheus scraping).
    #[clap(long, default_value_t = 9091)]
    pub metrics_port: u16,

    /// The level of logging to perform on each request.
    #[clap(long, default_value = "path")]
    pub logging_level: RequestsLoggingLevel,

    /// The maximum age of content in the cache in seconds.
    #[clap(long, default_value_t = 3600)]
    pub content_cache_age_sec: usize,

    /// How many titles the ranked view shows before ties.
    #[clap(long, default_value_t = 10)]
    pub top_n: usize,

    /// Only load the dataset, report what was skipped and exit.
    #[clap(long)]
    pub check_only: bool,
}

impl From<&CliArgs> for CliConfig {
    fn from(args: &CliArgs) -> Self {
        CliConfig {
            events_csv: args.events_csv.clone(),
            ratings_csv: args.ratings_csv.clone(),
            port: args.port,
            metrics_port: args.metrics_port,
            logging_level: args.logging_level.clone(),
            content_cache_age_sec: args.content_cache_age_sec,
            top_n: args.top_n,
        }
    }
}

fn check_dataset(config: &AppConfig) -> Result<()> {
    let build_result = Dataset::build(&config.dataset_sources())?;
    let dataset = build_result.dataset;

    if build_result.problems.is_empty() {
        println!("No problems found.");
    } else {
        println!("Found {} problems:", build_result.problems.len());
        for problem in build_result.problems.iter() {
            println!("- {:?}", problem);
        }
    }
    println!(
        "{} movie events, {} ratings, {} summary rows",
        dataset.get_events_count(),
        dataset.get_ratings_count(),
        dataset.get_summary_rows_count()
    );
    if let Some((min_year, max_year)) = dataset.year_bounds() {
        println!("Release years span {}-{}", min_year, max_year);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()?;

    if let Some(path) = cli_args.config.as_ref() {
        info!("Loading configuration from {:?}", path);
    }
    let file_config = load_file_config(cli_args.config.as_deref())?;
    let config = AppConfig::resolve(&CliConfig::from(&cli_args), file_config)?;
    info!("Resolved configuration: {:?}", config);

    if cli_args.check_only {
        return check_dataset(&config);
    }

    let dataset = load_dataset(&config.dataset_sources())?;

    info!("Initializing metrics...");
    metrics::init_metrics();
    metrics::init_dataset_metrics(
        dataset.get_events_count(),
        dataset.get_ratings_count(),
        dataset.get_summary_rows_count(),
    );

    info!("Ready to serve at port {}!", config.port);
    info!("Metrics available at port {}!", config.metrics_port);
    run_server(dataset, config.server_config(), config.metrics_port).await
}
