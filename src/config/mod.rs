mod file_config;

pub use file_config::{FileConfig, RankedViewConfig};

use crate::dataset::DatasetSources;
use crate::engine::DEFAULT_TOP_N;
use crate::server::{RequestsLoggingLevel, ServerConfig};
use anyhow::{anyhow, bail, Result};
use clap::ValueEnum;
use std::path::{Path, PathBuf};

/// CLI arguments that can be used for config resolution.
/// This struct mirrors the CLI arguments that can be overridden by TOML config.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub events_csv: Option<PathBuf>,
    pub ratings_csv: Option<PathBuf>,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub top_n: usize,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            events_csv: None,
            ratings_csv: None,
            port: 3001,
            metrics_port: 9091,
            logging_level: RequestsLoggingLevel::default(),
            content_cache_age_sec: 3600,
            top_n: DEFAULT_TOP_N,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub events_csv: PathBuf,
    pub ratings_csv: PathBuf,
    pub port: u16,
    pub metrics_port: u16,
    pub logging_level: RequestsLoggingLevel,
    pub content_cache_age_sec: usize,
    pub top_n: usize,
}

fn resolve_source(
    name: &str,
    flag: &str,
    from_file: Option<String>,
    from_cli: &Option<PathBuf>,
) -> Result<PathBuf> {
    let path = from_file
        .map(PathBuf::from)
        .or_else(|| from_cli.clone())
        .ok_or_else(|| anyhow!("{name} must be specified via {flag} or in config file"))?;

    if !path.exists() {
        bail!("{name} file does not exist: {:?}", path);
    }
    if !path.is_file() {
        bail!("{name} is not a file: {:?}", path);
    }
    Ok(path)
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file config.
    /// TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let events_csv = resolve_source("events_csv", "--events-csv", file.events_csv, &cli.events_csv)?;
        let ratings_csv =
            resolve_source("ratings_csv", "--ratings-csv", file.ratings_csv, &cli.ratings_csv)?;

        let port = file.port.unwrap_or(cli.port);
        let metrics_port = file.metrics_port.unwrap_or(cli.metrics_port);

        let logging_level = file
            .logging_level
            .and_then(|s| parse_logging_level(&s))
            .unwrap_or_else(|| cli.logging_level.clone());

        let content_cache_age_sec = file
            .content_cache_age_sec
            .unwrap_or(cli.content_cache_age_sec);

        let top_n = file
            .ranked
            .unwrap_or_default()
            .top_n
            .unwrap_or(cli.top_n);
        if top_n == 0 {
            bail!("top_n must be at least 1");
        }

        Ok(Self {
            events_csv,
            ratings_csv,
            port,
            metrics_port,
            logging_level,
            content_cache_age_sec,
            top_n,
        })
    }

    pub fn dataset_sources(&self) -> DatasetSources {
        DatasetSources {
            events_csv: self.events_csv.clone(),
            ratings_csv: self.ratings_csv.clone(),
        }
    }

    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            requests_logging_level: self.logging_level.clone(),
            port: self.port,
            content_cache_age_sec: self.content_cache_age_sec,
            top_n: self.top_n,
        }
    }
}

/// Loads the TOML file at `path`, if any.
pub fn load_file_config(path: Option<&Path>) -> Result<Option<FileConfig>> {
    path.map(FileConfig::load).transpose()
}

/// Parses a logging level string into RequestsLoggingLevel.
/// Uses clap's ValueEnum trait for parsing.
fn parse_logging_level(s: &str) -> Option<RequestsLoggingLevel> {
    RequestsLoggingLevel::from_str(s, true).ok()
}
