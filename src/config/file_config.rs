use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct FileConfig {
    // Dataset sources (can override CLI)
    pub events_csv: Option<String>,
    pub ratings_csv: Option<String>,

    // Server settings
    pub port: Option<u16>,
    pub metrics_port: Option<u16>,
    pub logging_level: Option<String>,
    pub content_cache_age_sec: Option<usize>,

    // View configs
    pub ranked: Option<RankedViewConfig>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct RankedViewConfig {
    /// Number of titles the ranked bar view keeps, ties aside.
    pub top_n: Option<usize>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        toml::from_str(&content).with_context(|| format!("Failed to parse config file: {:?}", path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_partial_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
events_csv = "/data/genre_counts.csv"
port = 4000
logging_level = "headers"

[ranked]
top_n = 5
"#
        )
        .unwrap();

        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.events_csv.as_deref(), Some("/data/genre_counts.csv"));
        assert_eq!(config.ratings_csv, None);
        assert_eq!(config.port, Some(4000));
        assert_eq!(config.metrics_port, None);
        assert_eq!(config.ranked.and_then(|r| r.top_n), Some(5));
    }

    #[test]
    fn reports_unparsable_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "port = \"not a number\"").unwrap();

        let err = FileConfig::load(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
