use super::RequestsLoggingLevel;
use crate::engine::DEFAULT_TOP_N;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub requests_logging_level: RequestsLoggingLevel,
    pub port: u16,
    pub content_cache_age_sec: usize,
    /// Number of titles kept by the ranked bar view, ties aside.
    pub top_n: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            requests_logging_level: RequestsLoggingLevel::Path,
            port: 3001,
            content_cache_age_sec: 3600,
            top_n: DEFAULT_TOP_N,
        }
    }
}
