use axum::extract::FromRef;

use crate::dataset::Dataset;
use std::sync::Arc;
use std::time::Instant;

use super::ServerConfig;

pub type GuardedDataset = Arc<Dataset>;

#[derive(Clone)]
pub struct ServerState {
    pub config: ServerConfig,
    pub start_time: Instant,
    pub dataset: GuardedDataset,
    pub hash: String,
}

impl ServerState {
    pub fn new(config: ServerConfig, dataset: GuardedDataset) -> ServerState {
        ServerState {
            config,
            start_time: Instant::now(),
            dataset,
            hash: env!("CARGO_PKG_VERSION").to_owned(),
        }
    }
}

impl FromRef<ServerState> for GuardedDataset {
    fn from_ref(input: &ServerState) -> Self {
        input.dataset.clone()
    }
}

impl FromRef<ServerState> for ServerConfig {
    fn from_ref(input: &ServerState) -> Self {
        input.config.clone()
    }
}
