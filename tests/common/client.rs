//! HTTP client for end-to-end tests
//!
//! This module provides a high-level HTTP client that wraps reqwest
//! and provides methods for all console endpoints.
//!
//! When API routes or request formats change, update only this file.

use super::constants::*;
use reqwest::Response;
use serde_json::{json, Value};
use std::time::Duration;

pub struct TestClient {
    /// The underlying reqwest client (public for custom requests in tests)
    pub client: reqwest::Client,
    /// The base URL of the test server
    pub base_url: String,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build reqwest client");

        Self { client, base_url }
    }

    async fn post(&self, path: &str, body: Value) -> Response {
        self.client
            .post(format!("{}/v1/console/{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .expect("Request failed")
    }

    // ========================================================================
    // Server
    // ========================================================================

    /// GET /
    pub async fn get_home(&self) -> Response {
        self.client
            .get(format!("{}/", self.base_url))
            .send()
            .await
            .expect("Home request failed")
    }

    /// GET /metrics on the metrics listener
    pub async fn get_metrics(&self, metrics_url: &str) -> Response {
        self.client
            .get(format!("{}/metrics", metrics_url))
            .send()
            .await
            .expect("Metrics request failed")
    }

    // ========================================================================
    // Console Endpoints
    // ========================================================================

    /// GET /v1/console/controls
    pub async fn get_controls(&self) -> Response {
        self.client
            .get(format!("{}/v1/console/controls", self.base_url))
            .send()
            .await
            .expect("Controls request failed")
    }

    /// POST /v1/console/scatter
    pub async fn post_scatter(&self, genres: &[&str], year_range: (i32, i32)) -> Response {
        self.post(
            "scatter",
            json!({"selected_genres": genres, "year_range": [year_range.0, year_range.1]}),
        )
        .await
    }

    /// POST /v1/console/heatmap
    pub async fn post_heatmap(&self, genres: &[&str], year_range: (i32, i32)) -> Response {
        self.post(
            "heatmap",
            json!({"selected_genres": genres, "year_range": [year_range.0, year_range.1]}),
        )
        .await
    }

    /// POST /v1/console/ranked
    pub async fn post_ranked(
        &self,
        genres: &[&str],
        year_range: (i32, i32),
        rank_mode: &str,
    ) -> Response {
        self.post(
            "ranked",
            json!({
                "bar_genres": genres,
                "year_range": [year_range.0, year_range.1],
                "rank_mode": rank_mode,
            }),
        )
        .await
    }

    /// POST /v1/console/table with a raw query body
    pub async fn post_table(&self, query: Value) -> Response {
        self.post("table", query).await
    }

    /// POST /v1/console/reset
    pub async fn post_reset(&self, reset_clicks: u64) -> Response {
        self.post("reset", json!({"reset_clicks": reset_clicks})).await
    }

    /// POST /v1/console/update
    pub async fn post_update(&self, previous: Option<Value>, current: Value) -> Response {
        self.post("update", json!({"previous": previous, "current": current}))
            .await
    }
}
