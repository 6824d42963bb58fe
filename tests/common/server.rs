//! Test server lifecycle management
//!
//! This module manages spawning and shutting down test HTTP servers.
//! Each test gets an isolated server with its own dataset files.

use super::constants::*;
use super::fixtures::create_test_dataset;
use ratings_console_server::dataset::load_dataset;
use ratings_console_server::server::metrics::init_metrics;
use ratings_console_server::server::{make_app, make_metrics_app, RequestsLoggingLevel, ServerConfig};
use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;

/// Test server instance with an isolated dataset
///
/// When dropped, the server gracefully shuts down and temp resources are cleaned up.
pub struct TestServer {
    /// Base URL for making requests (e.g., "http://127.0.0.1:12345")
    pub base_url: String,

    /// Base URL of the metrics listener
    pub metrics_url: String,

    /// The port the server is listening on
    pub port: u16,

    // Private fields - keep resources alive until drop
    _temp_dataset_dir: TempDir,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

async fn bind_random_port() -> (TcpListener, u16) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let port = listener
        .local_addr()
        .expect("Failed to get local address")
        .port();
    (listener, port)
}

impl TestServer {
    /// Spawns a new test server with the default view limit
    pub async fn spawn() -> Self {
        Self::spawn_with_top_n(ServerConfig::default().top_n).await
    }

    /// Spawns a new test server on a random port
    ///
    /// This function:
    /// 1. Writes the fixture CSV files into a temporary directory
    /// 2. Loads the dataset from them
    /// 3. Binds the console and metrics listeners to random ports
    /// 4. Spawns both servers in a background task
    /// 5. Waits for the server to be ready
    ///
    /// # Panics
    ///
    /// Panics if the fixture cannot be written or loaded, if binding fails,
    /// or if the server doesn't become ready within the timeout.
    pub async fn spawn_with_top_n(top_n: usize) -> Self {
        let (temp_dataset_dir, sources) =
            create_test_dataset().expect("Failed to create test dataset");
        let dataset = load_dataset(&sources).expect("Failed to load test dataset");

        init_metrics();

        let (listener, port) = bind_random_port().await;
        let (metrics_listener, metrics_port) = bind_random_port().await;

        let base_url = format!("http://127.0.0.1:{}", port);
        let metrics_url = format!("http://127.0.0.1:{}", metrics_port);

        // Create shutdown channel
        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();

        let config = ServerConfig {
            port,
            requests_logging_level: RequestsLoggingLevel::None,
            content_cache_age_sec: 0, // Disable caching in tests
            top_n,
        };
        let app = make_app(config, Arc::new(dataset));

        tokio::spawn(async move {
            let server = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .into_future();
            let metrics_server = axum::serve(metrics_listener, make_metrics_app()).into_future();
            tokio::select! {
                result = server => result.expect("Server failed"),
                result = metrics_server => result.expect("Metrics server failed"),
            }
        });

        let server = Self {
            base_url,
            metrics_url,
            port,
            _temp_dataset_dir: temp_dataset_dir,
            _shutdown_tx: Some(shutdown_tx),
        };

        server.wait_for_ready().await;

        server
    }

    /// Waits for the server to become ready by polling the / endpoint
    async fn wait_for_ready(&self) {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(100))
            .build()
            .expect("Failed to build reqwest client");

        let start = std::time::Instant::now();
        let timeout = Duration::from_millis(SERVER_READY_TIMEOUT_MS);

        loop {
            if start.elapsed() > timeout {
                panic!(
                    "Server did not become ready within {}ms",
                    SERVER_READY_TIMEOUT_MS
                );
            }

            match client.get(format!("{}/", self.base_url)).send().await {
                Ok(response) if response.status().is_success() => return,
                _ => {
                    tokio::time::sleep(Duration::from_millis(SERVER_READY_POLL_INTERVAL_MS)).await;
                }
            }
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self._shutdown_tx.take() {
            let _ = tx.send(());
        }
        // TempDir will be cleaned up automatically
    }
}
