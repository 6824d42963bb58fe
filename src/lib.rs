//! Ratings Console Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod dataset;
pub mod engine;
pub mod server;

// Re-export commonly used types for convenience
pub use dataset::{load_dataset, Dataset, DatasetSources};
pub use server::{run_server, RequestsLoggingLevel};
