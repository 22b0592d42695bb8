pub mod apis;
pub mod config;
pub mod constants;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod pipeline;
pub mod types;

// Ports and their adapters
pub mod app;
pub mod infra;
