//! Library exports for the CLI, benchmarks and tests.
/// Application directory helpers.
pub mod app_dirs;
/// Trainer settings loaded from TOML.
pub mod config;
/// Training-pair file parsing and streaming.
pub mod dataset;
/// Logging setup.
pub mod logging;
/// Online learners, model files and evaluation metrics.
pub mod ml;
