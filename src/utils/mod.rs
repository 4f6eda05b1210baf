//! Shared utilities

pub mod configuration;

pub use configuration::{ConfigError, PipelineConfig};
