//! Configuration management for the query engine
//!
//! Supports loading configuration from:
//! - TOML files
//! - Environment variables (KRISHI_ prefix)
//! - Built-in defaults
//!
//! Every tunable the engine consumes lives here: server binding and CORS,
//! rate-limit window, the per-category cache TTL table, request budgets,
//! and the ordered data-source endpoint chains.

pub mod settings;

pub use settings::{
    load_settings, CacheTtlConfig, EngineConfig, RateLimitConfig, ResponderKind,
    ServerConfig, Settings, SourceEndpoint,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}
