//! Configuration management for the catalog chat router
//!
//! Supports loading configuration from:
//! - YAML/TOML files (`config/default.*`, `config/{env}.*`)
//! - Environment variables (CATALOG_CHAT_ prefix, `__` as section separator)

pub mod constants;
pub mod settings;

pub use settings::{
    load_settings, load_settings_from, CatalogBackendKind, CatalogConfig, EmbeddingConfig,
    FallbackConfig, IntegrationsConfig, ObservabilityConfig, RuntimeEnvironment, ServerConfig,
    Settings, TransportConfig,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },
}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

impl From<ConfigError> for catalog_chat_core::Error {
    fn from(err: ConfigError) -> Self {
        catalog_chat_core::Error::Config(err.to_string())
    }
}
