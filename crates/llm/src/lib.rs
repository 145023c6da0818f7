//! Generative fallback for chit-chat
//!
//! Features:
//! - OpenAI-compatible chat completions (OpenAI, Azure, local servers)
//! - Per-call timeout
//! - Disabled-by-config mode handled by the caller

pub mod backend;
pub mod fallback;
pub mod prompt;

pub use backend::{Completion, OpenAIBackend, OpenAIConfig};
pub use fallback::FallbackModel;
pub use prompt::{single_turn, Message, Role};

use std::sync::Arc;

use catalog_chat_config::FallbackConfig;
use catalog_chat_core::GenerativeModel;
use thiserror::Error;

/// LLM errors
#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Generation error: {0}")]
    Generation(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LlmError::Timeout(0)
        } else {
            LlmError::Network(err.to_string())
        }
    }
}

impl From<LlmError> for catalog_chat_core::Error {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::Timeout(ms) => catalog_chat_core::Error::Timeout(ms),
            other => catalog_chat_core::Error::Llm(other.to_string()),
        }
    }
}

/// Fallback model from configuration; `None` when the fallback is disabled
pub fn build_fallback(config: &FallbackConfig) -> Result<Option<Arc<dyn GenerativeModel>>, LlmError> {
    if !config.enabled {
        tracing::info!("Generative fallback disabled");
        return Ok(None);
    }
    let model = FallbackModel::new(OpenAIConfig::from(config), config.system_prompt.clone())?;
    tracing::info!(model = %config.model, endpoint = %config.endpoint, "Generative fallback ready");
    Ok(Some(Arc::new(model)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_fallback_builds_nothing() {
        let config = FallbackConfig {
            enabled: false,
            ..FallbackConfig::default()
        };
        assert!(build_fallback(&config).unwrap().is_none());
    }

    #[test]
    fn test_enabled_without_key_is_rejected() {
        let config = FallbackConfig {
            enabled: true,
            api_key: None,
            ..FallbackConfig::default()
        };
        assert!(matches!(build_fallback(&config), Err(LlmError::Configuration(_))));
    }

    #[test]
    fn test_timeout_maps_to_core_timeout() {
        let err: catalog_chat_core::Error = LlmError::Timeout(20_000).into();
        assert!(err.is_timeout());
    }
}
