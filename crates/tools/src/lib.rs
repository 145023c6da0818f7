//! Utility clients
//!
//! Each client answers one utility intent with a short plain-text reply:
//! - Weather via Open-Meteo geocoding and daily forecast
//! - News headlines via NewsAPI
//! - Web search via DuckDuckGo instant answers
//! - Encyclopedia summaries via the Wikipedia REST API
//! - Capital cities via REST Countries
//!
//! Clients are registered in a [`UtilityRegistry`] which applies the
//! per-call timeout.

pub mod capital;
pub mod encyclopedia;
pub mod http;
pub mod news;
pub mod registry;
pub mod weather;
pub mod web_search;

pub use capital::CapitalClient;
pub use encyclopedia::EncyclopediaClient;
pub use news::NewsClient;
pub use registry::{UtilityRegistry, UtilityTool};
pub use weather::WeatherClient;
pub use web_search::WebSearchClient;

use thiserror::Error;

/// Integration errors
#[derive(Error, Debug)]
pub enum IntegrationError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Authentication failed: {0}")]
    AuthFailed(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Timeout after {0}ms")]
    Timeout(u64),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for IntegrationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            IntegrationError::Timeout(0)
        } else if err.is_decode() {
            IntegrationError::InvalidResponse(err.to_string())
        } else {
            IntegrationError::ConnectionFailed(err.to_string())
        }
    }
}

impl From<IntegrationError> for catalog_chat_core::Error {
    fn from(err: IntegrationError) -> Self {
        match err {
            IntegrationError::Timeout(ms) => catalog_chat_core::Error::Timeout(ms),
            other => catalog_chat_core::Error::Integration(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err: catalog_chat_core::Error = IntegrationError::Timeout(8000).into();
        assert!(err.is_timeout());

        let err: catalog_chat_core::Error = IntegrationError::NotFound("Atlantis".into()).into();
        assert!(matches!(err, catalog_chat_core::Error::Integration(ref m) if m.contains("Atlantis")));
    }
}
