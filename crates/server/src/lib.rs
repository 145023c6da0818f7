//! Catalog Chat Server
//!
//! HTTP surface for the router: inbound message webhook, admin rebuild,
//! health and Prometheus metrics.

pub mod http;
pub mod metrics;
pub mod state;

pub use http::create_router;
pub use metrics::init_metrics;
pub use state::AppState;

use thiserror::Error;

/// Server errors
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Startup error: {0}")]
    Startup(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<catalog_chat_agent::AgentError> for ServerError {
    fn from(err: catalog_chat_agent::AgentError) -> Self {
        ServerError::Startup(err.to_string())
    }
}

impl From<ServerError> for axum::http::StatusCode {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::InvalidRequest(_) => axum::http::StatusCode::BAD_REQUEST,
            ServerError::Startup(_) | ServerError::Internal(_) => {
                axum::http::StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }
}
