//! Message routing and dispatch
//!
//! Features:
//! - Fixed-priority router over the ten intents (first matching rule wins)
//! - Per-message dispatcher that runs exactly one handler per message
//! - Catalog-bound intents never reach the generative fallback
//! - Handler panics become a generic failure reply

pub mod dispatcher;
pub mod replies;
pub mod router;

pub use dispatcher::{Collaborators, Dispatcher};
pub use router::{classify, IntentRouter, MessageContext, Rule, PRIORITY};

use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog_chat_catalog::CatalogError),

    #[error("LLM error: {0}")]
    Llm(#[from] catalog_chat_llm::LlmError),

    #[error("Integration error: {0}")]
    Integration(#[from] catalog_chat_tools::IntegrationError),
}

impl From<AgentError> for catalog_chat_core::Error {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Catalog(e) => e.into(),
            AgentError::Llm(e) => e.into(),
            AgentError::Integration(e) => e.into(),
        }
    }
}
