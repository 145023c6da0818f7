//! Error types shared across crates

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by collaborators and infrastructure
///
/// Classification never produces an error; every variant here comes from an
/// external call or from startup.
#[derive(Error, Debug, Clone)]
pub enum Error {
    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Integration error: {0}")]
    Integration(String),

    #[error("Timed out after {0} ms")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the failure was a timeout, regardless of which collaborator hit it
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}
