//! Product catalog lookup
//!
//! Features:
//! - Raw product file loading with field aliases and variant flattening
//! - In-process search backend (order number, title-first, literal recall, fuzzy)
//! - Optional semantic stage over embeddings from an Ollama-compatible server
//! - Subprocess backend for an external search command
//! - Catalog gateway with query cleaning, timeouts and typed lookup failures

pub mod embeddings;
pub mod gateway;
pub mod local;
pub mod record;
pub mod subprocess;

pub use embeddings::{cosine_similarity, Embedder, OllamaEmbedder};
pub use gateway::{clean_query, truncate_reply, CatalogGateway, LookupFailure};
pub use local::{lexical_matches, token_set_ratio, CatalogIndex, LocalCatalog, SearchTuning};
pub use record::{
    expand_synonyms, flatten_products, load_products, search_normalize, CatalogEntry,
    DocsFileLexicon,
};
pub use subprocess::SubprocessCatalog;

use std::sync::Arc;

use catalog_chat_config::{CatalogBackendKind, CatalogConfig};
use catalog_chat_core::{CatalogBackend, LexiconSource};
use thiserror::Error;

/// Marker prefix a search backend prints when nothing matched
pub const NO_MATCH_PREFIX: &str = "❌";

/// Catalog errors
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Failed to start search process: {0}")]
    Spawn(String),

    #[error("Search process exited with {code:?}: {stderr}")]
    Process { code: Option<i32>, stderr: String },

    #[error("Catalog call timed out after {0}ms")]
    Timeout(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Search task failed: {0}")]
    Task(String),
}

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::Parse(err.to_string())
    }
}

impl From<CatalogError> for catalog_chat_core::Error {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::Timeout(ms) => catalog_chat_core::Error::Timeout(ms),
            other => catalog_chat_core::Error::Catalog(other.to_string()),
        }
    }
}

/// A configured backend together with the record source for the lexicon
pub struct CatalogHandles {
    pub backend: Arc<dyn CatalogBackend>,
    pub lexicon_source: Arc<dyn LexiconSource>,
}

/// Build the backend selected in the configuration
pub fn build_backend(config: &CatalogConfig) -> Result<CatalogHandles, CatalogError> {
    match config.backend {
        CatalogBackendKind::Local => {
            let mut catalog = LocalCatalog::open(config);
            if config.embeddings.enabled {
                let embedder = Arc::new(OllamaEmbedder::new(&config.embeddings)?);
                tracing::info!(
                    endpoint = %config.embeddings.endpoint,
                    model = %config.embeddings.model,
                    "Semantic catalog stage enabled"
                );
                catalog = catalog.with_embedder(embedder, &config.embeddings);
            }
            let catalog = Arc::new(catalog);
            Ok(CatalogHandles {
                backend: catalog.clone(),
                lexicon_source: catalog,
            })
        }
        CatalogBackendKind::Subprocess => {
            let backend = Arc::new(SubprocessCatalog::from_config(config)?);
            Ok(CatalogHandles {
                backend,
                lexicon_source: Arc::new(DocsFileLexicon::new(&config.docs_path)),
            })
        }
    }
}
