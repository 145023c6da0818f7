//! Catalog backend traits

use async_trait::async_trait;

use crate::Result;

/// How strictly the backend should match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchMode {
    /// Order number, title, literal and fuzzy stages
    #[default]
    Full,
    /// Exact or digits-only order-number match only
    OrderNumberOnly,
}

/// Matched catalog text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogHit {
    /// Rendered result text, returned to the user as-is
    pub text: String,
    /// Number of matched entries, when the backend reports it
    pub matches: Option<usize>,
}

impl CatalogHit {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            matches: None,
        }
    }

    pub fn with_matches(mut self, matches: usize) -> Self {
        self.matches = Some(matches);
        self
    }
}

/// External catalog search collaborator
///
/// `Ok(None)` is the explicit "no hit" answer; `Err` means the backend could
/// not answer at all.
#[async_trait]
pub trait CatalogBackend: Send + Sync {
    /// Resolve a free-text query against the catalog
    async fn search(&self, query: &str, mode: SearchMode) -> Result<Option<CatalogHit>>;

    /// Rebuild the search index, returning the number of indexed entries
    async fn rebuild(&self) -> Result<usize>;

    /// Backend name for logs
    fn name(&self) -> &str;

    /// Number of searchable entries, when the backend knows it
    fn entry_count(&self) -> Option<usize> {
        None
    }
}

/// Source of catalog record texts for lexicon mining
///
/// Each returned string is the concatenation of one record's title,
/// category, variant, description and order-number fields.
pub trait LexiconSource: Send + Sync {
    fn record_texts(&self) -> Result<Vec<String>>;
}
