//! Collaborator traits
//!
//! The router talks to every external system through one of these traits so
//! that backends can be swapped by configuration and replaced by fakes in tests.
//!
//! ```text
//! Catalog:
//!   - CatalogBackend: query → matched catalog text | no hit; index rebuild
//!   - LexiconSource: catalog record texts mined for product tokens
//!
//! Generative fallback:
//!   - GenerativeModel: raw message → free text
//! ```

mod catalog;
mod llm;

pub use catalog::{CatalogBackend, CatalogHit, LexiconSource, SearchMode};
pub use llm::GenerativeModel;
