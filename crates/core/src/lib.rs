//! Core traits and types for the catalog chat router
//!
//! This crate provides foundational types used across all other crates:
//! - The closed `Intent` tag assigned to every inbound message
//! - Inbound message and dispatch outcome types
//! - Collaborator traits (catalog backend, generative fallback)
//! - Error types

pub mod error;
pub mod intent;
pub mod message;
pub mod traits;

pub use error::{Error, Result};
pub use intent::{Intent, IntentKind, UtilityKind, UtilityRequest};
pub use message::{DispatchOutcome, InboundMessage, OutcomeStatus};

pub use traits::{CatalogBackend, CatalogHit, GenerativeModel, LexiconSource, SearchMode};
