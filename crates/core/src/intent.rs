//! Intent tags
//!
//! Exactly one `Intent` is assigned per inbound message. Variants carry the
//! arguments their handler needs, parsed once during classification.

use serde::{Deserialize, Serialize};

/// The single classification assigned to an inbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Rebuild the catalog index and the lexicon
    RebuildIndex,
    /// Explicit catalog search command; catalog-bound regardless of product likelihood
    ExplicitCatalogSearch { query: String },
    /// Weather forecast for a city (today or tomorrow)
    Weather { city: Option<String>, tomorrow: bool },
    /// Headlines, optionally for a topic
    News { topic: Option<String> },
    /// General web search
    WebSearch { query: String },
    /// Capital of a country
    CapitalLookup { country: String },
    /// Successfully evaluated arithmetic expression
    Arithmetic { value: f64 },
    /// Encyclopedia summary
    Encyclopedia { topic: String },
    /// Product-shaped message answered only from the catalog
    CatalogProduct { query: String },
    /// Everything else
    ChitChatFallback,
}

/// Field-less mirror of [`Intent`], used for labels and assertions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    RebuildIndex,
    ExplicitCatalogSearch,
    Weather,
    News,
    WebSearch,
    CapitalLookup,
    Arithmetic,
    Encyclopedia,
    CatalogProduct,
    ChitChatFallback,
}

impl IntentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RebuildIndex => "rebuild_index",
            Self::ExplicitCatalogSearch => "explicit_catalog_search",
            Self::Weather => "weather",
            Self::News => "news",
            Self::WebSearch => "web_search",
            Self::CapitalLookup => "capital_lookup",
            Self::Arithmetic => "arithmetic",
            Self::Encyclopedia => "encyclopedia",
            Self::CatalogProduct => "catalog_product",
            Self::ChitChatFallback => "chit_chat_fallback",
        }
    }
}

impl std::fmt::Display for IntentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Self::RebuildIndex => IntentKind::RebuildIndex,
            Self::ExplicitCatalogSearch { .. } => IntentKind::ExplicitCatalogSearch,
            Self::Weather { .. } => IntentKind::Weather,
            Self::News { .. } => IntentKind::News,
            Self::WebSearch { .. } => IntentKind::WebSearch,
            Self::CapitalLookup { .. } => IntentKind::CapitalLookup,
            Self::Arithmetic { .. } => IntentKind::Arithmetic,
            Self::Encyclopedia { .. } => IntentKind::Encyclopedia,
            Self::CatalogProduct { .. } => IntentKind::CatalogProduct,
            Self::ChitChatFallback => IntentKind::ChitChatFallback,
        }
    }

    /// Request for an external utility client, if this intent needs one
    pub fn utility_request(&self) -> Option<UtilityRequest> {
        match self {
            Self::Weather { city, tomorrow } => Some(UtilityRequest::Weather {
                city: city.clone(),
                tomorrow: *tomorrow,
            }),
            Self::News { topic } => Some(UtilityRequest::News {
                topic: topic.clone(),
            }),
            Self::WebSearch { query } => Some(UtilityRequest::WebSearch {
                query: query.clone(),
            }),
            Self::CapitalLookup { country } => Some(UtilityRequest::Capital {
                country: country.clone(),
            }),
            Self::Encyclopedia { topic } => Some(UtilityRequest::Encyclopedia {
                topic: topic.clone(),
            }),
            _ => None,
        }
    }
}

/// Utility client families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilityKind {
    Weather,
    News,
    WebSearch,
    Encyclopedia,
    Capital,
}

impl UtilityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::News => "news",
            Self::WebSearch => "web_search",
            Self::Encyclopedia => "encyclopedia",
            Self::Capital => "capital",
        }
    }
}

/// Parsed request handed to a utility client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UtilityRequest {
    Weather { city: Option<String>, tomorrow: bool },
    News { topic: Option<String> },
    WebSearch { query: String },
    Encyclopedia { topic: String },
    Capital { country: String },
}

impl UtilityRequest {
    pub fn kind(&self) -> UtilityKind {
        match self {
            Self::Weather { .. } => UtilityKind::Weather,
            Self::News { .. } => UtilityKind::News,
            Self::WebSearch { .. } => UtilityKind::WebSearch,
            Self::Encyclopedia { .. } => UtilityKind::Encyclopedia,
            Self::Capital { .. } => UtilityKind::Capital,
        }
    }
}
