//! Catalog gateway
//!
//! Sits between the dispatcher and a [`CatalogBackend`]. Cleans the query,
//! bounds the backend call with a timeout and turns every outcome into either
//! the result text or a [`LookupFailure`]. The caller decides what to say on
//! failure; the gateway never produces an answer of its own.

use std::sync::Arc;
use std::time::{Duration, Instant};

use catalog_chat_config::CatalogConfig;
use catalog_chat_core::{CatalogBackend, Error, SearchMode};
use catalog_chat_text_processing::looks_like_order_number;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static COMMAND_PREFIX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(?:/katalog|/catalog|/produkt|/product|/search-catalog|/suche-katalog|!katalog|!catalog)\b:?")
        .expect("valid regex")
});

static FILLER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:bitte|please|ich suche|ich brauche|haben sie|habt ihr|gibt es|",
        r"do you have|i need|i am looking for|i'm looking for|show me|zeig mir)\b"
    ))
    .expect("valid regex")
});

/// Why a lookup produced no catalog text
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupFailure {
    #[error("Leere Suchanfrage")]
    EmptyQuery,

    #[error("Katalog nicht erreichbar: {0}")]
    Unavailable(String),

    #[error("Leeres Suchergebnis")]
    EmptyResult,

    #[error("Kein Treffer")]
    NoMatch,

    #[error("Zeitüberschreitung nach {0}ms")]
    Timeout(u64),
}

/// Strip command prefixes and polite filler; digits, dots and case survive
pub fn clean_query(query: &str) -> String {
    let without_prefix = COMMAND_PREFIX.replace(query, "");
    let without_filler = FILLER.replace_all(&without_prefix, " ");
    without_filler
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| "?!,;:".contains(c) || c.is_whitespace())
        .to_string()
}

/// Cut a reply at a line boundary, marking the cut with "…"
pub fn truncate_reply(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let budget = max_chars.saturating_sub(2);
    let mut out = String::new();
    let mut used = 0;
    for line in text.lines() {
        let len = line.chars().count() + usize::from(!out.is_empty());
        if used + len > budget {
            break;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
        used += len;
    }
    if out.is_empty() {
        out = text.chars().take(budget).collect();
    }
    out.push_str("\n…");
    out
}

pub struct CatalogGateway {
    backend: Arc<dyn CatalogBackend>,
    timeout: Duration,
    rebuild_timeout: Duration,
    max_reply_chars: usize,
}

impl CatalogGateway {
    pub fn new(backend: Arc<dyn CatalogBackend>, config: &CatalogConfig) -> Self {
        Self {
            backend,
            timeout: Duration::from_millis(config.timeout_ms),
            rebuild_timeout: Duration::from_millis(config.rebuild_timeout_ms),
            max_reply_chars: config.max_reply_chars,
        }
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    pub fn entry_count(&self) -> Option<usize> {
        self.backend.entry_count()
    }

    /// Look up a query; `Ok` carries the backend's result text
    pub async fn lookup(&self, query: &str) -> Result<String, LookupFailure> {
        let cleaned = clean_query(query);
        if cleaned.is_empty() {
            return Err(LookupFailure::EmptyQuery);
        }

        let started = Instant::now();
        let result = if looks_like_order_number(&cleaned) {
            match self.search(&cleaned, SearchMode::OrderNumberOnly).await {
                Err(LookupFailure::NoMatch) => self.search(&cleaned, SearchMode::Full).await,
                other => other,
            }
        } else {
            self.search(&cleaned, SearchMode::Full).await
        };

        match &result {
            Ok(_) => tracing::debug!(
                query = %cleaned,
                backend = self.backend.name(),
                latency_ms = started.elapsed().as_millis() as u64,
                "Catalog hit"
            ),
            Err(failure) => tracing::info!(
                query = %cleaned,
                backend = self.backend.name(),
                reason = %failure,
                "Catalog lookup failed"
            ),
        }
        result.map(|text| truncate_reply(&text, self.max_reply_chars))
    }

    async fn search(&self, query: &str, mode: SearchMode) -> Result<String, LookupFailure> {
        let outcome = tokio::time::timeout(self.timeout, self.backend.search(query, mode)).await;
        match outcome {
            Err(_) => Err(LookupFailure::Timeout(self.timeout.as_millis() as u64)),
            Ok(Err(e)) => Err(failure_from_error(e)),
            Ok(Ok(None)) => Err(LookupFailure::NoMatch),
            Ok(Ok(Some(hit))) if hit.text.trim().is_empty() => Err(LookupFailure::EmptyResult),
            Ok(Ok(Some(hit))) => Ok(hit.text),
        }
    }

    /// Rebuild the backend index; returns the entry count
    pub async fn rebuild(&self) -> catalog_chat_core::Result<usize> {
        match tokio::time::timeout(self.rebuild_timeout, self.backend.rebuild()).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(self.rebuild_timeout.as_millis() as u64)),
        }
    }
}

fn failure_from_error(err: Error) -> LookupFailure {
    match err {
        Error::Timeout(ms) => LookupFailure::Timeout(ms),
        other => {
            tracing::warn!(error = %other, "Catalog backend error");
            LookupFailure::Unavailable(other.to_string())
        }
    }
}
