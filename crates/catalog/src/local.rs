//! In-process catalog search
//!
//! Searches the flattened entries in stages; the first stage that yields
//! anything wins:
//!
//! 1. very short queries without a digit never match
//! 2. exact order number, then digits-only order number
//! 3. title-first: substring either way, else title token recall
//! 4. literal token recall against the synonym-expanded blob
//! 5. fuzzy token-set similarity against "title variant category"
//! 6. semantic: cosine similarity of embeddings, only with an embedder
//!
//! Entries and their vectors live behind one `Arc` that a rebuild replaces in
//! one write, so a search always runs over a single consistent index. The
//! scans and file I/O run on the blocking pool.

use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use catalog_chat_config::constants::catalog::MIN_RECALL;
use catalog_chat_config::{CatalogConfig, EmbeddingConfig};
use catalog_chat_core::{CatalogBackend, CatalogHit, LexiconSource, SearchMode};
use catalog_chat_text_processing::normalize::has_digit;
use parking_lot::RwLock;

use crate::embeddings::{cosine_similarity, Embedder};
use crate::record::{flatten_products, load_products, search_normalize, CatalogEntry};
use crate::CatalogError;

/// Fuzzy candidates considered before truncating to `top_k`
const FUZZY_POOL: usize = 50;

/// Ranking knobs
#[derive(Debug, Clone, Copy)]
pub struct SearchTuning {
    pub top_k: usize,
    pub fuzzy_threshold: u8,
    pub min_recall: f32,
}

impl Default for SearchTuning {
    fn default() -> Self {
        Self {
            top_k: catalog_chat_config::constants::catalog::TOP_K,
            fuzzy_threshold: catalog_chat_config::constants::catalog::FUZZY_THRESHOLD,
            min_recall: MIN_RECALL,
        }
    }
}

impl From<&CatalogConfig> for SearchTuning {
    fn from(config: &CatalogConfig) -> Self {
        Self {
            top_k: config.top_k,
            fuzzy_threshold: config.fuzzy_threshold,
            min_recall: MIN_RECALL,
        }
    }
}

/// Entries with one embedding vector each, or no vectors at all
#[derive(Debug, Default)]
pub struct CatalogIndex {
    pub entries: Vec<CatalogEntry>,
    pub vectors: Vec<Vec<f32>>,
}

impl CatalogIndex {
    pub fn new(entries: Vec<CatalogEntry>) -> Self {
        Self {
            entries,
            vectors: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// True when every entry has a vector
    pub fn has_vectors(&self) -> bool {
        !self.entries.is_empty() && self.vectors.len() == self.entries.len()
    }
}

struct SemanticStage {
    embedder: Arc<dyn Embedder>,
    vectors_path: PathBuf,
    min_similarity: f32,
    batch_size: usize,
}

pub struct LocalCatalog {
    products_path: PathBuf,
    docs_path: PathBuf,
    tuning: SearchTuning,
    semantic: Option<SemanticStage>,
    index: RwLock<Arc<CatalogIndex>>,
}

impl LocalCatalog {
    /// Open the catalog and load the product file
    ///
    /// A missing or broken product file is logged and leaves the catalog
    /// empty until the next rebuild.
    pub fn open(config: &CatalogConfig) -> Self {
        let products_path = PathBuf::from(&config.products_path);
        let entries = match load_entries(&products_path) {
            Ok(entries) => {
                tracing::info!(
                    path = %products_path.display(),
                    entries = entries.len(),
                    "Catalog loaded"
                );
                entries
            }
            Err(e) => {
                tracing::warn!(
                    path = %products_path.display(),
                    error = %e,
                    "Catalog not loaded, starting empty"
                );
                Vec::new()
            }
        };

        Self {
            products_path,
            docs_path: PathBuf::from(&config.docs_path),
            tuning: SearchTuning::from(config),
            semantic: None,
            index: RwLock::new(Arc::new(CatalogIndex::new(entries))),
        }
    }

    /// Catalog over already flattened entries
    pub fn from_entries(entries: Vec<CatalogEntry>, tuning: SearchTuning) -> Self {
        Self {
            products_path: PathBuf::new(),
            docs_path: PathBuf::new(),
            tuning,
            semantic: None,
            index: RwLock::new(Arc::new(CatalogIndex::new(entries))),
        }
    }

    /// Enable the semantic stage
    ///
    /// Vectors stored by an earlier rebuild are picked up when their count
    /// matches the loaded entries; otherwise the stage stays idle until the
    /// next rebuild.
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>, config: &EmbeddingConfig) -> Self {
        let vectors_path = PathBuf::from(&config.vectors_path);
        match load_vectors(&vectors_path) {
            Ok(vectors) if vectors.len() == self.len() => {
                tracing::info!(vectors = vectors.len(), "Catalog vectors loaded");
                let entries = self.snapshot().entries.clone();
                *self.index.get_mut() = Arc::new(CatalogIndex { entries, vectors });
            }
            Ok(vectors) => {
                tracing::warn!(
                    vectors = vectors.len(),
                    entries = self.len(),
                    "Stored vectors do not match the catalog, rebuild to refresh"
                );
            }
            Err(e) => {
                tracing::info!(
                    path = %vectors_path.display(),
                    error = %e,
                    "No stored catalog vectors"
                );
            }
        }

        self.semantic = Some(SemanticStage {
            embedder,
            vectors_path,
            min_similarity: config.min_similarity,
            batch_size: config.batch_size.max(1),
        });
        self
    }

    /// Current index
    pub fn snapshot(&self) -> Arc<CatalogIndex> {
        Arc::clone(&self.index.read())
    }

    pub fn len(&self) -> usize {
        self.index.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lexical matches first, then the semantic stage when it is enabled
    pub async fn search_entries(
        &self,
        query: &str,
        mode: SearchMode,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let index = self.snapshot();
        let tuning = self.tuning;
        let owned = query.to_string();
        let scan = Arc::clone(&index);
        let hits = tokio::task::spawn_blocking(move || {
            lexical_matches(&scan.entries, &tuning, &owned, mode)
        })
        .await
        .map_err(|e| CatalogError::Task(e.to_string()))?;

        if !hits.is_empty() || mode == SearchMode::OrderNumberOnly {
            return Ok(hits);
        }
        match &self.semantic {
            Some(stage) if index.has_vectors() => self.semantic_matches(stage, index, query).await,
            _ => Ok(hits),
        }
    }

    async fn semantic_matches(
        &self,
        stage: &SemanticStage,
        index: Arc<CatalogIndex>,
        query: &str,
    ) -> Result<Vec<CatalogEntry>, CatalogError> {
        let norm_q = search_normalize(query);
        if too_short(&norm_q) {
            return Ok(Vec::new());
        }

        let query_vector = match stage.embedder.embed(&[norm_q]).await {
            Ok(mut vectors) if !vectors.is_empty() => vectors.swap_remove(0),
            Ok(_) => return Ok(Vec::new()),
            Err(e) => {
                tracing::warn!(error = %e, "Query embedding failed, skipping semantic stage");
                return Ok(Vec::new());
            }
        };

        let min_similarity = stage.min_similarity;
        let top_k = self.tuning.top_k;
        let hits = tokio::task::spawn_blocking(move || {
            semantic_ranking(&index, &query_vector, min_similarity, top_k)
        })
        .await
        .map_err(|e| CatalogError::Task(e.to_string()))?;

        if !hits.is_empty() {
            tracing::debug!(stage = "semantic", hits = hits.len(), "Catalog stage matched");
        }
        Ok(hits)
    }

    /// Re-read the product file, write the docs file, refresh vectors and swap
    pub async fn reload(&self) -> Result<usize, CatalogError> {
        let products_path = self.products_path.clone();
        let docs_path = self.docs_path.clone();
        let entries = tokio::task::spawn_blocking(move || {
            let entries = load_entries(&products_path)?;
            write_docs(&docs_path, &entries)?;
            Ok::<_, CatalogError>(entries)
        })
        .await
        .map_err(|e| CatalogError::Task(e.to_string()))??;

        let vectors = match &self.semantic {
            Some(stage) => embed_entries(stage, &entries).await,
            None => Vec::new(),
        };

        let count = entries.len();
        let with_vectors = vectors.len();
        *self.index.write() = Arc::new(CatalogIndex { entries, vectors });
        tracing::info!(
            entries = count,
            vectors = with_vectors,
            docs = %self.docs_path.display(),
            "Catalog index rebuilt"
        );
        Ok(count)
    }
}

fn load_entries(products_path: &Path) -> Result<Vec<CatalogEntry>, CatalogError> {
    let products = load_products(products_path)?;
    Ok(flatten_products(&products))
}

fn write_docs(docs_path: &Path, entries: &[CatalogEntry]) -> Result<(), CatalogError> {
    if docs_path.as_os_str().is_empty() {
        return Ok(());
    }
    if let Some(parent) = docs_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(docs_path, serde_json::to_string_pretty(entries)?)?;
    Ok(())
}

fn load_vectors(path: &Path) -> Result<Vec<Vec<f32>>, CatalogError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

/// Embed every entry blob in batches and store the vectors
///
/// Any embedding failure leaves the new index without vectors, which turns
/// the semantic stage off until the next successful rebuild.
async fn embed_entries(stage: &SemanticStage, entries: &[CatalogEntry]) -> Vec<Vec<f32>> {
    let mut vectors = Vec::with_capacity(entries.len());
    for batch in entries.chunks(stage.batch_size) {
        let texts: Vec<String> = batch.iter().map(|e| e.blob.clone()).collect();
        match stage.embedder.embed(&texts).await {
            Ok(batch_vectors) => vectors.extend(batch_vectors),
            Err(e) => {
                tracing::warn!(
                    model = stage.embedder.model(),
                    error = %e,
                    "Entry embedding failed, semantic stage disabled"
                );
                return Vec::new();
            }
        }
    }

    match serde_json::to_vec(&vectors) {
        Ok(bytes) => {
            if let Err(e) = tokio::fs::write(&stage.vectors_path, bytes).await {
                tracing::warn!(
                    path = %stage.vectors_path.display(),
                    error = %e,
                    "Failed to store catalog vectors"
                );
            }
        }
        Err(e) => tracing::warn!(error = %e, "Failed to encode catalog vectors"),
    }
    vectors
}

fn too_short(norm_q: &str) -> bool {
    norm_q.chars().count() <= 3 && !has_digit(norm_q)
}

/// Stages 1 to 5 over one entry list
pub fn lexical_matches(
    entries: &[CatalogEntry],
    tuning: &SearchTuning,
    query: &str,
    mode: SearchMode,
) -> Vec<CatalogEntry> {
    let norm_q = search_normalize(query);
    if too_short(&norm_q) {
        return Vec::new();
    }

    if let Some(hit) = order_number_match(entries, query) {
        return vec![hit.clone()];
    }
    if mode == SearchMode::OrderNumberOnly {
        return Vec::new();
    }

    let top_k = tuning.top_k;
    let min_recall = tuning.min_recall;

    let mut stage = "title";
    let mut hits = title_prefilter(entries, &norm_q, min_recall);
    if hits.is_empty() {
        stage = "literal";
        hits = literal_prefilter(entries, &norm_q, min_recall);
    }
    if hits.is_empty() {
        stage = "fuzzy";
        hits = fuzzy_matches(entries, &norm_q, tuning.fuzzy_threshold, top_k.max(FUZZY_POOL));
    }
    if !hits.is_empty() {
        tracing::debug!(stage, hits = hits.len(), "Catalog stage matched");
    }
    hits.into_iter().take(top_k).cloned().collect()
}

fn semantic_ranking(
    index: &CatalogIndex,
    query_vector: &[f32],
    min_similarity: f32,
    top_k: usize,
) -> Vec<CatalogEntry> {
    let mut scored: Vec<(f32, &CatalogEntry)> = index
        .vectors
        .iter()
        .zip(&index.entries)
        .map(|(vector, entry)| (cosine_similarity(query_vector, vector), entry))
        .filter(|(score, _)| *score >= min_similarity)
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().take(top_k).map(|(_, e)| e.clone()).collect()
}

/// Exact order number, then digits-only order number
fn order_number_match<'a>(entries: &'a [CatalogEntry], query: &str) -> Option<&'a CatalogEntry> {
    let raw = query.trim().to_lowercase();
    if let Some(entry) = entries
        .iter()
        .find(|e| !e.bestell_nr.is_empty() && e.bestell_nr.trim().to_lowercase() == raw)
    {
        return Some(entry);
    }

    let digits: String = query.chars().filter(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }
    entries.iter().find(|e| e.bestell_digits == digits)
}

fn title_prefilter<'a>(entries: &'a [CatalogEntry], norm_q: &str, min_recall: f32) -> Vec<&'a CatalogEntry> {
    let q_tokens: Vec<&str> = norm_q.split_whitespace().collect();
    if q_tokens.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f32, &CatalogEntry)> = Vec::new();
    for entry in entries {
        let title = entry.title_norm.as_str();
        if title.is_empty() {
            continue;
        }
        if title.contains(norm_q) || norm_q.contains(title) {
            scored.push((1.0, entry));
            continue;
        }
        let title_tokens: HashSet<&str> = title.split_whitespace().collect();
        let hits = q_tokens.iter().filter(|t| title_tokens.contains(*t)).count();
        if hits == 0 {
            continue;
        }
        let recall = hits as f32 / q_tokens.len() as f32;
        if recall >= min_recall {
            scored.push((recall, entry));
        }
    }

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.into_iter().map(|(_, e)| e).collect()
}

fn literal_prefilter<'a>(entries: &'a [CatalogEntry], norm_q: &str, min_recall: f32) -> Vec<&'a CatalogEntry> {
    let q_tokens: Vec<&str> = norm_q.split_whitespace().collect();
    if q_tokens.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f32, usize, &CatalogEntry)> = Vec::new();
    for entry in entries {
        let hits = q_tokens.iter().filter(|t| entry.blob.contains(*t)).count();
        if hits == 0 {
            continue;
        }
        let recall = hits as f32 / q_tokens.len() as f32;
        if recall >= min_recall {
            scored.push((recall, hits, entry));
        }
    }

    scored.sort_by(|a, b| {
        b.0.partial_cmp(&a.0)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.1.cmp(&a.1))
    });
    scored.into_iter().map(|(_, _, e)| e).collect()
}

fn fuzzy_matches<'a>(
    entries: &'a [CatalogEntry],
    norm_q: &str,
    threshold: u8,
    limit: usize,
) -> Vec<&'a CatalogEntry> {
    let mut scored: Vec<(f64, &CatalogEntry)> = entries
        .iter()
        .map(|e| (fuzzy_score(norm_q, e), e))
        .filter(|(score, _)| *score >= f64::from(threshold))
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
    scored.truncate(limit);
    scored.into_iter().map(|(_, e)| e).collect()
}

/// Best of the title alone and the full "title variant category" key
fn fuzzy_score(norm_q: &str, entry: &CatalogEntry) -> f64 {
    let key = search_normalize(&entry.fuzzy_key());
    token_set_ratio(norm_q, &entry.title_norm).max(token_set_ratio(norm_q, &key))
}

/// Token-set similarity on a 0-100 scale
///
/// Compares the sorted token intersection with each side's remainder and keeps
/// the best pairwise score. A full token subset scores 100. Pairwise scores
/// use normalized Levenshtein similarity.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let a_tokens: BTreeSet<&str> = a.split_whitespace().collect();
    let b_tokens: BTreeSet<&str> = b.split_whitespace().collect();
    if a_tokens.is_empty() || b_tokens.is_empty() {
        return 0.0;
    }

    let common: Vec<&str> = a_tokens.intersection(&b_tokens).copied().collect();
    let only_a: Vec<&str> = a_tokens.difference(&b_tokens).copied().collect();
    let only_b: Vec<&str> = b_tokens.difference(&a_tokens).copied().collect();

    if !common.is_empty() && (only_a.is_empty() || only_b.is_empty()) {
        return 100.0;
    }

    let common = common.join(" ");
    let with_a = join_nonempty(&common, &only_a.join(" "));
    let with_b = join_nonempty(&common, &only_b.join(" "));

    [
        ratio(&common, &with_a),
        ratio(&common, &with_b),
        ratio(&with_a, &with_b),
    ]
    .into_iter()
    .fold(0.0, f64::max)
}

fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    strsim::normalized_levenshtein(a, b) * 100.0
}

fn join_nonempty(a: &str, b: &str) -> String {
    match (a.is_empty(), b.is_empty()) {
        (true, _) => b.to_string(),
        (_, true) => a.to_string(),
        _ => format!("{} {}", a, b),
    }
}

#[async_trait]
impl CatalogBackend for LocalCatalog {
    async fn search(&self, query: &str, mode: SearchMode) -> catalog_chat_core::Result<Option<CatalogHit>> {
        let hits = self.search_entries(query, mode).await?;
        if hits.is_empty() {
            tracing::debug!(query = %query, ?mode, "No local catalog hit");
            return Ok(None);
        }
        let text = hits
            .iter()
            .map(CatalogEntry::render)
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(Some(CatalogHit::new(text).with_matches(hits.len())))
    }

    async fn rebuild(&self) -> catalog_chat_core::Result<usize> {
        Ok(self.reload().await?)
    }

    fn name(&self) -> &str {
        "local"
    }

    fn entry_count(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl LexiconSource for LocalCatalog {
    fn record_texts(&self) -> catalog_chat_core::Result<Vec<String>> {
        Ok(self
            .snapshot()
            .entries
            .iter()
            .map(CatalogEntry::lexicon_text)
            .collect())
    }
}
