//! Product lexicon
//!
//! A set of normalized tokens mined from catalog record texts, unioned with a
//! curated hint list of trade vocabulary and brand names. The store publishes
//! immutable snapshots: readers grab an `Arc<Lexicon>` and never observe a
//! half-built set, and a rebuild replaces the whole snapshot in one swap.

use std::collections::HashSet;
use std::sync::Arc;

use arc_swap::ArcSwap;
use catalog_chat_core::LexiconSource;
use serde::Serialize;

use crate::normalize::tokenize;

/// Curated tool vocabulary and brand names, always part of the lexicon
pub const DEFAULT_HINTS: &[&str] = &[
    // Trowels and spatulas
    "spachtel",
    "kelle",
    "kellen",
    "traufel",
    "glätter",
    "glättekelle",
    "flächenspachtel",
    "japanspachtel",
    "zahnspachtel",
    "malerspachtel",
    "fugenkelle",
    "maurerkelle",
    "venezianerkelle",
    "spitzkelle",
    "zahnung",
    // Boards and floats
    "reibebrett",
    "schwammbrett",
    "filzbrett",
    "fugbrett",
    "abziehleiste",
    "kartätsche",
    // Brushes and rollers
    "pinsel",
    "quast",
    "bürste",
    "farbroller",
    "walze",
    // Mixing
    "rührer",
    "quirl",
    "mörteleimer",
    "mörtel",
    "eimer",
    // Materials and parts
    "edelstahl",
    "federstahl",
    "holzgriff",
    "softgriff",
    "klinge",
    "putz",
    "fliesen",
    // Brands
    "storch",
    "pajarito",
    "rubi",
    "collomix",
    "nespoli",
];

/// Immutable lexicon snapshot
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    mined: HashSet<String>,
    hints: Arc<HashSet<String>>,
}

impl Lexicon {
    pub fn new(mined: HashSet<String>, hints: Arc<HashSet<String>>) -> Self {
        Self { mined, hints }
    }

    /// Membership test for an already normalized token
    pub fn contains(&self, token: &str) -> bool {
        self.mined.contains(token) || self.hints.contains(token)
    }

    /// Membership in the curated hint list alone, ignoring mined tokens
    pub fn is_hint(&self, token: &str) -> bool {
        self.hints.contains(token)
    }

    pub fn stats(&self) -> LexiconStats {
        LexiconStats {
            mined: self.mined.len(),
            hints: self.hints.len(),
        }
    }
}

/// Sizes reported by the health endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LexiconStats {
    pub mined: usize,
    pub hints: usize,
}

/// Mine the token set from record texts
pub fn mine_tokens<S: AsRef<str>>(texts: &[S]) -> HashSet<String> {
    texts.iter().flat_map(|t| tokenize(t.as_ref())).collect()
}

/// Atomically swappable holder of the current lexicon
pub struct LexiconStore {
    hints: Arc<HashSet<String>>,
    current: ArcSwap<Lexicon>,
}

impl LexiconStore {
    /// Store with the given hint words and an empty mined set
    pub fn new<I, S>(hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let hints: Arc<HashSet<String>> = Arc::new(
            hints
                .into_iter()
                .flat_map(|h| tokenize(h.as_ref()))
                .collect(),
        );
        let initial = Lexicon::new(HashSet::new(), Arc::clone(&hints));
        Self {
            hints,
            current: ArcSwap::from_pointee(initial),
        }
    }

    pub fn with_default_hints() -> Self {
        Self::new(DEFAULT_HINTS.iter().copied())
    }

    /// Current snapshot; stays valid even if a rebuild swaps in a new one
    pub fn snapshot(&self) -> Arc<Lexicon> {
        self.current.load_full()
    }

    /// Rebuild the mined set from a record source and publish it
    ///
    /// A failing source is logged and yields an empty mined set; the hint
    /// words remain. Returns the size of the new mined set.
    pub fn rebuild(&self, source: &dyn LexiconSource) -> usize {
        let mined = match source.record_texts() {
            Ok(texts) => mine_tokens(&texts),
            Err(e) => {
                tracing::warn!(error = %e, "Lexicon source unavailable, continuing with hints only");
                HashSet::new()
            }
        };
        self.publish(mined)
    }

    /// Publish an already mined token set
    pub fn publish(&self, mined: HashSet<String>) -> usize {
        let size = mined.len();
        self.current
            .store(Arc::new(Lexicon::new(mined, Arc::clone(&self.hints))));
        tracing::info!(mined = size, hints = self.hints.len(), "Lexicon published");
        size
    }

    pub fn stats(&self) -> LexiconStats {
        self.current.load().stats()
    }
}

impl Default for LexiconStore {
    fn default() -> Self {
        Self::with_default_hints()
    }
}
