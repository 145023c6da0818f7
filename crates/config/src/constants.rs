//! Centralized constants and defaults
//!
//! Single source of truth for endpoints, timeouts and search thresholds used
//! across the workspace.

/// External service endpoints (defaults)
pub mod endpoints {
    /// OpenAI-compatible chat completions base URL
    pub const FALLBACK_DEFAULT: &str = "https://api.openai.com/v1";

    /// Open-Meteo geocoding
    pub const GEOCODING_DEFAULT: &str = "https://geocoding-api.open-meteo.com/v1/search";

    /// Open-Meteo forecast
    pub const FORECAST_DEFAULT: &str = "https://api.open-meteo.com/v1/forecast";

    /// NewsAPI-compatible top headlines
    pub const NEWS_DEFAULT: &str = "https://newsapi.org/v2/top-headlines";

    /// DuckDuckGo instant answers
    pub const WEB_SEARCH_DEFAULT: &str = "https://api.duckduckgo.com/";

    /// Wikipedia REST base, `{lang}` is substituted
    pub const ENCYCLOPEDIA_DEFAULT: &str = "https://{lang}.wikipedia.org/api/rest_v1/page/summary";

    /// REST Countries v3.1 base; `/name` and `/translation` are appended
    pub const COUNTRIES_DEFAULT: &str = "https://restcountries.com/v3.1";

    /// Ollama-compatible embedding server; `/api/embed` is appended
    pub const EMBEDDING_DEFAULT: &str = "http://localhost:11434";
}

/// Timeouts (milliseconds unless named otherwise)
pub mod timeouts {
    /// Whole HTTP request; must outlast every downstream budget below
    pub const REQUEST_SECONDS: u64 = 330;

    /// Catalog search call
    pub const CATALOG_SEARCH_MS: u64 = 15_000;

    /// Catalog index rebuild (long-running)
    pub const CATALOG_REBUILD_MS: u64 = 300_000;

    /// Generative fallback call
    pub const FALLBACK_MS: u64 = 20_000;

    /// Utility HTTP clients
    pub const INTEGRATION_MS: u64 = 8_000;

    /// One embedding HTTP request
    pub const EMBEDDING_MS: u64 = 10_000;
}

/// Catalog search tuning
pub mod catalog {
    /// Maximum matches rendered per reply
    pub const TOP_K: usize = 25;

    /// Minimum fuzzy token-set score (0-100)
    pub const FUZZY_THRESHOLD: u8 = 68;

    /// Minimum token recall for title and literal stages
    pub const MIN_RECALL: f32 = 0.6;

    /// Replies longer than this are cut at a line boundary
    pub const MAX_REPLY_CHARS: usize = 3_500;

    pub const PRODUCTS_PATH: &str = "data/kellen_produkte.json";
    pub const DOCS_PATH: &str = "data/catalog_docs.json";
    pub const VECTORS_PATH: &str = "data/catalog_vectors.json";

    /// Multilingual sentence embedding model
    pub const EMBEDDING_MODEL: &str = "paraphrase-multilingual";

    /// Minimum cosine similarity for a semantic hit
    pub const MIN_SIMILARITY: f32 = 0.35;

    /// Texts per embedding request during a rebuild
    pub const EMBEDDING_BATCH: usize = 32;
}

/// User-facing reply texts
pub mod replies {
    /// Fixed acknowledgement when the generative fallback is disabled
    pub const FALLBACK_DISABLED: &str = "👍 Nachricht erhalten.";

    /// City used when a weather request names none
    pub const DEFAULT_WEATHER_CITY: &str = "Berlin";
}
