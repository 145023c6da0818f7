//! Main settings module

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::constants::{catalog, endpoints, replies, timeouts};
use crate::ConfigError;

/// Runtime environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeEnvironment {
    /// Development mode - relaxed validation, warnings only
    #[default]
    Development,
    /// Staging mode - stricter validation
    Staging,
    /// Production mode - all validations enforced
    Production,
}

impl RuntimeEnvironment {
    /// Check if this is a production environment
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    /// Check if strict validation should be applied
    pub fn is_strict(&self) -> bool {
        matches!(self, Self::Production | Self::Staging)
    }
}

/// Main application settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    /// Runtime environment (development, staging, production)
    #[serde(default)]
    pub environment: RuntimeEnvironment,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Catalog backend configuration
    #[serde(default)]
    pub catalog: CatalogConfig,

    /// Generative fallback configuration
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Utility client endpoints
    #[serde(default)]
    pub integrations: IntegrationsConfig,

    /// Inbound message filtering
    #[serde(default)]
    pub transport: TransportConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl Settings {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_server()?;
        self.validate_catalog()?;
        self.validate_fallback()?;
        self.validate_integrations()?;
        self.validate_request_budget()?;
        Ok(())
    }

    fn validate_server(&self) -> Result<(), ConfigError> {
        let server = &self.server;

        if server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port".to_string(),
                message: "Port cannot be 0".to_string(),
            });
        }

        if server.request_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.request_timeout_seconds".to_string(),
                message: "Timeout must be at least 1 second".to_string(),
            });
        }

        if self.environment.is_production() && server.cors_enabled && server.cors_origins.is_empty()
        {
            tracing::warn!(
                "CORS is enabled in production but no origins are configured. \
                 This may block legitimate requests."
            );
        }

        Ok(())
    }

    fn validate_catalog(&self) -> Result<(), ConfigError> {
        let catalog = &self.catalog;

        if catalog.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "catalog.timeout_ms".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if catalog.rebuild_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "catalog.rebuild_timeout_ms".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if catalog.top_k == 0 {
            return Err(ConfigError::InvalidValue {
                field: "catalog.top_k".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if catalog.fuzzy_threshold > 100 {
            return Err(ConfigError::InvalidValue {
                field: "catalog.fuzzy_threshold".to_string(),
                message: format!("Must be between 0 and 100, got {}", catalog.fuzzy_threshold),
            });
        }

        if catalog.backend == CatalogBackendKind::Subprocess
            && catalog.command.as_deref().map_or(true, |c| c.trim().is_empty())
        {
            return Err(ConfigError::MissingField("catalog.command".to_string()));
        }

        let embeddings = &catalog.embeddings;
        if embeddings.enabled {
            if embeddings.endpoint.trim().is_empty() {
                return Err(ConfigError::MissingField("catalog.embeddings.endpoint".to_string()));
            }
            if embeddings.model.trim().is_empty() {
                return Err(ConfigError::MissingField("catalog.embeddings.model".to_string()));
            }
            if embeddings.timeout_ms == 0 || embeddings.batch_size == 0 {
                return Err(ConfigError::InvalidValue {
                    field: "catalog.embeddings".to_string(),
                    message: "timeout_ms and batch_size must be at least 1".to_string(),
                });
            }
            if !(-1.0..=1.0).contains(&embeddings.min_similarity) {
                return Err(ConfigError::InvalidValue {
                    field: "catalog.embeddings.min_similarity".to_string(),
                    message: format!(
                        "Must be between -1.0 and 1.0, got {}",
                        embeddings.min_similarity
                    ),
                });
            }
        }

        Ok(())
    }

    fn validate_fallback(&self) -> Result<(), ConfigError> {
        let fallback = &self.fallback;

        if fallback.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fallback.timeout_ms".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }

        if !(0.0..=2.0).contains(&fallback.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "fallback.temperature".to_string(),
                message: format!("Must be between 0.0 and 2.0, got {}", fallback.temperature),
            });
        }

        if fallback.enabled && fallback.api_key.is_none() {
            if self.environment.is_production() {
                return Err(ConfigError::InvalidValue {
                    field: "fallback.api_key".to_string(),
                    message: "API key must be set when the fallback is enabled in production"
                        .to_string(),
                });
            }
            tracing::warn!("Generative fallback enabled without an API key");
        }

        Ok(())
    }

    fn validate_integrations(&self) -> Result<(), ConfigError> {
        if self.integrations.timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "integrations.timeout_ms".to_string(),
                message: "Must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// The HTTP request timeout must outlast the slowest call a request can make
    ///
    /// A catalog lookup may search twice and a utility may call its upstream
    /// twice, so both count double.
    fn validate_request_budget(&self) -> Result<(), ConfigError> {
        let budget_ms = self
            .catalog
            .rebuild_timeout_ms
            .max(self.catalog.timeout_ms.saturating_mul(2))
            .max(self.fallback.timeout_ms)
            .max(self.integrations.timeout_ms.saturating_mul(2));
        let request_ms = self.server.request_timeout_seconds.saturating_mul(1000);

        if request_ms <= budget_ms {
            return Err(ConfigError::InvalidValue {
                field: "server.request_timeout_seconds".to_string(),
                message: format!(
                    "Must exceed the slowest downstream budget of {}ms, got {}ms",
                    budget_ms, request_ms
                ),
            });
        }
        Ok(())
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Whole-request timeout for the HTTP surface
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    #[serde(default)]
    pub cors_enabled: bool,

    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_request_timeout() -> u64 {
    timeouts::REQUEST_SECONDS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_seconds: default_request_timeout(),
            cors_enabled: false,
            cors_origins: Vec::new(),
        }
    }
}

/// Which catalog backend implementation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum CatalogBackendKind {
    /// In-process search over the product file
    #[default]
    Local,
    /// External search process invoked per query
    Subprocess,
}

/// Catalog backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub backend: CatalogBackendKind,

    /// Raw product file (JSON array of products)
    #[serde(default = "default_products_path")]
    pub products_path: String,

    /// Flattened index written by rebuild
    #[serde(default = "default_docs_path")]
    pub docs_path: String,

    /// Search command for the subprocess backend
    #[serde(default)]
    pub command: Option<String>,

    /// Leading arguments for the subprocess backend
    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default = "default_catalog_timeout")]
    pub timeout_ms: u64,

    #[serde(default = "default_rebuild_timeout")]
    pub rebuild_timeout_ms: u64,

    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Minimum fuzzy score (0-100)
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: u8,

    #[serde(default = "default_max_reply_chars")]
    pub max_reply_chars: usize,

    /// Optional semantic stage of the local backend
    #[serde(default)]
    pub embeddings: EmbeddingConfig,
}

fn default_products_path() -> String {
    catalog::PRODUCTS_PATH.to_string()
}
fn default_docs_path() -> String {
    catalog::DOCS_PATH.to_string()
}
fn default_catalog_timeout() -> u64 {
    timeouts::CATALOG_SEARCH_MS
}
fn default_rebuild_timeout() -> u64 {
    timeouts::CATALOG_REBUILD_MS
}
fn default_top_k() -> usize {
    catalog::TOP_K
}
fn default_fuzzy_threshold() -> u8 {
    catalog::FUZZY_THRESHOLD
}
fn default_max_reply_chars() -> usize {
    catalog::MAX_REPLY_CHARS
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            backend: CatalogBackendKind::default(),
            products_path: default_products_path(),
            docs_path: default_docs_path(),
            command: None,
            args: Vec::new(),
            timeout_ms: default_catalog_timeout(),
            rebuild_timeout_ms: default_rebuild_timeout(),
            top_k: default_top_k(),
            fuzzy_threshold: default_fuzzy_threshold(),
            max_reply_chars: default_max_reply_chars(),
            embeddings: EmbeddingConfig::default(),
        }
    }
}

/// Embedding server used by the semantic search stage
///
/// Vectors for every entry are computed at rebuild and stored next to the
/// docs file. With `enabled: false` no embedding server is contacted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Entry vectors written by rebuild
    #[serde(default = "default_vectors_path")]
    pub vectors_path: String,

    /// Cosine similarity a semantic hit must reach
    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,

    #[serde(default = "default_embedding_batch")]
    pub batch_size: usize,

    /// Per HTTP request
    #[serde(default = "default_embedding_timeout")]
    pub timeout_ms: u64,
}

fn default_embedding_endpoint() -> String {
    endpoints::EMBEDDING_DEFAULT.to_string()
}
fn default_embedding_model() -> String {
    catalog::EMBEDDING_MODEL.to_string()
}
fn default_vectors_path() -> String {
    catalog::VECTORS_PATH.to_string()
}
fn default_min_similarity() -> f32 {
    catalog::MIN_SIMILARITY
}
fn default_embedding_batch() -> usize {
    catalog::EMBEDDING_BATCH
}
fn default_embedding_timeout() -> u64 {
    timeouts::EMBEDDING_MS
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_embedding_endpoint(),
            model: default_embedding_model(),
            vectors_path: default_vectors_path(),
            min_similarity: default_min_similarity(),
            batch_size: default_embedding_batch(),
            timeout_ms: default_embedding_timeout(),
        }
    }
}

/// Generative fallback configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackConfig {
    /// When false, chit-chat gets `disabled_reply` and no model is called
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_fallback_endpoint")]
    pub endpoint: String,

    #[serde(default = "default_api_key")]
    pub api_key: Option<String>,

    #[serde(default = "default_model")]
    pub model: String,

    /// Azure OpenAI API version; switches to deployment URLs and `api-key` auth
    #[serde(default)]
    pub api_version: Option<String>,

    #[serde(default = "default_fallback_timeout")]
    pub timeout_ms: u64,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: usize,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    #[serde(default = "default_disabled_reply")]
    pub disabled_reply: String,
}

fn default_true() -> bool {
    true
}
fn default_fallback_endpoint() -> String {
    endpoints::FALLBACK_DEFAULT.to_string()
}
fn default_api_key() -> Option<String> {
    std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.is_empty())
}
fn default_model() -> String {
    "gpt-4o-mini".to_string()
}
fn default_fallback_timeout() -> u64 {
    timeouts::FALLBACK_MS
}
fn default_max_tokens() -> usize {
    300
}
fn default_temperature() -> f32 {
    0.7
}
fn default_system_prompt() -> String {
    "Du bist ein freundlicher Assistent. Antworte kurz. \
     Erfinde niemals Produkte, Preise oder Bestellnummern."
        .to_string()
}
fn default_disabled_reply() -> String {
    replies::FALLBACK_DISABLED.to_string()
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_fallback_endpoint(),
            api_key: default_api_key(),
            model: default_model(),
            api_version: None,
            timeout_ms: default_fallback_timeout(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            system_prompt: default_system_prompt(),
            disabled_reply: default_disabled_reply(),
        }
    }
}

/// Utility client endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationsConfig {
    #[serde(default = "default_geocoding")]
    pub geocoding_endpoint: String,

    #[serde(default = "default_forecast")]
    pub forecast_endpoint: String,

    #[serde(default = "default_news")]
    pub news_endpoint: String,

    #[serde(default)]
    pub news_api_key: Option<String>,

    #[serde(default = "default_news_country")]
    pub news_country: String,

    #[serde(default = "default_web_search")]
    pub web_search_endpoint: String,

    #[serde(default = "default_encyclopedia")]
    pub encyclopedia_endpoint: String,

    #[serde(default = "default_encyclopedia_language")]
    pub encyclopedia_language: String,

    #[serde(default = "default_countries")]
    pub countries_endpoint: String,

    #[serde(default = "default_weather_city")]
    pub default_weather_city: String,

    #[serde(default = "default_integration_timeout")]
    pub timeout_ms: u64,
}

fn default_geocoding() -> String {
    endpoints::GEOCODING_DEFAULT.to_string()
}
fn default_forecast() -> String {
    endpoints::FORECAST_DEFAULT.to_string()
}
fn default_news() -> String {
    endpoints::NEWS_DEFAULT.to_string()
}
fn default_news_country() -> String {
    "de".to_string()
}
fn default_web_search() -> String {
    endpoints::WEB_SEARCH_DEFAULT.to_string()
}
fn default_encyclopedia() -> String {
    endpoints::ENCYCLOPEDIA_DEFAULT.to_string()
}
fn default_encyclopedia_language() -> String {
    "de".to_string()
}
fn default_countries() -> String {
    endpoints::COUNTRIES_DEFAULT.to_string()
}
fn default_weather_city() -> String {
    replies::DEFAULT_WEATHER_CITY.to_string()
}
fn default_integration_timeout() -> u64 {
    timeouts::INTEGRATION_MS
}

impl Default for IntegrationsConfig {
    fn default() -> Self {
        Self {
            geocoding_endpoint: default_geocoding(),
            forecast_endpoint: default_forecast(),
            news_endpoint: default_news(),
            news_api_key: None,
            news_country: default_news_country(),
            web_search_endpoint: default_web_search(),
            encyclopedia_endpoint: default_encyclopedia(),
            encyclopedia_language: default_encyclopedia_language(),
            countries_endpoint: default_countries(),
            default_weather_city: default_weather_city(),
            timeout_ms: default_integration_timeout(),
        }
    }
}

/// Inbound message filtering
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Drop messages authored by this process
    #[serde(default = "default_true")]
    pub drop_own_messages: bool,

    /// Drop messages from multi-party threads
    #[serde(default = "default_true")]
    pub drop_group_messages: bool,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            drop_own_messages: true,
            drop_group_messages: true,
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub log_json: bool,

    /// Enable metrics
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_json: false,
            metrics_enabled: true,
        }
    }
}

/// Load settings from files and environment
///
/// Priority (highest to lowest):
/// 1. Environment variables (CATALOG_CHAT_ prefix, `__` separator)
/// 2. config/{env}.yaml (if env specified)
/// 3. config/default.yaml
pub fn load_settings(env: Option<&str>) -> Result<Settings, ConfigError> {
    load_settings_from("config", env)
}

/// Same as [`load_settings`] with an explicit config directory
pub fn load_settings_from(config_dir: &str, env: Option<&str>) -> Result<Settings, ConfigError> {
    let mut builder = Config::builder();

    builder = builder
        .add_source(File::with_name(&format!("{}/default", config_dir)).required(false));

    if let Some(env_name) = env {
        builder = builder.add_source(
            File::with_name(&format!("{}/{}", config_dir, env_name)).required(false),
        );
    }

    builder = builder.add_source(
        Environment::with_prefix("CATALOG_CHAT")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;
    let settings: Settings = config.try_deserialize()?;

    settings.validate()?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.port, 8080);
        assert!(settings.fallback.enabled);
        assert_eq!(settings.catalog.backend, CatalogBackendKind::Local);
        assert_eq!(settings.catalog.fuzzy_threshold, 68);
        assert!(settings.transport.drop_group_messages);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_catalog_validation() {
        let mut settings = Settings::default();

        settings.catalog.top_k = 0;
        assert!(settings.validate_catalog().is_err());
        settings.catalog.top_k = 10;

        settings.catalog.fuzzy_threshold = 101;
        assert!(settings.validate_catalog().is_err());
        settings.catalog.fuzzy_threshold = 70;

        settings.catalog.timeout_ms = 0;
        assert!(settings.validate_catalog().is_err());
        settings.catalog.timeout_ms = 1000;

        assert!(settings.validate_catalog().is_ok());
    }

    #[test]
    fn test_subprocess_backend_requires_command() {
        let mut settings = Settings::default();
        settings.catalog.backend = CatalogBackendKind::Subprocess;
        assert!(matches!(
            settings.validate_catalog(),
            Err(ConfigError::MissingField(_))
        ));

        settings.catalog.command = Some("python3".to_string());
        assert!(settings.validate_catalog().is_ok());
    }

    #[test]
    fn test_fallback_validation() {
        let mut settings = Settings::default();

        settings.fallback.timeout_ms = 0;
        assert!(settings.validate_fallback().is_err());
        settings.fallback.timeout_ms = 5000;

        settings.fallback.temperature = 3.0;
        assert!(settings.validate_fallback().is_err());
        settings.fallback.temperature = 0.2;

        assert!(settings.validate_fallback().is_ok());
    }

    #[test]
    fn test_production_fallback_requires_key() {
        let mut settings = Settings::default();
        settings.environment = RuntimeEnvironment::Production;
        settings.fallback.enabled = true;
        settings.fallback.api_key = None;
        assert!(settings.validate_fallback().is_err());

        settings.fallback.api_key = Some("sk-test".to_string());
        assert!(settings.validate_fallback().is_ok());

        settings.fallback.api_key = None;
        settings.fallback.enabled = false;
        assert!(settings.validate_fallback().is_ok());
    }

    #[test]
    fn test_server_validation() {
        let mut settings = Settings::default();
        settings.server.port = 0;
        assert!(settings.validate_server().is_err());
        settings.server.port = 8080;

        settings.server.request_timeout_seconds = 0;
        assert!(settings.validate_server().is_err());
    }

    #[test]
    fn test_request_timeout_outlasts_rebuild() {
        let mut settings = Settings::default();
        assert!(settings.server.request_timeout_seconds * 1000 > settings.catalog.rebuild_timeout_ms);

        settings.server.request_timeout_seconds = 60;
        let err = settings.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "server.request_timeout_seconds")
        );

        settings.catalog.rebuild_timeout_ms = 45_000;
        assert!(settings.validate().is_ok());

        // two sequential catalog searches must also fit
        settings.catalog.timeout_ms = 30_000;
        assert!(settings.validate_request_budget().is_err());
    }

    #[test]
    fn test_embedding_validation() {
        let mut settings = Settings::default();
        settings.catalog.embeddings.model = String::new();
        // ignored while the stage is off
        assert!(settings.validate_catalog().is_ok());

        settings.catalog.embeddings.enabled = true;
        assert!(matches!(
            settings.validate_catalog(),
            Err(ConfigError::MissingField(_))
        ));
        settings.catalog.embeddings.model = "paraphrase-multilingual".to_string();

        settings.catalog.embeddings.min_similarity = 1.5;
        assert!(settings.validate_catalog().is_err());
        settings.catalog.embeddings.min_similarity = 0.4;

        assert!(settings.validate_catalog().is_ok());
    }

    #[test]
    fn test_load_from_yaml_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("default.yaml"),
            "server:\n  port: 9191\nfallback:\n  enabled: false\ncatalog:\n  top_k: 5\n",
        )
        .unwrap();

        let settings = load_settings_from(dir.path().to_str().unwrap(), None).unwrap();
        assert_eq!(settings.server.port, 9191);
        assert!(!settings.fallback.enabled);
        assert_eq!(settings.catalog.top_k, 5);
        assert_eq!(settings.catalog.fuzzy_threshold, 68);
    }

    #[test]
    fn test_environment_file_overrides_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("default.yaml"), "server:\n  port: 9000\n").unwrap();
        std::fs::write(dir.path().join("staging.yaml"), "server:\n  port: 9001\n").unwrap();

        let settings = load_settings_from(dir.path().to_str().unwrap(), Some("staging")).unwrap();
        assert_eq!(settings.server.port, 9001);
    }
}
