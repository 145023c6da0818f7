//! Utility registry
//!
//! Maps each [`UtilityKind`] to one client and runs it under a timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use catalog_chat_config::IntegrationsConfig;
use catalog_chat_core::{UtilityKind, UtilityRequest};
use parking_lot::RwLock;

use crate::{
    CapitalClient, EncyclopediaClient, IntegrationError, NewsClient, WeatherClient,
    WebSearchClient,
};

/// A client answering one family of utility requests
#[async_trait]
pub trait UtilityTool: Send + Sync {
    /// The request family this client serves
    fn kind(&self) -> UtilityKind;

    /// Fetch and format a reply
    async fn fetch(&self, request: &UtilityRequest) -> Result<String, IntegrationError>;

    /// Per-call timeout, `None` uses the registry default
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

/// Registry of utility clients
pub struct UtilityRegistry {
    tools: RwLock<HashMap<UtilityKind, Arc<dyn UtilityTool>>>,
    default_timeout: Duration,
}

impl UtilityRegistry {
    pub fn new(default_timeout: Duration) -> Self {
        Self {
            tools: RwLock::new(HashMap::new()),
            default_timeout,
        }
    }

    /// Registry with all five HTTP clients configured
    pub fn from_config(config: &IntegrationsConfig) -> Result<Self, IntegrationError> {
        let registry = Self::new(Duration::from_millis(config.timeout_ms));
        registry.register(WeatherClient::from_config(config)?);
        registry.register(NewsClient::from_config(config)?);
        registry.register(WebSearchClient::from_config(config)?);
        registry.register(EncyclopediaClient::from_config(config)?);
        registry.register(CapitalClient::from_config(config)?);

        tracing::info!(
            tools = registry.len(),
            timeout_ms = config.timeout_ms,
            "Utility registry initialized"
        );
        Ok(registry)
    }

    /// Register a client, replacing any previous one of the same kind
    pub fn register<T: UtilityTool + 'static>(&self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&self, tool: Arc<dyn UtilityTool>) {
        let kind = tool.kind();
        if self.tools.write().insert(kind, tool).is_some() {
            tracing::debug!(kind = kind.as_str(), "Replaced utility client");
        }
    }

    pub fn has(&self, kind: UtilityKind) -> bool {
        self.tools.read().contains_key(&kind)
    }

    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }

    /// Run the client for `request` under its timeout
    pub async fn execute(&self, request: &UtilityRequest) -> Result<String, IntegrationError> {
        let kind = request.kind();
        // Clone out so the lock is not held across the await
        let tool = self.tools.read().get(&kind).cloned();
        let tool = tool.ok_or_else(|| {
            IntegrationError::NotConfigured(format!("No client for {}", kind.as_str()))
        })?;

        let timeout = tool.timeout().unwrap_or(self.default_timeout);
        match tokio::time::timeout(timeout, tool.fetch(request)).await {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(IntegrationError::Timeout(_))) => {
                Err(IntegrationError::Timeout(timeout.as_millis() as u64))
            },
            Ok(Err(e)) => {
                tracing::warn!(kind = kind.as_str(), error = %e, "Utility call failed");
                Err(e)
            },
            Err(_elapsed) => {
                tracing::warn!(
                    kind = kind.as_str(),
                    timeout_ms = timeout.as_millis() as u64,
                    "Utility call timed out"
                );
                Err(IntegrationError::Timeout(timeout.as_millis() as u64))
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);

    #[async_trait]
    impl UtilityTool for Fixed {
        fn kind(&self) -> UtilityKind {
            UtilityKind::Capital
        }

        async fn fetch(&self, _request: &UtilityRequest) -> Result<String, IntegrationError> {
            Ok(self.0.to_string())
        }
    }

    struct Slow;

    #[async_trait]
    impl UtilityTool for Slow {
        fn kind(&self) -> UtilityKind {
            UtilityKind::News
        }

        async fn fetch(&self, _request: &UtilityRequest) -> Result<String, IntegrationError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".into())
        }

        fn timeout(&self) -> Option<Duration> {
            Some(Duration::from_millis(20))
        }
    }

    #[tokio::test]
    async fn test_execute_routes_by_kind() {
        let registry = UtilityRegistry::new(Duration::from_secs(1));
        registry.register(Fixed("Paris"));
        assert!(registry.has(UtilityKind::Capital));

        let reply = registry
            .execute(&UtilityRequest::Capital {
                country: "Frankreich".into(),
            })
            .await
            .unwrap();
        assert_eq!(reply, "Paris");
    }

    #[tokio::test]
    async fn test_missing_client() {
        let registry = UtilityRegistry::new(Duration::from_secs(1));
        let err = registry
            .execute(&UtilityRequest::WebSearch { query: "rust".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_timeout() {
        let registry = UtilityRegistry::new(Duration::from_secs(10));
        registry.register(Slow);
        let err = registry
            .execute(&UtilityRequest::News { topic: None })
            .await
            .unwrap_err();
        assert!(matches!(err, IntegrationError::Timeout(20)));
    }

    #[test]
    fn test_from_config_registers_all() {
        let registry = UtilityRegistry::from_config(&IntegrationsConfig::default()).unwrap();
        assert_eq!(registry.len(), 5);
    }
}
