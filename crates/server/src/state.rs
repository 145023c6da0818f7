//! Application State
//!
//! Shared state across all handlers.

use std::sync::Arc;

use catalog_chat_agent::Dispatcher;
use catalog_chat_config::Settings;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::ServerError;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub dispatcher: Arc<Dispatcher>,
    /// Present when the Prometheus recorder is installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(config: Settings, dispatcher: Dispatcher) -> Self {
        Self {
            config: Arc::new(config),
            dispatcher: Arc::new(dispatcher),
            metrics: None,
        }
    }

    /// Build the dispatcher and every collaborator from settings
    pub fn from_settings(config: Settings) -> Result<Self, ServerError> {
        let dispatcher = Dispatcher::from_settings(&config)?;
        Ok(Self::new(config, dispatcher))
    }

    pub fn with_metrics(mut self, handle: Option<PrometheusHandle>) -> Self {
        self.metrics = handle;
        self
    }
}
