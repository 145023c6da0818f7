//! OpenAI-compatible chat completions backend
//!
//! Works with OpenAI, Azure OpenAI and local servers that speak the same
//! protocol (vLLM, Ollama's OpenAI endpoint). Non-streaming: one request, one
//! reply.

use std::time::{Duration, Instant};

use catalog_chat_config::FallbackConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::prompt::Message;
use crate::LlmError;

/// Configuration for OpenAI-compatible backends
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API endpoint (OpenAI: https://api.openai.com/v1, Azure: custom)
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
    /// Maximum tokens to generate
    pub max_tokens: usize,
    /// Temperature (0-2)
    pub temperature: f32,
    /// Request timeout
    pub timeout: Duration,
    /// Azure API version (Azure specific)
    pub api_version: Option<String>,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            endpoint: catalog_chat_config::constants::endpoints::FALLBACK_DEFAULT.to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            max_tokens: 300,
            temperature: 0.7,
            timeout: Duration::from_millis(catalog_chat_config::constants::timeouts::FALLBACK_MS),
            api_version: None,
        }
    }
}

impl From<&FallbackConfig> for OpenAIConfig {
    fn from(config: &FallbackConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            timeout: Duration::from_millis(config.timeout_ms),
            api_version: config.api_version.clone(),
        }
    }
}

/// Result of one completion
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub tokens: usize,
    pub total_time_ms: u64,
}

pub struct OpenAIBackend {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIBackend {
    pub fn new(config: OpenAIConfig) -> Result<Self, LlmError> {
        if config.api_key.is_empty() && !is_local_endpoint(&config.endpoint) {
            return Err(LlmError::Configuration(
                "API key required for remote endpoints".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    pub fn timeout(&self) -> Duration {
        self.config.timeout
    }

    /// Full API URL for chat completions
    fn chat_url(&self) -> String {
        let endpoint = self.config.endpoint.trim_end_matches('/');
        match self.config.api_version {
            Some(ref api_version) => format!(
                "{}/openai/deployments/{}/chat/completions?api-version={}",
                endpoint, self.config.model, api_version
            ),
            None => format!("{}/chat/completions", endpoint),
        }
    }

    fn build_headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::HeaderValue;

        let mut headers = reqwest::header::HeaderMap::new();

        if !self.config.api_key.is_empty() {
            if self.config.api_version.is_some() {
                // Azure uses api-key header
                if let Ok(val) = HeaderValue::from_str(&self.config.api_key) {
                    headers.insert("api-key", val);
                }
            } else if let Ok(val) = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key)) {
                headers.insert(reqwest::header::AUTHORIZATION, val);
            }
        }

        headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        headers
    }

    /// Send one chat completion request
    pub async fn chat(&self, messages: &[Message]) -> Result<Completion, LlmError> {
        let start = Instant::now();

        let request = ChatRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| WireMessage {
                    role: m.role.as_str().to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: Some(self.config.max_tokens),
            temperature: Some(self.config.temperature),
            stream: Some(false),
        };

        let response = self
            .client
            .post(self.chat_url())
            .headers(self.build_headers())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("HTTP {}: {}", status, error_text)));
        }

        let response: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        let text = choice.message.content.trim().to_string();
        if text.is_empty() {
            return Err(LlmError::Generation("Empty completion".to_string()));
        }

        let total_time_ms = start.elapsed().as_millis() as u64;
        let tokens = response.usage.map(|u| u.completion_tokens).unwrap_or(0);
        tracing::debug!(
            model = %self.config.model,
            tokens,
            latency_ms = total_time_ms,
            "Completion received"
        );

        Ok(Completion {
            text,
            tokens,
            total_time_ms,
        })
    }
}

fn is_local_endpoint(endpoint: &str) -> bool {
    endpoint.starts_with("http://localhost") || endpoint.starts_with("http://127.0.0.1")
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: WireMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    completion_tokens: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_endpoint_requires_key() {
        let result = OpenAIBackend::new(OpenAIConfig::default());
        assert!(matches!(result, Err(LlmError::Configuration(_))));

        let local = OpenAIConfig {
            endpoint: "http://localhost:11434/v1".to_string(),
            ..OpenAIConfig::default()
        };
        assert!(OpenAIBackend::new(local).is_ok());
    }

    #[test]
    fn test_chat_url() {
        let backend = OpenAIBackend::new(OpenAIConfig {
            endpoint: "http://localhost:8000/v1/".to_string(),
            ..OpenAIConfig::default()
        })
        .unwrap();
        assert_eq!(backend.chat_url(), "http://localhost:8000/v1/chat/completions");

        let azure = OpenAIBackend::new(OpenAIConfig {
            endpoint: "https://example.openai.azure.com".to_string(),
            api_key: "k".to_string(),
            model: "chat".to_string(),
            api_version: Some("2024-02-01".to_string()),
            ..OpenAIConfig::default()
        })
        .unwrap();
        assert_eq!(
            azure.chat_url(),
            "https://example.openai.azure.com/openai/deployments/chat/chat/completions?api-version=2024-02-01"
        );
    }

    #[test]
    fn test_from_fallback_config() {
        let fallback = FallbackConfig {
            api_key: Some("sk-test".to_string()),
            timeout_ms: 1_500,
            ..FallbackConfig::default()
        };
        let config = OpenAIConfig::from(&fallback);
        assert_eq!(config.api_key, "sk-test");
        assert_eq!(config.timeout, Duration::from_millis(1_500));
    }
}
