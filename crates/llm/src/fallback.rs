//! Chit-chat fallback model

use async_trait::async_trait;
use catalog_chat_core::GenerativeModel;

use crate::backend::{OpenAIBackend, OpenAIConfig};
use crate::prompt::single_turn;
use crate::LlmError;

/// Answers free text with a system prompt in front
pub struct FallbackModel {
    backend: OpenAIBackend,
    system_prompt: String,
}

impl FallbackModel {
    pub fn new(config: OpenAIConfig, system_prompt: impl Into<String>) -> Result<Self, LlmError> {
        Ok(Self {
            backend: OpenAIBackend::new(config)?,
            system_prompt: system_prompt.into(),
        })
    }

    async fn answer(&self, text: &str) -> Result<String, LlmError> {
        let messages = single_turn(&self.system_prompt, text);
        let timeout = self.backend.timeout();
        match tokio::time::timeout(timeout, self.backend.chat(&messages)).await {
            Ok(result) => result.map(|completion| completion.text),
            Err(_) => Err(LlmError::Timeout(timeout.as_millis() as u64)),
        }
    }
}

#[async_trait]
impl GenerativeModel for FallbackModel {
    async fn complete(&self, text: &str) -> catalog_chat_core::Result<String> {
        self.answer(text).await.map_err(|e| {
            tracing::warn!(model = %self.backend.model(), error = %e, "Fallback model failed");
            e.into()
        })
    }

    fn model_name(&self) -> &str {
        self.backend.model()
    }
}
