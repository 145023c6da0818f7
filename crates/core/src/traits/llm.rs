//! Generative fallback trait

use async_trait::async_trait;

use crate::Result;

/// Terminal chit-chat handler
///
/// Accepts the raw message text and returns free text. Never invoked for
/// catalog-bound messages.
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn complete(&self, text: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}
