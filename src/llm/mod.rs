//! Remote completion provider used for intent extraction.

mod openai;
pub mod prompt;

use async_trait::async_trait;

use crate::error::LlmError;

pub use self::openai::OpenAiCompatibleClient;

/// A single-shot chat completion: one system instruction, one user turn,
/// raw assistant text back.
#[async_trait]
pub trait IntentCompletion: Send + Sync {
    /// Provider name used in logs and errors.
    fn provider_name(&self) -> &str;

    async fn complete(&self, system: &str, user: &str) -> Result<String, LlmError>;
}
