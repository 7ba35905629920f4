pub mod fake;
pub mod openai;
pub mod tracing;

use crate::model::LlmResponse;
use async_trait::async_trait;

/// Reasoning service contract. One call, one reply; retries live in the panel.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// `system` carries the persona instructions, sent ahead of `prompt`.
    async fn complete(&self, prompt: &str, system: Option<&[String]>)
        -> anyhow::Result<LlmResponse>;

    fn provider_name(&self) -> &'static str;
}
