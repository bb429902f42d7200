//! Model providers: chat completion with tool calls.

pub mod ollama;

pub use ollama::{GenerationOptions, OllamaClient};

use crate::error::ProviderError;
use crate::tools::ToolDefinition;
use crate::types::{Message, ModelReply};
use async_trait::async_trait;

/// A chat-completion service that can request tool calls.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// Short identifier for logs, e.g. the model name.
    fn name(&self) -> &str;

    /// Run one model turn over the full message list.
    async fn chat(
        &self,
        messages: &[Message],
        tools: &[ToolDefinition],
    ) -> Result<ModelReply, ProviderError>;
}
