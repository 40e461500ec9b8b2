//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// Trait for LLM providers
///
/// A provider is created once at startup and shared as `Arc<dyn LLMProvider>`
/// with every component that talks to the model. Free-text generation, tool
/// calling and structured output all go through [`LLMProvider::complete`];
/// the request decides which one is used.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "openai")
    fn name(&self) -> &str;
}
