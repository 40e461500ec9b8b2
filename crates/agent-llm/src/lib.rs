//! LLM provider abstraction layer
//!
//! This crate is the model capability used by the rest of the workspace:
//!
//! - Message types for LLM communication, including tool calls and results
//! - Completion request/response types, with optional structured output
//! - Tool definitions for function calling
//! - The [`LLMProvider`] trait that steps receive as an injected dependency
//! - An OpenAI-compatible provider (behind the `openai` feature)

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod tools;

// Re-export main types
pub use completion::{
    CompletionRequest, CompletionRequestBuilder, CompletionResponse, ResponseFormat, StopReason,
    TokenUsage,
};
pub use error::{LLMError, Result};
pub use messages::{ContentBlock, Message, MessageContent, Role};
pub use provider::LLMProvider;
pub use tools::ToolDefinition;

// Provider implementations (feature-gated)
#[cfg(feature = "openai")]
pub mod providers;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;
