//! Agent executor for running the model-and-tools loop
//!
//! 1. Call the model with the conversation and the available tools
//! 2. If it requests tools, run them (concurrently) and append the results
//! 3. Repeat until the model answers without tool calls
//!
//! Tool failures are reported back to the model as error results; they never
//! abort the loop. Only provider errors and the iteration cap do.

use agent_core::{Error, Result};
use agent_llm::{
    CompletionRequest, ContentBlock, LLMProvider, Message, StopReason, ToolDefinition,
};
use agent_tools::ToolRegistry;
use futures::future::join_all;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::UsageTracker;

const PREVIEW_CHARS: usize = 500;

/// Configuration for agent execution
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum number of model calls (prevents infinite loops)
    pub max_iterations: usize,

    /// Model to use
    pub model: String,

    /// System prompt
    pub system_prompt: Option<String>,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature
    pub temperature: Option<f32>,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            model: "gpt-4o-mini".to_string(),
            system_prompt: None,
            max_tokens: 4096,
            temperature: None,
        }
    }
}

/// Runs the model-and-tools loop against an injected provider
pub struct AgentExecutor {
    provider: Arc<dyn LLMProvider>,
    tool_registry: Arc<ToolRegistry>,
    usage: Arc<UsageTracker>,
    config: ExecutorConfig,
}

impl std::fmt::Debug for AgentExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentExecutor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl AgentExecutor {
    /// Create a new agent executor
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        tool_registry: Arc<ToolRegistry>,
        usage: Arc<UsageTracker>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            provider,
            tool_registry,
            usage,
            config,
        }
    }

    /// Create a builder
    pub fn builder() -> AgentExecutorBuilder {
        AgentExecutorBuilder::new()
    }

    /// Executor configuration
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run the loop for a single user message and return the final text.
    ///
    /// A final answer without text yields an empty string.
    pub async fn run(&self, user_message: impl Into<String>) -> Result<String> {
        self.run_conversation(vec![Message::user(user_message)])
            .await
    }

    /// Run the loop starting from an existing conversation
    pub async fn run_conversation(&self, mut conversation: Vec<Message>) -> Result<String> {
        let tools = self.build_tool_definitions();
        debug!(tool_count = tools.len(), "Available tools");

        for iteration in 1..=self.config.max_iterations {
            info!(
                iteration,
                max_iterations = self.config.max_iterations,
                model = %self.config.model,
                "Agent iteration started"
            );

            let mut builder = CompletionRequest::builder(&self.config.model)
                .messages(conversation.clone())
                .max_tokens(self.config.max_tokens)
                .tools(tools.clone());
            if let Some(system) = &self.config.system_prompt {
                builder = builder.system(system.clone());
            }
            if let Some(temperature) = self.config.temperature {
                builder = builder.temperature(temperature);
            }

            let response = self
                .provider
                .complete(builder.build())
                .await
                .map_err(|e| Error::ModelFailed(e.to_string()))?;
            self.usage.record(response.usage);

            info!(
                stop_reason = ?response.stop_reason,
                input_tokens = response.usage.input_tokens,
                output_tokens = response.usage.output_tokens,
                "LLM response received"
            );
            debug!(
                response_preview = %preview(&response.message.text().unwrap_or_default()),
                "LLM response content preview"
            );

            let message = response.message;
            match response.stop_reason {
                StopReason::ToolUse if message.has_tool_uses() => {
                    let results = self.execute_tools(&message).await;
                    conversation.push(message);
                    conversation.extend(results);
                }
                StopReason::ToolUse => {
                    warn!("Tool use stop reason without tool calls, treating as final answer");
                    return Ok(message.text().unwrap_or_default());
                }
                StopReason::MaxTokens => {
                    warn!("Hit max tokens in LLM response, returning truncated answer");
                    return Ok(message.text().unwrap_or_default());
                }
                StopReason::EndTurn | StopReason::StopSequence => {
                    let text = message.text().unwrap_or_default();
                    info!(
                        iteration,
                        response_length = text.len(),
                        "Agent completed"
                    );
                    return Ok(text);
                }
            }
        }

        warn!(
            max_iterations = self.config.max_iterations,
            "Max iterations reached, stopping"
        );
        Err(Error::IterationLimit(self.config.max_iterations))
    }

    fn build_tool_definitions(&self) -> Vec<ToolDefinition> {
        self.tool_registry
            .list_tools()
            .iter()
            .map(|tool| ToolDefinition::new(tool.name(), tool.description(), tool.input_schema()))
            .collect()
    }

    /// Run every tool call of one assistant turn concurrently.
    ///
    /// Results come back in request order, one message per call.
    async fn execute_tools(&self, message: &Message) -> Vec<Message> {
        let calls = message.tool_uses().into_iter().filter_map(|block| match block {
            ContentBlock::ToolUse { id, name, input } => Some(self.execute_tool(id, name, input)),
            _ => None,
        });
        join_all(calls).await
    }

    async fn execute_tool(&self, id: &str, name: &str, input: &Value) -> Message {
        info!(
            tool_name = %name,
            tool_id = %id,
            input_preview = %preview(&input.to_string()),
            "Executing tool"
        );

        let Some(tool) = self.tool_registry.get(name) else {
            warn!(tool_name = %name, "Model requested an unknown tool");
            return Message::tool_error(
                id,
                format!(
                    "Error: unknown tool `{name}`. Available tools: {}",
                    self.tool_registry.names().join(", ")
                ),
            );
        };

        let start_time = Instant::now();
        let outcome = tool.execute(input.clone()).await;
        let duration_ms = start_time.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                let result_str = result.to_string();
                info!(
                    tool_name = %name,
                    duration_ms,
                    result_length = result_str.len(),
                    "Tool execution succeeded"
                );
                debug!(tool_name = %name, result_preview = %preview(&result_str), "Tool result");
                Message::tool_result(id, result_str)
            }
            Err(e) => {
                warn!(
                    tool_name = %name,
                    duration_ms,
                    error = %e,
                    "Tool execution failed"
                );
                Message::tool_error(id, format!("Error: {e}"))
            }
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(PREVIEW_CHARS).collect()
}

/// Builder for AgentExecutor
pub struct AgentExecutorBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    tool_registry: Arc<ToolRegistry>,
    usage: Arc<UsageTracker>,
    config: ExecutorConfig,
}

impl AgentExecutorBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            provider: None,
            tool_registry: Arc::new(ToolRegistry::new()),
            usage: Arc::new(UsageTracker::new()),
            config: ExecutorConfig::default(),
        }
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the tool registry
    pub fn tool_registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.tool_registry = registry;
        self
    }

    /// Share a usage tracker
    pub fn usage(mut self, usage: Arc<UsageTracker>) -> Self {
        self.usage = usage;
        self
    }

    /// Set the full configuration
    pub fn config(mut self, config: ExecutorConfig) -> Self {
        self.config = config;
        self
    }

    /// Set maximum iterations
    pub fn max_iterations(mut self, max: usize) -> Self {
        self.config.max_iterations = max;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the system prompt
    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    /// Build the executor
    pub fn build(self) -> Result<AgentExecutor> {
        let provider = self
            .provider
            .ok_or_else(|| Error::InitializationFailed("Provider not set".to_string()))?;

        if self.config.max_iterations == 0 {
            return Err(Error::InitializationFailed(
                "max_iterations must be greater than 0".to_string(),
            ));
        }

        Ok(AgentExecutor::new(
            provider,
            self.tool_registry,
            self.usage,
            self.config,
        ))
    }
}

impl Default for AgentExecutorBuilder {
    fn default() -> Self {
        Self::new()
    }
}
