//! Runtime holding the injected model capability
//!
//! The AgentRuntime is created once at startup with the LLM provider and is
//! passed to every component that needs the model. It hands out executors and
//! structured generators that share its provider and usage tracker.

use agent_core::Result;
use agent_llm::{LLMProvider, TokenUsage};
use agent_tools::ToolRegistry;
use std::sync::Arc;

use crate::executor::{AgentExecutor, ExecutorConfig};
use crate::structured::{StructuredConfig, StructuredGenerator};
use crate::usage::UsageTracker;

/// Defaults applied to everything the runtime creates
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Model to use
    pub model: String,

    /// Max tokens per completion
    pub max_tokens: usize,

    /// Temperature, provider default when unset
    pub temperature: Option<f32>,

    /// Maximum model calls of one executor run
    pub max_iterations: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: None,
            max_iterations: 10,
        }
    }
}

/// Owner of the provider shared by every model-backed component
///
/// # Example
///
/// ```no_run
/// use agent_runtime::{AgentRuntime, RuntimeConfig};
/// use agent_tools::ToolRegistry;
/// use std::sync::Arc;
///
/// # async fn example(provider: Arc<dyn agent_llm::LLMProvider>) -> agent_core::Result<()> {
/// let runtime = AgentRuntime::builder()
///     .provider(provider)
///     .config(RuntimeConfig::default())
///     .build()?;
///
/// let executor = runtime.create_executor(Arc::new(ToolRegistry::new()), Some("Be brief."));
/// let answer = executor.run("Summarize TSLA").await?;
/// println!("{answer} ({} tokens)", runtime.usage().total());
/// # Ok(())
/// # }
/// ```
pub struct AgentRuntime {
    provider: Arc<dyn LLMProvider>,
    usage: Arc<UsageTracker>,
    config: RuntimeConfig,
}

impl AgentRuntime {
    /// Create a new agent runtime
    pub fn new(provider: Arc<dyn LLMProvider>, config: RuntimeConfig) -> Self {
        Self {
            provider,
            usage: Arc::new(UsageTracker::new()),
            config,
        }
    }

    /// Create a new runtime builder
    pub fn builder() -> AgentRuntimeBuilder {
        AgentRuntimeBuilder::new()
    }

    /// Get a reference to the LLM provider
    pub fn provider(&self) -> &Arc<dyn LLMProvider> {
        &self.provider
    }

    /// Get a reference to the runtime configuration
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Token usage of everything created by this runtime
    pub fn usage(&self) -> TokenUsage {
        self.usage.total()
    }

    /// Number of completions made through this runtime
    pub fn requests(&self) -> usize {
        self.usage.requests()
    }

    /// Executor configuration derived from the runtime defaults
    pub fn executor_config(&self, system_prompt: Option<&str>) -> ExecutorConfig {
        ExecutorConfig {
            max_iterations: self.config.max_iterations,
            model: self.config.model.clone(),
            system_prompt: system_prompt.map(str::to_string),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        }
    }

    /// Create a model-and-tools executor over `tools`
    pub fn create_executor(
        &self,
        tools: Arc<ToolRegistry>,
        system_prompt: Option<&str>,
    ) -> AgentExecutor {
        AgentExecutor::new(
            Arc::clone(&self.provider),
            tools,
            Arc::clone(&self.usage),
            self.executor_config(system_prompt),
        )
    }

    /// Create a structured generator (no tools)
    pub fn create_structured(&self, system_prompt: Option<&str>) -> StructuredGenerator {
        StructuredGenerator::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.usage),
            StructuredConfig {
                model: self.config.model.clone(),
                max_tokens: self.config.max_tokens,
                temperature: self.config.temperature,
                system_prompt: system_prompt.map(str::to_string),
            },
        )
    }
}

/// Builder for AgentRuntime
#[derive(Default)]
pub struct AgentRuntimeBuilder {
    provider: Option<Arc<dyn LLMProvider>>,
    config: RuntimeConfig,
}

impl AgentRuntimeBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the LLM provider
    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set the configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Build the runtime
    pub fn build(self) -> Result<AgentRuntime> {
        let provider = self.provider.ok_or_else(|| {
            agent_core::Error::InitializationFailed("Provider not set".to_string())
        })?;
        if self.config.model.trim().is_empty() {
            return Err(agent_core::Error::InitializationFailed(
                "Model must not be empty".to_string(),
            ));
        }
        Ok(AgentRuntime::new(provider, self.config))
    }
}
