//! Analysis step: the model gathers data with tools and summarizes it

use agent_runtime::{AgentExecutor, AgentRuntime};
use agent_tools::ToolRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use super::{Step, today};
use crate::error::Result;
use crate::prompts;
use crate::state::{RunState, StateUpdate};

/// Runs the model-and-tools loop and returns its final text as the analysis
pub struct AnalysisStep {
    executor: AgentExecutor,
}

impl AnalysisStep {
    /// Create the step with the fetch tools in `tools`
    pub fn new(runtime: &AgentRuntime, tools: Arc<ToolRegistry>) -> Self {
        Self {
            executor: runtime.create_executor(tools, Some(prompts::ANALYSIS_SYSTEM)),
        }
    }

    /// Produce a free-text analysis of `ticker`.
    ///
    /// Tool failures are handed back to the model, so a degraded analysis is
    /// still returned. Exceeding the iteration cap is an error.
    pub async fn analyze(&self, ticker: &str) -> Result<String> {
        let started = Instant::now();
        let analysis = self
            .executor
            .run(prompts::analysis_request(ticker, today())?)
            .await?;

        if analysis.trim().is_empty() {
            warn!(ticker = %ticker, "Analysis step produced no text");
        }
        info!(
            ticker = %ticker,
            analysis_length = analysis.len(),
            duration_ms = started.elapsed().as_millis(),
            "Analysis completed"
        );
        Ok(analysis)
    }
}

#[async_trait]
impl Step for AnalysisStep {
    fn name(&self) -> &'static str {
        "analysis"
    }

    async fn run(&self, state: &RunState) -> Result<StateUpdate> {
        let analysis = self.analyze(state.ticker()).await?;
        Ok(StateUpdate::analysis(analysis))
    }
}
