//! Supervised LLM pipeline producing financial reports
//!
//! A run takes a stock ticker and goes through two model-backed steps:
//!
//! - `AnalysisStep`: the model calls data-fetch tools (Yahoo Finance profile,
//!   news, price targets, analyst recommendations and Google News) and
//!   summarizes what it found
//! - `ReportStep`: the model turns the analysis into a [`StructuredReport`]
//!   with a closed [`Sentiment`] set
//!
//! A [`Supervisor`] picks the next step from the [`RunState`]; the
//! [`ReportPipeline`] enforces the phase order and publishes status changes.
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_llm::providers::OpenAIProvider;
//! use agent_runtime::AgentRuntime;
//! use finance_report::{ApifyClient, CachedSource, ReportConfig, ReportPipeline, tools};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ReportConfig::builder().from_env().build()?;
//!     let runtime = AgentRuntime::builder()
//!         .provider(Arc::new(OpenAIProvider::from_env()?))
//!         .config(config.runtime_config())
//!         .build()?;
//!
//!     let source = Arc::new(CachedSource::new(ApifyClient::new(&config)?, config.cache_ttl));
//!     let tools = Arc::new(tools::build_registry(source, &config)?);
//!
//!     let pipeline = ReportPipeline::from_config(&runtime, tools, &config).build()?;
//!     let report = pipeline.execute("AAPL").await?;
//!     println!("{}: {}", report.ticker, report.sentiment);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod state;
pub mod steps;
pub mod supervisor;
pub mod tools;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use api::{ApifyClient, Dataset, DatasetSource};
pub use cache::CachedSource;
pub use config::{ReportConfig, SupervisorKind};
pub use error::{ReportError, Result};
pub use models::{
    Sentiment, StructuredReport, TickerInfo, TickerNewsEntry, TickerPriceTarget,
    TickerRecommendationEntry,
};
pub use pipeline::{LogStatusObserver, ReportPipeline, ReportPipelineBuilder, StatusObserver};
pub use state::{Phase, RunState, StateUpdate};
pub use steps::{AnalysisStep, ReportStep, Step};
pub use supervisor::{Decision, ModelSupervisor, NextStep, RuleSupervisor, Supervisor};
