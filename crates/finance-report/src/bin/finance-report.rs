//! Financial report CLI
//!
//! Generates a report for one ticker and writes `report.md` and
//! `report.json` to the output directory.
//!
//! # Usage
//!
//! ```bash
//! export OPENAI_API_KEY="sk-..."
//! export APIFY_TOKEN="apify_api_..."
//!
//! cargo run --bin finance-report -p finance-report -- TSLA --output-dir output
//! ```

use agent_llm::providers::OpenAIProvider;
use agent_runtime::AgentRuntime;
use agent_utils::{LogOptions, init_tracing};
use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use finance_report::{
    ApifyClient, CachedSource, ReportConfig, ReportPipeline, StatusObserver, SupervisorKind,
    output, tools,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "finance-report")]
#[command(about = "Generate an AI financial report for a stock ticker", long_about = None)]
struct Args {
    /// Ticker symbol, for example TSLA
    ticker: String,

    /// Chat model (defaults to $OPENAI_MODEL, then gpt-4o-mini)
    #[arg(short, long)]
    model: Option<String>,

    /// Directory receiving report.md and report.json
    #[arg(short, long, default_value = "output")]
    output_dir: PathBuf,

    /// Log tool inputs, tool results and model previews
    #[arg(long)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    json_logs: bool,

    /// Let the model choose the next step instead of the fixed routing
    #[arg(long)]
    model_supervisor: bool,

    /// Supervisor decisions allowed per run
    #[arg(long)]
    max_steps: Option<usize>,
}

/// Prints status changes for the user
struct ConsoleObserver;

#[async_trait]
impl StatusObserver for ConsoleObserver {
    async fn on_status(&self, status: &str) {
        println!("Agent: {status}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_tracing(
        &LogOptions::for_crates(&["finance-report", "agent-runtime", "agent-llm"], args.debug)
            .json(args.json_logs),
    )?;

    let mut builder = ReportConfig::builder().from_env();
    if let Some(model) = args.model {
        builder = builder.model(model);
    }
    if let Some(max_steps) = args.max_steps {
        builder = builder.max_steps(max_steps);
    }
    if args.model_supervisor {
        builder = builder.supervisor(SupervisorKind::Model);
    }
    let config = builder.build()?;
    info!(model = %config.model, supervisor = ?config.supervisor, "Configuration loaded");

    let provider = Arc::new(OpenAIProvider::from_env().context("Failed to create OpenAI provider")?);
    let runtime = AgentRuntime::builder()
        .provider(provider)
        .config(config.runtime_config())
        .build()?;

    let client = ApifyClient::new(&config).context("Failed to create Apify client")?;
    let source = Arc::new(CachedSource::new(client, config.cache_ttl));
    let tools = Arc::new(tools::build_registry(source, &config)?);

    let pipeline = ReportPipeline::from_config(&runtime, tools, &config)
        .observer(Arc::new(ConsoleObserver))
        .build()?;

    let report = pipeline
        .execute(&args.ticker)
        .await
        .with_context(|| format!("Report for {} failed", args.ticker))?;

    let usage = runtime.usage();
    info!(
        input_tokens = usage.input_tokens,
        output_tokens = usage.output_tokens,
        requests = runtime.requests(),
        "Token usage"
    );

    let paths = output::write_outputs(&args.output_dir, &report, usage).await?;
    println!("Sentiment: {} ({})", report.sentiment, report.sentiment_reason);
    println!("Report written to {}", paths.markdown.display());

    Ok(())
}
