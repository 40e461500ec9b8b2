//! Data-fetch tools exposed to the analysis step

pub mod google_news;
pub mod normalize;
pub mod price_targets;
pub mod recommendations;
pub mod ticker_info;
pub mod yahoo_news;

pub use google_news::GoogleNewsTool;
pub use price_targets::PriceTargetsTool;
pub use recommendations::RecommendationsTool;
pub use ticker_info::TickerInfoTool;
pub use yahoo_news::YahooNewsTool;

use agent_llm::tools::schema;
use agent_tools::ToolRegistry;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::api::{Dataset, DatasetSource};
use crate::config::ReportConfig;
use crate::error::{ReportError, Result};

/// Processes of the Yahoo Finance actor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum YahooProcess {
    BasicInfo,
    News,
    PriceTargets,
    Recommendations,
}

impl YahooProcess {
    /// Process code understood by the actor
    pub fn code(self) -> &'static str {
        match self {
            YahooProcess::BasicInfo => "gi",
            YahooProcess::News => "gn",
            YahooProcess::PriceTargets => "gp",
            YahooProcess::Recommendations => "gr",
        }
    }

    /// Actor input for one ticker
    pub fn input(self, ticker: &str) -> Value {
        json!({
            "process": self.code(),
            "tickers": [ticker],
        })
    }
}

/// Yahoo Finance actor handle shared by the four Yahoo tools
#[derive(Clone)]
pub struct YahooFinance {
    source: Arc<dyn DatasetSource>,
    actor: String,
}

impl YahooFinance {
    pub fn new(source: Arc<dyn DatasetSource>, actor: impl Into<String>) -> Self {
        Self {
            source,
            actor: actor.into(),
        }
    }

    /// Run one process for `ticker` and return the first dataset item
    pub async fn fetch(&self, process: YahooProcess, ticker: &str) -> Result<(String, Value)> {
        let started = Instant::now();
        let dataset = self.source.run_actor(&self.actor, process.input(ticker)).await?;
        debug!(
            ticker = %ticker,
            process = process.code(),
            dataset_id = %dataset.id,
            items = dataset.items.len(),
            duration_ms = started.elapsed().as_millis(),
            "Yahoo dataset received"
        );

        let item = dataset.first_item(&self.actor)?.clone();
        let Dataset { id, .. } = dataset;
        Ok((id, item))
    }
}

/// Parameters of the single-ticker tools
#[derive(Debug, Deserialize)]
pub struct TickerParams {
    pub ticker: String,
}

/// Deserialize tool arguments, reporting failures as parameter errors
pub fn parse_params<T: DeserializeOwned>(params: Value) -> Result<T> {
    serde_json::from_value(params)
        .map_err(|e| ReportError::invalid_parameter("params", e.to_string()))
}

/// Trimmed, upper-cased ticker; blank input is rejected
pub fn normalize_ticker(raw: &str) -> Result<String> {
    let ticker = raw.trim();
    if ticker.is_empty() {
        return Err(ReportError::invalid_parameter("ticker", "must not be empty"));
    }
    if ticker.chars().any(char::is_whitespace) {
        return Err(ReportError::invalid_parameter(
            "ticker",
            format!("`{ticker}` must not contain whitespace"),
        ));
    }
    Ok(ticker.to_uppercase())
}

/// Input schema of the single-ticker tools
pub fn ticker_schema() -> Value {
    schema::object(
        json!({
            "ticker": schema::string("Ticker symbol, for example 'TSLA'"),
        }),
        &["ticker"],
    )
}

/// Build the registry holding every fetch tool
pub fn build_registry(
    source: Arc<dyn DatasetSource>,
    config: &ReportConfig,
) -> agent_core::Result<ToolRegistry> {
    let yahoo = YahooFinance::new(Arc::clone(&source), config.yahoo_actor.as_str());

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(TickerInfoTool::new(yahoo.clone())))?;
    registry.register(Arc::new(YahooNewsTool::new(yahoo.clone())))?;
    registry.register(Arc::new(PriceTargetsTool::new(yahoo.clone())))?;
    registry.register(Arc::new(RecommendationsTool::new(yahoo)))?;
    registry.register(Arc::new(GoogleNewsTool::new(
        source,
        config.google_news_actor.as_str(),
    )))?;
    Ok(registry)
}
