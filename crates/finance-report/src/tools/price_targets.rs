//! Tool for fetching analyst price targets

use agent_core::Result as AgentResult;
use agent_tools::Tool;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::normalize::{Fields, merge_data};
use super::{TickerParams, YahooFinance, YahooProcess, normalize_ticker, parse_params, ticker_schema};
use crate::error::{ReportError, Result};
use crate::models::TickerPriceTarget;

/// Tool for fetching current price and analyst targets
pub struct PriceTargetsTool {
    yahoo: YahooFinance,
}

impl PriceTargetsTool {
    pub fn new(yahoo: YahooFinance) -> Self {
        Self { yahoo }
    }

    /// Fetch price targets for `ticker`
    pub async fn fetch(&self, ticker: &str) -> Result<TickerPriceTarget> {
        let ticker = normalize_ticker(ticker)?;
        let (dataset_id, item) = self.yahoo.fetch(YahooProcess::PriceTargets, &ticker).await?;
        let merged = merge_data(&item);

        let mut fields = Fields::new(&merged);
        let target = TickerPriceTarget {
            ticker: fields.text("ticker", &["ticker"]).to_uppercase(),
            current: fields.number("current", &["current"]),
            high: fields.number("high", &["high"]),
            low: fields.number("low", &["low"]),
            mean: fields.number("mean", &["mean"]),
            median: fields.number("median", &["median"]),
        };
        fields
            .finish()
            .map_err(|missing| ReportError::DataUnavailable {
                dataset_id,
                ticker,
                missing,
            })?;

        Ok(target)
    }
}

#[async_trait]
impl Tool for PriceTargetsTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: TickerParams = parse_params(params)?;
        debug!(tool_name = self.name(), ticker = %params.ticker, "Executing tool");

        let target = self.fetch(&params.ticker).await?;
        Ok(serde_json::to_value(target).map_err(ReportError::from)?)
    }

    fn name(&self) -> &str {
        "get_ticker_price_targets"
    }

    fn description(&self) -> &str {
        "Get the current price and analyst price targets (low, high, mean, median) \
         for a ticker."
    }

    fn input_schema(&self) -> Value {
        ticker_schema()
    }
}
