//! Tool for fetching analyst recommendation counts

use agent_core::Result as AgentResult;
use agent_tools::Tool;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::normalize::Fields;
use super::{TickerParams, YahooFinance, YahooProcess, normalize_ticker, parse_params, ticker_schema};
use crate::error::{ReportError, Result};
use crate::models::TickerRecommendationEntry;

/// Tool for fetching strong buy / buy / hold / sell / strong sell counts per period
pub struct RecommendationsTool {
    yahoo: YahooFinance,
}

impl RecommendationsTool {
    pub fn new(yahoo: YahooFinance) -> Self {
        Self { yahoo }
    }

    /// Fetch recommendation trend for `ticker`, skipping incomplete periods
    pub async fn fetch(&self, ticker: &str) -> Result<Vec<TickerRecommendationEntry>> {
        let ticker = normalize_ticker(ticker)?;
        let (dataset_id, item) = self
            .yahoo
            .fetch(YahooProcess::Recommendations, &ticker)
            .await?;

        let Some(entries) = item.get("data").and_then(Value::as_array) else {
            return Err(ReportError::DataUnavailable {
                dataset_id,
                ticker,
                missing: vec!["data".to_string()],
            });
        };

        let recommendations: Vec<TickerRecommendationEntry> = entries
            .iter()
            .filter_map(|entry| parse_entry(&ticker, entry))
            .collect();
        debug!(
            ticker = %ticker,
            dataset_id = %dataset_id,
            kept = recommendations.len(),
            total = entries.len(),
            "Recommendations normalized"
        );
        Ok(recommendations)
    }
}

fn parse_entry(ticker: &str, entry: &Value) -> Option<TickerRecommendationEntry> {
    let mut fields = Fields::new(entry);
    let recommendation = TickerRecommendationEntry {
        ticker: ticker.to_string(),
        period: fields.text("period", &["period"]),
        strong_buy: fields.count("strongbuy", &["strongbuy"]),
        buy: fields.count("buy", &["buy"]),
        hold: fields.count("hold", &["hold"]),
        sell: fields.count("sell", &["sell"]),
        strong_sell: fields.count("strongsell", &["strongsell"]),
    };

    match fields.finish() {
        Ok(()) => Some(recommendation),
        Err(missing) => {
            warn!(ticker = %ticker, ?missing, "Skipping recommendation entry with missing fields");
            None
        }
    }
}

#[async_trait]
impl Tool for RecommendationsTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: TickerParams = parse_params(params)?;
        debug!(tool_name = self.name(), ticker = %params.ticker, "Executing tool");

        let recommendations = self.fetch(&params.ticker).await?;
        Ok(serde_json::to_value(recommendations).map_err(ReportError::from)?)
    }

    fn name(&self) -> &str {
        "get_ticker_recommendations"
    }

    fn description(&self) -> &str {
        "Get analyst recommendations for a ticker: number of strong buy, buy, hold, \
         sell and strong sell ratings per period (0m is the current month)."
    }

    fn input_schema(&self) -> Value {
        ticker_schema()
    }
}
