//! Tool for fetching the company profile of a ticker

use agent_core::Result as AgentResult;
use agent_tools::Tool;
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use super::normalize::{Fields, merge_data};
use super::{TickerParams, YahooFinance, YahooProcess, normalize_ticker, parse_params, ticker_schema};
use crate::error::{ReportError, Result};
use crate::models::TickerInfo;

/// Tool for fetching sector, industry and business description
pub struct TickerInfoTool {
    yahoo: YahooFinance,
}

impl TickerInfoTool {
    pub fn new(yahoo: YahooFinance) -> Self {
        Self { yahoo }
    }

    /// Fetch the profile of `ticker`
    pub async fn fetch(&self, ticker: &str) -> Result<TickerInfo> {
        let ticker = normalize_ticker(ticker)?;
        let (dataset_id, item) = self.yahoo.fetch(YahooProcess::BasicInfo, &ticker).await?;

        let unavailable = |missing: Vec<String>| ReportError::DataUnavailable {
            dataset_id: dataset_id.clone(),
            ticker: ticker.clone(),
            missing,
        };

        if !item.get("data").is_some_and(Value::is_object) {
            return Err(unavailable(vec!["data".to_string()]));
        }
        let merged = merge_data(&item);

        let mut fields = Fields::new(&merged);
        let info = TickerInfo {
            ticker: fields.text("ticker", &["ticker"]).to_uppercase(),
            sector: fields.text("sector", &["sector"]),
            industry: fields.text("industry", &["industry"]),
            description: fields.text("description", &["longBusinessSummary"]),
        };
        fields.finish().map_err(unavailable)?;

        Ok(info)
    }
}

#[async_trait]
impl Tool for TickerInfoTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: TickerParams = parse_params(params)?;
        debug!(tool_name = self.name(), ticker = %params.ticker, "Executing tool");

        let info = self.fetch(&params.ticker).await?;
        Ok(serde_json::to_value(info).map_err(ReportError::from)?)
    }

    fn name(&self) -> &str {
        "get_ticker_basic_info"
    }

    fn description(&self) -> &str {
        "Get basic information about a ticker: sector, industry and a description \
         of the business."
    }

    fn input_schema(&self) -> Value {
        ticker_schema()
    }
}
