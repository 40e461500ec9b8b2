//! Tool for fetching Yahoo Finance news about a ticker

use agent_core::Result as AgentResult;
use agent_tools::Tool;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::normalize::Fields;
use super::{TickerParams, YahooFinance, YahooProcess, normalize_ticker, parse_params, ticker_schema};
use crate::error::{ReportError, Result};
use crate::models::TickerNewsEntry;

/// Tool for fetching recent news from Yahoo Finance
pub struct YahooNewsTool {
    yahoo: YahooFinance,
}

impl YahooNewsTool {
    pub fn new(yahoo: YahooFinance) -> Self {
        Self { yahoo }
    }

    /// Fetch news for `ticker`, skipping incomplete articles
    pub async fn fetch(&self, ticker: &str) -> Result<Vec<TickerNewsEntry>> {
        let ticker = normalize_ticker(ticker)?;
        let (dataset_id, item) = self.yahoo.fetch(YahooProcess::News, &ticker).await?;

        let Some(entries) = item.get("data").and_then(Value::as_array) else {
            return Err(ReportError::DataUnavailable {
                dataset_id,
                ticker,
                missing: vec!["data".to_string()],
            });
        };

        let news: Vec<TickerNewsEntry> = entries
            .iter()
            .filter_map(|entry| parse_entry(&ticker, entry))
            .collect();
        debug!(ticker = %ticker, dataset_id = %dataset_id, kept = news.len(), total = entries.len(), "Yahoo news normalized");
        Ok(news)
    }
}

fn parse_entry(ticker: &str, entry: &Value) -> Option<TickerNewsEntry> {
    let mut fields = Fields::new(entry);
    let news = TickerNewsEntry {
        ticker: ticker.to_string(),
        title: fields.text("title", &["content", "title"]),
        url: fields.text("url", &["content", "canonicalUrl", "url"]),
        provider: fields.text("provider", &["content", "provider", "displayName"]),
        published_at: fields.text("published_at", &["content", "pubDate"]),
        summary: Some(fields.text("summary", &["content", "summary"])),
    };

    match fields.finish() {
        Ok(()) => Some(news),
        Err(missing) => {
            warn!(ticker = %ticker, ?missing, "Skipping news entry with missing fields");
            None
        }
    }
}

#[async_trait]
impl Tool for YahooNewsTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: TickerParams = parse_params(params)?;
        debug!(tool_name = self.name(), ticker = %params.ticker, "Executing tool");

        let news = self.fetch(&params.ticker).await?;
        Ok(serde_json::to_value(news).map_err(ReportError::from)?)
    }

    fn name(&self) -> &str {
        "get_yahoo_ticker_news"
    }

    fn description(&self) -> &str {
        "Get recent news about a ticker from Yahoo Finance. Returns title, summary, \
         publisher, publication time and link of each article."
    }

    fn input_schema(&self) -> Value {
        ticker_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Dataset, MockDatasetSource};
    use serde_json::json;
    use std::sync::Arc;

    fn article(title: &str, summary: Option<&str>) -> Value {
        let mut content = json!({
            "title": title,
            "pubDate": "2025-01-10T14:00:00Z",
            "provider": {"displayName": "Reuters"},
            "canonicalUrl": {"url": "https://finance.yahoo.com/news/1"}
        });
        if let Some(summary) = summary {
            content["summary"] = json!(summary);
        }
        json!({"content": content})
    }

    fn tool_with(item: Value) -> YahooNewsTool {
        let mut source = MockDatasetSource::new();
        source
            .expect_run_actor()
            .returning(move |_, _| Ok(Dataset::new("ds-gn", vec![item.clone()])));
        YahooNewsTool::new(YahooFinance::new(Arc::new(source), "canadesk/yahoo-finance"))
    }

    #[tokio::test]
    async fn test_incomplete_articles_are_skipped() {
        let tool = tool_with(json!({
            "ticker": "AAPL",
            "data": [
                article("Apple beats estimates", Some("Revenue up 8%")),
                article("No summary here", None),
            ]
        }));

        let news = tool.fetch("AAPL").await.unwrap();
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].provider, "Reuters");
        assert_eq!(news[0].summary.as_deref(), Some("Revenue up 8%"));
        assert_eq!(news[0].ticker, "AAPL");
    }

    #[tokio::test]
    async fn test_missing_data_array() {
        let tool = tool_with(json!({"ticker": "AAPL"}));
        let err = tool.fetch("AAPL").await.unwrap_err();
        assert!(matches!(err, ReportError::DataUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_execute_returns_json_list() {
        let tool = tool_with(json!({"data": [article("Title", Some("Summary"))]}));
        let value = tool.execute(json!({"ticker": "aapl"})).await.unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
        assert_eq!(value[0]["title"], "Title");
    }
}
