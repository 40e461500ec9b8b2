//! Tool for searching Google News

use agent_core::Result as AgentResult;
use agent_llm::tools::schema;
use agent_tools::Tool;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use super::normalize::Fields;
use super::parse_params;
use crate::api::DatasetSource;
use crate::error::{ReportError, Result};
use crate::models::TickerNewsEntry;

const DEFAULT_MAX_ITEMS: u32 = 25;
const MAX_ITEMS_LIMIT: u32 = 100;

/// Tool for searching recent Google News articles
pub struct GoogleNewsTool {
    source: Arc<dyn DatasetSource>,
    actor: String,
}

#[derive(Debug, Deserialize)]
struct GoogleNewsParams {
    query: String,
    date_from: String,
    /// Missing and `null` both mean the default
    #[serde(default)]
    max_items: Option<u32>,
}

impl GoogleNewsTool {
    pub fn new(source: Arc<dyn DatasetSource>, actor: impl Into<String>) -> Self {
        Self {
            source,
            actor: actor.into(),
        }
    }

    /// Search news matching `query` published since `date_from` (`YYYY-MM-DD`)
    pub async fn fetch(
        &self,
        query: &str,
        date_from: &str,
        max_items: u32,
    ) -> Result<Vec<TickerNewsEntry>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ReportError::invalid_parameter("query", "must not be empty"));
        }
        let date_from = NaiveDate::parse_from_str(date_from.trim(), "%Y-%m-%d").map_err(|e| {
            ReportError::invalid_parameter(
                "date_from",
                format!("`{date_from}` is not a YYYY-MM-DD date: {e}"),
            )
        })?;
        if !(1..=MAX_ITEMS_LIMIT).contains(&max_items) {
            return Err(ReportError::invalid_parameter(
                "max_items",
                format!("must be between 1 and {MAX_ITEMS_LIMIT}, got {max_items}"),
            ));
        }

        let input = json!({
            "query": query,
            "dateFrom": date_from.format("%Y-%m-%d").to_string(),
            "maxItems": max_items,
            "extractImages": false,
            "language": "US:en",
        });

        let started = Instant::now();
        let dataset = self.source.run_actor(&self.actor, input).await?;
        let news: Vec<TickerNewsEntry> = dataset
            .items
            .iter()
            .filter_map(|entry| parse_entry(query, entry))
            .collect();

        debug!(
            query = %query,
            dataset_id = %dataset.id,
            kept = news.len(),
            total = dataset.items.len(),
            duration_ms = started.elapsed().as_millis(),
            "Google news normalized"
        );
        Ok(news)
    }
}

fn parse_entry(query: &str, entry: &Value) -> Option<TickerNewsEntry> {
    let mut fields = Fields::new(entry);
    let news = TickerNewsEntry {
        ticker: query.to_string(),
        title: fields.text("title", &["title"]),
        url: fields.text("link", &["link"]),
        provider: fields.text("source", &["source"]),
        published_at: fields.text("publishedAt", &["publishedAt"]),
        summary: None,
    };

    match fields.finish() {
        Ok(()) => Some(news),
        Err(missing) => {
            warn!(query = %query, ?missing, "Skipping news entry with missing fields");
            None
        }
    }
}

#[async_trait]
impl Tool for GoogleNewsTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let params: GoogleNewsParams = parse_params(params)?;
        debug!(tool_name = self.name(), query = %params.query, date_from = %params.date_from, "Executing tool");

        let news = self
            .fetch(
                &params.query,
                &params.date_from,
                params.max_items.unwrap_or(DEFAULT_MAX_ITEMS),
            )
            .await?;
        Ok(serde_json::to_value(news).map_err(ReportError::from)?)
    }

    fn name(&self) -> &str {
        "get_google_news"
    }

    fn description(&self) -> &str {
        "Search recent news on Google News. Can be used to get news about a ticker \
         or the company behind it."
    }

    fn input_schema(&self) -> Value {
        schema::object(
            json!({
                "query": schema::string("Search query, for example 'Tesla stock'"),
                "date_from": schema::string("Earliest publication date in format YYYY-MM-DD"),
                "max_items": schema::integer("Maximum number of articles to return (1-100, default 25)"),
            }),
            &["query", "date_from"],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Dataset, MockDatasetSource};

    fn untouched_source() -> Arc<dyn DatasetSource> {
        let mut source = MockDatasetSource::new();
        source.expect_run_actor().times(0);
        Arc::new(source)
    }

    #[tokio::test]
    async fn test_parameters_checked_before_any_call() {
        let tool = GoogleNewsTool::new(untouched_source(), "lhotanova/google-news-scraper");

        let err = tool.fetch("Tesla", "10/01/2025", 25).await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidParameter { ref name, .. } if name == "date_from"));

        let err = tool.fetch(" ", "2025-01-10", 25).await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidParameter { ref name, .. } if name == "query"));

        let err = tool.fetch("Tesla", "2025-01-10", 0).await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidParameter { ref name, .. } if name == "max_items"));

        let err = tool.fetch("Tesla", "2025-01-10", 101).await.unwrap_err();
        assert!(matches!(err, ReportError::InvalidParameter { ref name, .. } if name == "max_items"));
    }

    #[tokio::test]
    async fn test_fetch_google_news() {
        let mut source = MockDatasetSource::new();
        source.expect_run_actor().times(1).returning(|_, input| {
            assert_eq!(input["dateFrom"], "2025-01-10");
            assert_eq!(input["maxItems"], 25);
            Ok(Dataset::new(
                "ds-news",
                vec![
                    json!({
                        "title": "Tesla deliveries rise",
                        "publishedAt": "2025-01-11T08:00:00Z",
                        "source": "Bloomberg",
                        "link": "https://news.google.com/1"
                    }),
                    json!({"title": "No link", "publishedAt": "2025-01-11", "source": "Blog"}),
                ],
            ))
        });
        let tool = GoogleNewsTool::new(Arc::new(source), "lhotanova/google-news-scraper");

        let value = tool
            .execute(json!({"query": "Tesla", "date_from": "2025-01-10"}))
            .await
            .unwrap();
        let news: Vec<TickerNewsEntry> = serde_json::from_value(value).unwrap();
        assert_eq!(news.len(), 1);
        assert_eq!(news[0].provider, "Bloomberg");
        assert_eq!(news[0].ticker, "Tesla");
        assert!(news[0].summary.is_none());
    }

    #[tokio::test]
    async fn test_null_max_items_uses_default() {
        let mut source = MockDatasetSource::new();
        source.expect_run_actor().times(2).returning(|_, input| {
            assert_eq!(input["maxItems"], DEFAULT_MAX_ITEMS);
            Ok(Dataset::new("ds-news", vec![]))
        });
        let tool = GoogleNewsTool::new(Arc::new(source), "lhotanova/google-news-scraper");

        tool.execute(json!({"query": "Tesla", "date_from": "2025-01-10", "max_items": null}))
            .await
            .unwrap();
        tool.execute(json!({"query": "Tesla", "date_from": "2025-01-10"}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_explicit_max_items_is_forwarded() {
        let mut source = MockDatasetSource::new();
        source.expect_run_actor().times(1).returning(|_, input| {
            assert_eq!(input["maxItems"], 7);
            Ok(Dataset::new("ds-news", vec![]))
        });
        let tool = GoogleNewsTool::new(Arc::new(source), "lhotanova/google-news-scraper");

        tool.execute(json!({"query": "Tesla", "date_from": "2025-01-10", "max_items": 7}))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_empty_results_are_not_an_error() {
        let mut source = MockDatasetSource::new();
        source
            .expect_run_actor()
            .returning(|_, _| Ok(Dataset::new("ds-none", vec![])));
        let tool = GoogleNewsTool::new(Arc::new(source), "lhotanova/google-news-scraper");

        assert!(tool.fetch("Obscure Corp", "2025-01-10", 5).await.unwrap().is_empty());
    }
}
