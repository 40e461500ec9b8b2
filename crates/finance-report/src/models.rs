//! Normalized tool records and the structured report

use agent_llm::tools::schema;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

use crate::error::{ReportError, Result};

/// Company profile returned by `get_ticker_basic_info`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerInfo {
    pub ticker: String,
    pub sector: String,
    pub industry: String,
    pub description: String,
}

/// One news article about a ticker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerNewsEntry {
    pub ticker: String,
    pub title: String,
    pub url: String,
    /// Publisher name
    pub provider: String,
    pub published_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
}

/// Analyst price targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerPriceTarget {
    pub ticker: String,
    pub current: f64,
    pub high: f64,
    pub low: f64,
    pub mean: f64,
    pub median: f64,
}

/// Analyst rating counts for one period, e.g. "0m" or "-1m"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickerRecommendationEntry {
    pub ticker: String,
    pub period: String,
    pub strong_buy: u32,
    pub buy: u32,
    pub hold: u32,
    pub sell: u32,
    pub strong_sell: u32,
}

/// Overall recommendation of a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    StrongBuy,
    Buy,
    Hold,
    Sell,
    StrongSell,
}

impl Sentiment {
    /// Every sentiment, strongest buy first
    pub const ALL: [Sentiment; 5] = [
        Sentiment::StrongBuy,
        Sentiment::Buy,
        Sentiment::Hold,
        Sentiment::Sell,
        Sentiment::StrongSell,
    ];

    /// Wire name of the sentiment
    pub fn as_str(self) -> &'static str {
        match self {
            Sentiment::StrongBuy => "strong_buy",
            Sentiment::Buy => "buy",
            Sentiment::Hold => "hold",
            Sentiment::Sell => "sell",
            Sentiment::StrongSell => "strong_sell",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Final output of a run.
///
/// Produced once by the report step and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StructuredReport {
    /// Ticker the report is about
    pub ticker: String,
    /// Overall recommendation
    pub sentiment: Sentiment,
    /// Short justification of the sentiment
    pub sentiment_reason: String,
    /// Markdown report body
    pub report: String,
}

impl StructuredReport {
    /// Name under which the schema is sent to the model
    pub const SCHEMA_NAME: &'static str = "structured_report";

    /// Strict JSON schema of the report
    pub fn json_schema() -> Value {
        let sentiments: Vec<&str> = Sentiment::ALL.iter().map(|s| s.as_str()).collect();
        schema::strict_object(
            json!({
                "ticker": schema::string("Ticker symbol the report is about"),
                "sentiment": schema::string_enum(
                    "Overall recommendation for the ticker",
                    &sentiments,
                ),
                "sentiment_reason": schema::string("Short explanation of the chosen sentiment"),
                "report": schema::string("Full report in markdown format"),
            }),
            &["ticker", "sentiment", "sentiment_reason", "report"],
        )
    }

    /// Parse and validate a model answer
    pub fn from_value(value: Value) -> Result<Self> {
        let report: Self = serde_json::from_value(value)
            .map_err(|e| ReportError::SchemaValidation(format!("report does not match the schema: {e}")))?;
        report.validate()?;
        Ok(report)
    }

    /// Reject reports with blank fields
    pub fn validate(&self) -> Result<()> {
        for (field, value) in [
            ("ticker", &self.ticker),
            ("sentiment_reason", &self.sentiment_reason),
            ("report", &self.report),
        ] {
            if value.trim().is_empty() {
                return Err(ReportError::SchemaValidation(format!(
                    "field `{field}` must not be empty"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_json(sentiment: &str) -> Value {
        json!({
            "ticker": "AAPL",
            "sentiment": sentiment,
            "sentiment_reason": "Strong services growth",
            "report": "# Apple\n\nSolid quarter."
        })
    }

    #[test]
    fn test_sentiment_wire_names() {
        assert_eq!(serde_json::to_value(Sentiment::StrongBuy).unwrap(), "strong_buy");
        assert_eq!(Sentiment::StrongSell.to_string(), "strong_sell");
        for sentiment in Sentiment::ALL {
            let parsed: Sentiment = serde_json::from_value(json!(sentiment.as_str())).unwrap();
            assert_eq!(parsed, sentiment);
        }
    }

    #[test]
    fn test_report_from_value() {
        let report = StructuredReport::from_value(report_json("hold")).unwrap();
        assert_eq!(report.sentiment, Sentiment::Hold);
        assert_eq!(report.ticker, "AAPL");
    }

    #[test]
    fn test_unknown_sentiment_rejected() {
        let err = StructuredReport::from_value(report_json("bullish")).unwrap_err();
        assert!(matches!(err, ReportError::SchemaValidation(ref msg) if msg.contains("bullish")));
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut value = report_json("buy");
        value["report"] = json!("   ");
        let err = StructuredReport::from_value(value).unwrap_err();
        assert!(matches!(err, ReportError::SchemaValidation(ref msg) if msg.contains("report")));
    }

    #[test]
    fn test_extra_fields_rejected() {
        let mut value = report_json("buy");
        value["confidence"] = json!(0.9);
        assert!(StructuredReport::from_value(value).is_err());
    }

    #[test]
    fn test_schema_lists_every_sentiment() {
        let schema = StructuredReport::json_schema();
        assert_eq!(
            schema["properties"]["sentiment"]["enum"],
            json!(["strong_buy", "buy", "hold", "sell", "strong_sell"])
        );
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"].as_array().unwrap().len(), 4);
    }
}
