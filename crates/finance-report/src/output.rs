//! Writing the finished report to disk

use agent_llm::TokenUsage;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::Result;
use crate::models::{Sentiment, StructuredReport};

/// Appended to every markdown report
pub const DISCLAIMER: &str = "\n\n\n---\n\n\nThis report is generated by an AI agent and should not be considered as financial advice.\n";

/// Markdown file name
pub const MARKDOWN_FILE: &str = "report.md";

/// JSON file name
pub const JSON_FILE: &str = "report.json";

/// JSON record of a finished run
#[derive(Debug, Clone, Serialize)]
pub struct ReportRecord<'a> {
    pub ticker: &'a str,
    pub sentiment: Sentiment,
    pub sentiment_reason: &'a str,
    pub report: String,
    pub usage: TokenUsage,
}

impl<'a> ReportRecord<'a> {
    pub fn new(report: &'a StructuredReport, usage: TokenUsage) -> Self {
        Self {
            ticker: &report.ticker,
            sentiment: report.sentiment,
            sentiment_reason: &report.sentiment_reason,
            report: render_markdown(report),
            usage,
        }
    }
}

/// Report body followed by the disclaimer
pub fn render_markdown(report: &StructuredReport) -> String {
    format!("{}{DISCLAIMER}", report.report)
}

/// Paths of the written files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub markdown: PathBuf,
    pub json: PathBuf,
}

/// Write `report.md` and `report.json` into `dir`, creating it if needed
pub async fn write_outputs(
    dir: &Path,
    report: &StructuredReport,
    usage: TokenUsage,
) -> Result<OutputPaths> {
    tokio::fs::create_dir_all(dir).await?;

    let record = ReportRecord::new(report, usage);
    let paths = OutputPaths {
        markdown: dir.join(MARKDOWN_FILE),
        json: dir.join(JSON_FILE),
    };

    tokio::fs::write(&paths.markdown, &record.report).await?;
    tokio::fs::write(&paths.json, serde_json::to_vec_pretty(&record)?).await?;

    info!(
        ticker = %report.ticker,
        markdown = %paths.markdown.display(),
        json = %paths.json.display(),
        "Report written"
    );
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn report() -> StructuredReport {
        StructuredReport {
            ticker: "NVDA".to_string(),
            sentiment: Sentiment::StrongBuy,
            sentiment_reason: "Data center demand keeps growing.".to_string(),
            report: "## Executive Summary\n\nRecord revenue.".to_string(),
        }
    }

    #[test]
    fn test_render_markdown_appends_disclaimer() {
        let markdown = render_markdown(&report());
        assert!(markdown.starts_with("## Executive Summary"));
        assert!(markdown.ends_with("should not be considered as financial advice.\n"));
        assert!(markdown.contains("\n\n\n---\n\n\n"));
    }

    #[tokio::test]
    async fn test_write_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("output");
        let usage = TokenUsage {
            input_tokens: 1200,
            output_tokens: 300,
        };

        let paths = write_outputs(&out, &report(), usage).await.unwrap();

        let markdown = std::fs::read_to_string(&paths.markdown).unwrap();
        assert_eq!(markdown, render_markdown(&report()));

        let json: Value = serde_json::from_slice(&std::fs::read(&paths.json).unwrap()).unwrap();
        assert_eq!(json["ticker"], "NVDA");
        assert_eq!(json["sentiment"], "strong_buy");
        assert_eq!(json["usage"]["input_tokens"], 1200);
        assert_eq!(json["report"], markdown);
    }
}
