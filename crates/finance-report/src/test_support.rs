//! Fixtures shared by the unit tests

use agent_llm::testing::ScriptedProvider;
use agent_runtime::AgentRuntime;
use agent_tools::ToolRegistry;
use serde_json::{Value, json};
use std::sync::Arc;

use crate::api::{Dataset, DatasetSource, MockDatasetSource};
use crate::config::ReportConfig;
use crate::tools::build_registry;

pub fn runtime_with(provider: Arc<ScriptedProvider>) -> AgentRuntime {
    AgentRuntime::builder()
        .provider(provider)
        .build()
        .unwrap()
}

/// Yahoo `gr` dataset with two complete periods
pub fn recommendations_dataset() -> Dataset {
    Dataset::new(
        "ds-gr",
        vec![json!({
            "ticker": "TSLA",
            "data": [
                {"period": "0m", "strongbuy": 7, "buy": 15, "hold": 16, "sell": 6, "strongsell": 3},
                {"period": "-1m", "strongbuy": 6, "buy": 14, "hold": 17, "sell": 6, "strongsell": 3}
            ]
        })],
    )
}

/// Registry of every fetch tool over a source that always returns `dataset`
pub fn tool_registry(dataset: Dataset) -> Arc<ToolRegistry> {
    let mut source = MockDatasetSource::new();
    source
        .expect_run_actor()
        .returning(move |_, _| Ok(dataset.clone()));
    let source: Arc<dyn DatasetSource> = Arc::new(source);
    Arc::new(build_registry(source, &ReportConfig::default()).unwrap())
}

pub fn report_json(ticker: &str, sentiment: &str) -> Value {
    json!({
        "ticker": ticker,
        "sentiment": sentiment,
        "sentiment_reason": "Analysts raised targets after strong deliveries.",
        "report": "## Executive Summary\n\nSolid quarter.\n\n## Conclusion\n\nPositive outlook."
    })
}
