//! Report step: turn the analysis into a structured report

use agent_llm::Message;
use agent_runtime::{AgentRuntime, StructuredGenerator};
use async_trait::async_trait;
use std::time::Instant;
use tracing::{info, warn};

use super::{Step, today};
use crate::error::{ReportError, Result};
use crate::models::StructuredReport;
use crate::prompts;
use crate::state::{RunState, StateUpdate};

/// Single structured-output call, no tools
pub struct ReportStep {
    generator: StructuredGenerator,
}

impl ReportStep {
    pub fn new(runtime: &AgentRuntime) -> Self {
        Self {
            generator: runtime.create_structured(Some(prompts::REPORT_SYSTEM)),
        }
    }

    /// Write the report for `ticker` from `analysis`.
    ///
    /// A blank analysis is rejected before the model is called.
    pub async fn generate_report(&self, ticker: &str, analysis: &str) -> Result<StructuredReport> {
        if analysis.trim().is_empty() {
            return Err(ReportError::PreconditionViolated(format!(
                "analysis for {ticker} is missing, the report cannot be written"
            )));
        }

        let started = Instant::now();
        let messages = vec![
            Message::user(prompts::report_request(ticker, today())?),
            Message::user(prompts::report_analysis(analysis)?),
        ];
        let value = self
            .generator
            .generate_value(
                messages,
                StructuredReport::SCHEMA_NAME,
                StructuredReport::json_schema(),
            )
            .await?;
        let report = StructuredReport::from_value(value)?;

        if !report.ticker.eq_ignore_ascii_case(ticker) {
            warn!(ticker = %ticker, report_ticker = %report.ticker, "Report names a different ticker");
        }
        info!(
            ticker = %ticker,
            sentiment = %report.sentiment,
            report_length = report.report.len(),
            duration_ms = started.elapsed().as_millis(),
            "Report generated"
        );
        Ok(report)
    }
}

#[async_trait]
impl Step for ReportStep {
    fn name(&self) -> &'static str {
        "report"
    }

    async fn run(&self, state: &RunState) -> Result<StateUpdate> {
        let report = self
            .generate_report(state.ticker(), state.analysis().unwrap_or_default())
            .await?;
        Ok(StateUpdate::report(report))
    }
}
