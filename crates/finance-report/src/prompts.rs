//! Prompt templates for the analysis, report and supervisor steps

use chrono::NaiveDate;
use minijinja::{Environment, Value, context};

use crate::error::Result;

// ============================================================================
// Analysis
// ============================================================================

/// System prompt of the analysis step
pub const ANALYSIS_SYSTEM: &str = "You are an AI agent specialized in gathering and summarizing \
financial data. Use the available tools to collect relevant data about the stock ticker and \
summarize it. Include news and other important information, analyst recommendations and price \
targets. Use every data source you have access to: if news tools exist for both Yahoo Finance \
and Google News, call both. Whenever a source URL is available, for example for a news article, \
include it in the summary. If a tool fails, you may call it once more.";

/// User message opening the analysis step
pub fn analysis_request(ticker: &str, today: NaiveDate) -> Result<String> {
    render(
        ANALYSIS_REQUEST,
        context! { ticker, today => today.format("%Y-%m-%d").to_string() },
    )
}

// ============================================================================
// Report
// ============================================================================

/// System prompt of the report step
pub const REPORT_SYSTEM: &str = "You are an AI agent that writes financial reports. Create a \
comprehensive report about the stock ticker from the provided data. Whenever a source URL is \
available, for example for a news article, include it in the report. Do not make up any data; \
leave out anything you do not know. Do not address the user, only write the report.\n\
The report must be markdown with this outline:\n\
- Executive Summary: brief overview of the news and the financial health of the company.\n\
- News: recent news and events that may have moved the stock price.\n\
- Stock Price: current price and analyst price targets.\n\
- Analyst Recommendations: current analyst recommendations for the stock.\n\
- Conclusion: final thoughts on the stock and its prospects.\n\
Explain the chosen sentiment in at most two sentences.";

/// User message naming the ticker and date of the report
pub fn report_request(ticker: &str, today: NaiveDate) -> Result<String> {
    render(
        REPORT_REQUEST,
        context! { ticker, today => today.format("%Y-%m-%d").to_string() },
    )
}

/// User message carrying the analysis
pub fn report_analysis(analysis: &str) -> Result<String> {
    render(REPORT_ANALYSIS, context! { analysis })
}

// ============================================================================
// Supervisor
// ============================================================================

/// System prompt of the model-driven supervisor
pub const SUPERVISOR_SYSTEM: &str = "You supervise a financial report run with two steps. \
`analysis` gathers data with tools and summarizes it. `report` turns an existing analysis into \
the final report. Pick the next step and a short lowercase status message for the user, \
for example \"gathering and analyzing data...\" or \"creating report...\".";

/// State summary given to the model-driven supervisor
pub fn supervisor_state(ticker: &str, has_analysis: bool) -> Result<String> {
    render(SUPERVISOR_STATE, context! { ticker, has_analysis })
}

// ============================================================================
// Templates
// ============================================================================

const ANALYSIS_REQUEST: &str = "finance.user.analysis_request";
const REPORT_REQUEST: &str = "finance.user.report_request";
const REPORT_ANALYSIS: &str = "finance.user.report_analysis";
const SUPERVISOR_STATE: &str = "finance.user.supervisor_state";

const TEMPLATES: &[(&str, &str)] = &[
    (
        ANALYSIS_REQUEST,
        "Gather data about the ticker and summarize it.\nTicker: {{ ticker }}\nToday's date: {{ today }}",
    ),
    (
        REPORT_REQUEST,
        "Write the report.\nTicker: {{ ticker }}\nToday's date: {{ today }}",
    ),
    (
        REPORT_ANALYSIS,
        "Here is the ticker news and analysis:\n{{ analysis }}",
    ),
    (
        SUPERVISOR_STATE,
        "Ticker: {{ ticker }}\nAnalysis: {% if has_analysis %}present{% else %}missing{% endif %}\nReport: missing",
    ),
];

/// Environment holding every user message template
pub fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    for &(name, source) in TEMPLATES {
        env.add_template(name, source)?;
    }
    Ok(env)
}

fn render(name: &str, ctx: Value) -> Result<String> {
    let env = environment()?;
    Ok(env.get_template(name)?.render(ctx)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_carry_ticker_and_date() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();
        let request = analysis_request("AAPL", today).unwrap();
        assert_eq!(
            request,
            "Gather data about the ticker and summarize it.\nTicker: AAPL\nToday's date: 2025-01-09"
        );
        assert!(report_request("TSLA", today).unwrap().contains("2025-01-09"));
    }

    #[test]
    fn test_report_analysis_is_not_escaped() {
        let analysis = "Revenue <up> & margins \"stable\"";
        let message = report_analysis(analysis).unwrap();
        assert!(message.ends_with(analysis));
    }

    #[test]
    fn test_supervisor_state() {
        assert_eq!(
            supervisor_state("AAPL", false).unwrap(),
            "Ticker: AAPL\nAnalysis: missing\nReport: missing"
        );
        assert!(supervisor_state("AAPL", true).unwrap().contains("Analysis: present"));
    }

    #[test]
    fn test_environment_compiles_every_template() {
        let env = environment().unwrap();
        for (name, _) in TEMPLATES {
            assert!(env.get_template(name).is_ok(), "missing template {name}");
        }
    }
}
