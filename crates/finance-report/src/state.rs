//! Shared run state and the partial updates steps return

use serde::Serialize;
use std::fmt;

use crate::models::StructuredReport;
use crate::supervisor::NextStep;

/// Phase of a run, derived from which fields of the state are filled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// No usable analysis yet
    Gathering,
    /// Analysis present, report missing
    Reporting,
    /// Report produced; terminal
    Done,
}

impl Phase {
    /// Whether `step` may run in this phase
    pub fn permits(self, step: NextStep) -> bool {
        matches!(
            (self, step),
            (Phase::Gathering, NextStep::Analysis) | (Phase::Reporting, NextStep::Report)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Gathering => "GATHERING",
            Phase::Reporting => "REPORTING",
            Phase::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// Accumulated state of one report run.
///
/// The ticker is fixed at construction. Everything else changes only through
/// [`RunState::apply`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunState {
    ticker: String,
    status: String,
    analysis: Option<String>,
    report: Option<StructuredReport>,
}

impl RunState {
    /// Fresh state for `ticker`
    pub fn new(ticker: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            status: String::new(),
            analysis: None,
            report: None,
        }
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    /// Latest human-readable progress message
    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn analysis(&self) -> Option<&str> {
        self.analysis.as_deref()
    }

    pub fn report(&self) -> Option<&StructuredReport> {
        self.report.as_ref()
    }

    /// An analysis counts only when it has non-whitespace content
    pub fn has_analysis(&self) -> bool {
        self.analysis
            .as_deref()
            .is_some_and(|analysis| !analysis.trim().is_empty())
    }

    pub fn phase(&self) -> Phase {
        if self.report.is_some() {
            Phase::Done
        } else if self.has_analysis() {
            Phase::Reporting
        } else {
            Phase::Gathering
        }
    }

    /// Merge a partial update. Provided fields overwrite, absent fields are
    /// kept, and a blank analysis never replaces a usable one.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(analysis) = update.analysis {
            if !analysis.trim().is_empty() || !self.has_analysis() {
                self.analysis = Some(analysis);
            }
        }
        if let Some(report) = update.report {
            self.report = Some(report);
        }
    }

    /// Consume the state, returning the report if one was produced
    pub fn into_report(self) -> Option<StructuredReport> {
        self.report
    }
}

/// Partial update returned by a step
#[derive(Debug, Clone, Default, PartialEq)]
#[must_use]
pub struct StateUpdate {
    pub status: Option<String>,
    pub analysis: Option<String>,
    pub report: Option<StructuredReport>,
}

impl StateUpdate {
    pub fn status(status: impl Into<String>) -> Self {
        Self {
            status: Some(status.into()),
            ..Self::default()
        }
    }

    pub fn analysis(analysis: impl Into<String>) -> Self {
        Self {
            analysis: Some(analysis.into()),
            ..Self::default()
        }
    }

    pub fn report(report: StructuredReport) -> Self {
        Self {
            report: Some(report),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.analysis.is_none() && self.report.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;

    fn report() -> StructuredReport {
        StructuredReport {
            ticker: "AAPL".to_string(),
            sentiment: Sentiment::Buy,
            sentiment_reason: "reason".to_string(),
            report: "body".to_string(),
        }
    }

    #[test]
    fn test_phase_follows_fields() {
        let mut state = RunState::new("AAPL");
        assert_eq!(state.phase(), Phase::Gathering);

        state.apply(StateUpdate::analysis("  \n"));
        assert_eq!(state.phase(), Phase::Gathering);

        state.apply(StateUpdate::analysis("Revenue grew 8%"));
        assert_eq!(state.phase(), Phase::Reporting);

        state.apply(StateUpdate::report(report()));
        assert_eq!(state.phase(), Phase::Done);
    }

    #[test]
    fn test_apply_keeps_absent_fields() {
        let mut state = RunState::new("AAPL");
        state.apply(StateUpdate::status("working"));
        state.apply(StateUpdate::analysis("notes"));

        assert_eq!(state.status(), "working");
        assert_eq!(state.analysis(), Some("notes"));
        assert_eq!(state.ticker(), "AAPL");
        assert!(StateUpdate::default().is_empty());
    }

    #[test]
    fn test_blank_analysis_does_not_clear() {
        let mut state = RunState::new("AAPL");
        state.apply(StateUpdate::analysis("notes"));
        state.apply(StateUpdate::analysis(""));
        assert_eq!(state.analysis(), Some("notes"));

        state.apply(StateUpdate::analysis("better notes"));
        assert_eq!(state.analysis(), Some("better notes"));
    }

    #[test]
    fn test_permits() {
        assert!(Phase::Gathering.permits(NextStep::Analysis));
        assert!(!Phase::Gathering.permits(NextStep::Report));
        assert!(Phase::Reporting.permits(NextStep::Report));
        assert!(!Phase::Reporting.permits(NextStep::Analysis));
        assert!(!Phase::Done.permits(NextStep::Analysis));
        assert!(!Phase::Done.permits(NextStep::Report));
        assert_eq!(Phase::Reporting.to_string(), "REPORTING");
    }
}
