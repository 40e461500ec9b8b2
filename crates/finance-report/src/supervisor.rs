//! Supervisor deciding which step runs next
//!
//! [`RuleSupervisor`] routes purely on the state phase. [`ModelSupervisor`]
//! lets the model choose; the run loop still checks its choice against the
//! phase.

use agent_llm::Message;
use agent_llm::tools::schema;
use agent_runtime::{AgentRuntime, StructuredGenerator};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;
use tracing::debug;

use crate::error::{ReportError, Result};
use crate::prompts;
use crate::state::{Phase, RunState};

/// Status shown while data is gathered
pub const GATHERING_STATUS: &str = "gathering and analyzing data...";

/// Status shown while the report is written
pub const REPORTING_STATUS: &str = "creating report...";

/// Step chosen by a supervisor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStep {
    Analysis,
    Report,
}

impl fmt::Display for NextStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NextStep::Analysis => f.write_str("analysis"),
            NextStep::Report => f.write_str("report"),
        }
    }
}

/// Next step plus the status message to publish
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub next: NextStep,
    pub status: String,
}

impl Decision {
    pub fn new(next: NextStep, status: impl Into<String>) -> Self {
        Self {
            next,
            status: status.into(),
        }
    }
}

/// Chooses the next step from the current state
#[async_trait]
pub trait Supervisor: Send + Sync {
    /// Decide the next step. Must not be called once a report exists.
    async fn decide(&self, state: &RunState) -> Result<Decision>;

    /// Name used in logs
    fn name(&self) -> &str;
}

fn finished_error() -> ReportError {
    ReportError::PreconditionViolated("supervisor invoked after the report was produced".to_string())
}

/// Deterministic supervisor: analysis until one exists, then the report
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleSupervisor;

impl RuleSupervisor {
    pub fn new() -> Self {
        Self
    }

    /// Pure routing on the phase; ticker content is never read
    pub fn route(state: &RunState) -> Result<Decision> {
        match state.phase() {
            Phase::Gathering => Ok(Decision::new(NextStep::Analysis, GATHERING_STATUS)),
            Phase::Reporting => Ok(Decision::new(NextStep::Report, REPORTING_STATUS)),
            Phase::Done => Err(finished_error()),
        }
    }
}

#[async_trait]
impl Supervisor for RuleSupervisor {
    async fn decide(&self, state: &RunState) -> Result<Decision> {
        Self::route(state)
    }

    fn name(&self) -> &str {
        "rule"
    }
}

#[derive(Debug, Deserialize)]
struct ModelDecision {
    next_step: NextStep,
    status: String,
}

/// Supervisor that asks the model for `{next_step, status}`
pub struct ModelSupervisor {
    generator: StructuredGenerator,
}

impl ModelSupervisor {
    const SCHEMA_NAME: &'static str = "supervisor_decision";

    pub fn new(runtime: &AgentRuntime) -> Self {
        Self {
            generator: runtime.create_structured(Some(prompts::SUPERVISOR_SYSTEM)),
        }
    }

    fn decision_schema() -> Value {
        schema::strict_object(
            json!({
                "next_step": schema::string_enum("Step to run next", &["analysis", "report"]),
                "status": schema::string("Short status message for the user"),
            }),
            &["next_step", "status"],
        )
    }
}

#[async_trait]
impl Supervisor for ModelSupervisor {
    async fn decide(&self, state: &RunState) -> Result<Decision> {
        if state.phase() == Phase::Done {
            return Err(finished_error());
        }

        let messages = vec![Message::user(prompts::supervisor_state(
            state.ticker(),
            state.has_analysis(),
        )?)];
        let decision: ModelDecision = self
            .generator
            .generate(messages, Self::SCHEMA_NAME, Self::decision_schema())
            .await?;
        debug!(next_step = %decision.next_step, status = %decision.status, "Model supervisor decided");

        Ok(Decision::new(decision.next_step, decision.status.trim()))
    }

    fn name(&self) -> &str {
        "model"
    }
}
