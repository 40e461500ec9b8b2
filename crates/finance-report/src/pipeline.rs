//! Run loop driving a report from ticker to structured output
//!
//! The loop asks the supervisor for the next step, checks the decision
//! against the state phase, publishes status changes and merges each step's
//! update until a report exists or the step budget runs out.

use agent_runtime::AgentRuntime;
use agent_tools::ToolRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{Instrument, debug, info, info_span};
use uuid::Uuid;

use crate::config::{ReportConfig, SupervisorKind};
use crate::error::{ReportError, Result};
use crate::models::StructuredReport;
use crate::state::{Phase, RunState, StateUpdate};
use crate::steps::{AnalysisStep, ReportStep, Step};
use crate::supervisor::{ModelSupervisor, NextStep, RuleSupervisor, Supervisor};
use crate::tools::normalize_ticker;

/// Receives human-readable progress messages
#[async_trait]
pub trait StatusObserver: Send + Sync {
    async fn on_status(&self, status: &str);
}

/// Observer that only logs
#[derive(Debug, Clone, Copy, Default)]
pub struct LogStatusObserver;

#[async_trait]
impl StatusObserver for LogStatusObserver {
    async fn on_status(&self, status: &str) {
        info!(status = %status, "Status changed");
    }
}

/// Streams statuses into a channel; a closed receiver is ignored
#[async_trait]
impl StatusObserver for UnboundedSender<String> {
    async fn on_status(&self, status: &str) {
        let _ = self.send(status.to_string());
    }
}

/// Supervised two-step pipeline producing a [`StructuredReport`]
pub struct ReportPipeline {
    supervisor: Arc<dyn Supervisor>,
    analysis: Arc<dyn Step>,
    report: Arc<dyn Step>,
    observer: Arc<dyn StatusObserver>,
    max_steps: usize,
}

impl ReportPipeline {
    /// Create a new pipeline builder
    pub fn builder() -> ReportPipelineBuilder {
        ReportPipelineBuilder::default()
    }

    /// Builder with the standard steps and the configured supervisor
    pub fn from_config(
        runtime: &AgentRuntime,
        tools: Arc<ToolRegistry>,
        config: &ReportConfig,
    ) -> ReportPipelineBuilder {
        let supervisor: Arc<dyn Supervisor> = match config.supervisor {
            SupervisorKind::Rule => Arc::new(RuleSupervisor::new()),
            SupervisorKind::Model => Arc::new(ModelSupervisor::new(runtime)),
        };

        Self::builder()
            .supervisor(supervisor)
            .analysis_step(Arc::new(AnalysisStep::new(runtime, tools)))
            .report_step(Arc::new(ReportStep::new(runtime)))
            .max_steps(config.max_steps)
    }

    /// Generate the report for `ticker`
    pub async fn execute(&self, ticker: &str) -> Result<StructuredReport> {
        let ticker = normalize_ticker(ticker)?;
        let run_id = Uuid::new_v4();
        let span = info_span!(
            "report_run",
            %run_id,
            ticker = %ticker,
            supervisor = self.supervisor.name()
        );

        self.drive(RunState::new(ticker)).instrument(span).await
    }

    async fn drive(&self, mut state: RunState) -> Result<StructuredReport> {
        info!(max_steps = self.max_steps, "Run started");
        let mut last_status: Option<String> = None;
        let mut steps = 0;

        while state.phase() != Phase::Done && steps < self.max_steps {
            steps += 1;
            let phase = state.phase();

            let decision = self.supervisor.decide(&state).await?;
            if !phase.permits(decision.next) {
                return Err(ReportError::InvalidTransition {
                    phase,
                    step: decision.next,
                });
            }

            state.apply(StateUpdate::status(decision.status));
            self.notify(&state, &mut last_status).await;

            let step = self.step_for(decision.next);
            debug!(step_number = steps, step = step.name(), %phase, "Dispatching step");
            let update = step.run(&state).await?;
            state.apply(update);
            self.notify(&state, &mut last_status).await;
        }

        match state.into_report() {
            Some(report) => {
                info!(steps, sentiment = %report.sentiment, "Run finished");
                Ok(report)
            }
            None => Err(ReportError::RunIncomplete { steps }),
        }
    }

    fn step_for(&self, next: NextStep) -> &Arc<dyn Step> {
        match next {
            NextStep::Analysis => &self.analysis,
            NextStep::Report => &self.report,
        }
    }

    /// Publish the status if it is non-empty and differs from the last one
    async fn notify(&self, state: &RunState, last_status: &mut Option<String>) {
        let status = state.status();
        if status.is_empty() || last_status.as_deref() == Some(status) {
            return;
        }
        self.observer.on_status(status).await;
        *last_status = Some(status.to_string());
    }
}

/// Builder for ReportPipeline
pub struct ReportPipelineBuilder {
    supervisor: Arc<dyn Supervisor>,
    analysis: Option<Arc<dyn Step>>,
    report: Option<Arc<dyn Step>>,
    observer: Arc<dyn StatusObserver>,
    max_steps: usize,
}

impl Default for ReportPipelineBuilder {
    fn default() -> Self {
        Self {
            supervisor: Arc::new(RuleSupervisor::new()),
            analysis: None,
            report: None,
            observer: Arc::new(LogStatusObserver),
            max_steps: ReportConfig::default().max_steps,
        }
    }
}

impl ReportPipelineBuilder {
    /// Set the supervisor
    pub fn supervisor(mut self, supervisor: Arc<dyn Supervisor>) -> Self {
        self.supervisor = supervisor;
        self
    }

    /// Set the data-gathering step
    pub fn analysis_step(mut self, step: Arc<dyn Step>) -> Self {
        self.analysis = Some(step);
        self
    }

    /// Set the report-writing step
    pub fn report_step(mut self, step: Arc<dyn Step>) -> Self {
        self.report = Some(step);
        self
    }

    /// Set the status observer
    pub fn observer(mut self, observer: Arc<dyn StatusObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Set the supervisor decisions allowed per run
    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<ReportPipeline> {
        let analysis = self
            .analysis
            .ok_or_else(|| ReportError::ConfigError("analysis step not set".to_string()))?;
        let report = self
            .report
            .ok_or_else(|| ReportError::ConfigError("report step not set".to_string()))?;
        if self.max_steps == 0 {
            return Err(ReportError::ConfigError(
                "max_steps must be greater than 0".to_string(),
            ));
        }

        Ok(ReportPipeline {
            supervisor: self.supervisor,
            analysis,
            report,
            observer: self.observer,
            max_steps: self.max_steps,
        })
    }
}
