//! Steps dispatched by the run loop

pub mod analysis;
pub mod report;

pub use analysis::AnalysisStep;
pub use report::ReportStep;

use async_trait::async_trait;

use crate::error::Result;
use crate::state::{RunState, StateUpdate};

/// One unit of work of a run. Reads the state, returns the fields it owns.
#[async_trait]
pub trait Step: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &'static str;

    /// Run the step against the current state
    async fn run(&self, state: &RunState) -> Result<StateUpdate>;
}

/// Current UTC date used in prompts
pub(crate) fn today() -> chrono::NaiveDate {
    chrono::Utc::now().date_naive()
}
