//! Error types for report generation

use thiserror::Error;

use crate::state::Phase;
use crate::supervisor::NextStep;

/// Report pipeline specific errors
#[derive(Debug, Error)]
pub enum ReportError {
    /// A tool or run argument was rejected before any request was made
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: String, reason: String },

    /// The dataset came back without the fields a record needs
    #[error(
        "Dataset \"{dataset_id}\" does not contain required fields {missing:?}! \
         It is possible that the ticker \"{ticker}\" is incorrect."
    )]
    DataUnavailable {
        dataset_id: String,
        ticker: String,
        missing: Vec<String>,
    },

    /// The actor finished but produced no items
    #[error("Dataset \"{dataset_id}\" from actor {actor} is empty")]
    EmptyDataset { dataset_id: String, actor: String },

    /// A step was invoked on a state it cannot work with
    #[error("Precondition violated: {0}")]
    PreconditionViolated(String),

    /// Structured model output did not satisfy the report schema
    #[error("Schema validation failed: {0}")]
    SchemaValidation(String),

    /// The loop stopped before a report was produced
    #[error("Run ended after {steps} steps without producing a report")]
    RunIncomplete { steps: usize },

    /// The supervisor picked a step the current phase does not allow
    #[error("Supervisor chose `{step}` while the run is {phase}")]
    InvalidTransition { phase: Phase, step: NextStep },

    /// Model call failed or did not converge
    #[error("Model error: {0}")]
    ModelError(String),

    /// Actor run or dataset request failed
    #[error("API error: {0}")]
    ApiError(String),

    /// Rate limit exceeded for API
    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    /// Network or HTTP error
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Prompt template failed to compile or render
    #[error("Template error: {0}")]
    TemplateError(#[from] minijinja::Error),

    /// Writing outputs failed
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl ReportError {
    /// Shorthand for [`ReportError::InvalidParameter`]
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for report operations
pub type Result<T> = std::result::Result<T, ReportError>;

/// Tools report through agent_core::Error; bad arguments stay distinguishable.
impl From<ReportError> for agent_core::Error {
    fn from(err: ReportError) -> Self {
        match err {
            ReportError::InvalidParameter { .. } => agent_core::Error::InvalidInput(err.to_string()),
            other => agent_core::Error::ProcessingFailed(other.to_string()),
        }
    }
}

impl From<agent_core::Error> for ReportError {
    fn from(err: agent_core::Error) -> Self {
        match err {
            agent_core::Error::SchemaViolation(msg) => ReportError::SchemaValidation(msg),
            other => ReportError::ModelError(other.to_string()),
        }
    }
}
