//! Error types for agent-core

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for agent operations
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// A component could not be constructed
    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    /// Input rejected before any work was done
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Work started but did not complete
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),

    /// The model provider returned an error
    #[error("Model request failed: {0}")]
    ModelFailed(String),

    /// Structured model output did not match the requested schema
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    /// The model-and-tools loop did not converge
    #[error("Iteration limit of {0} reached without a final answer")]
    IterationLimit(usize),
}

impl Error {
    /// Whether the error was caused by the caller's input
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::IterationLimit(10);
        assert_eq!(
            err.to_string(),
            "Iteration limit of 10 reached without a final answer"
        );

        let err = Error::SchemaViolation("unknown variant `bullish`".to_string());
        assert!(err.to_string().starts_with("Schema violation:"));
    }

    #[test]
    fn test_is_invalid_input() {
        assert!(Error::InvalidInput("ticker".to_string()).is_invalid_input());
        assert!(!Error::ProcessingFailed("boom".to_string()).is_invalid_input());
    }
}
