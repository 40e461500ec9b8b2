//! Agent runtime
//!
//! - [`AgentExecutor`] runs the model-and-tools loop until the model gives a
//!   final answer.
//! - [`StructuredGenerator`] asks the model for a JSON document matching a
//!   schema and deserializes it.
//! - [`UsageTracker`] accumulates token usage across every request.
//! - [`AgentRuntime`] owns the injected provider and hands out the above.

pub mod executor;
pub mod runtime;
pub mod structured;
pub mod usage;

// Re-export key types
pub use executor::{AgentExecutor, AgentExecutorBuilder, ExecutorConfig};
pub use runtime::{AgentRuntime, AgentRuntimeBuilder, RuntimeConfig};
pub use structured::{StructuredConfig, StructuredGenerator};
pub use usage::UsageTracker;
