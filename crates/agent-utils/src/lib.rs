//! Shared utilities for the agent crates
//!
//! Currently this is the tracing setup used by every binary in the workspace.

pub mod logging;

pub use logging::{LogFormat, LogOptions, init_tracing};
