//! Tool capabilities for LLM agents
//!
//! A [`Tool`] is a named, schema-described operation the model can invoke.
//! The [`ToolRegistry`] is the set of tools handed to an executor.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::Tool;
