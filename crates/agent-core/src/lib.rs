//! Core types shared by the agent crates.
//!
//! Everything that runs a model, a tool or a pipeline step reports failures
//! through [`Error`], so the layers above can tell a bad input apart from a
//! failed call or an invalid structured answer.

pub mod error;

pub use error::{Error, Result};
