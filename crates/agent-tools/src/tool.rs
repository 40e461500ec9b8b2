//! Tool trait definition

use agent_core::Result;
use async_trait::async_trait;
use serde_json::Value;

/// A capability the model can invoke
///
/// Implementations validate `params` against their own expectations and
/// return [`agent_core::Error::InvalidInput`] before doing any I/O when they
/// do not match. Tools must be safe to call more than once with the same
/// input.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given parameters
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Unique name within a [`crate::ToolRegistry`]
    fn name(&self) -> &str;

    /// Description shown to the model
    fn description(&self) -> &str;

    /// JSON Schema of the accepted parameters
    ///
    /// ```
    /// use serde_json::json;
    ///
    /// let schema = json!({
    ///     "type": "object",
    ///     "properties": {
    ///         "ticker": { "type": "string", "description": "Ticker symbol, e.g. TSLA" }
    ///     },
    ///     "required": ["ticker"]
    /// });
    /// assert_eq!(schema["required"][0], "ticker");
    /// ```
    fn input_schema(&self) -> Value;
}
