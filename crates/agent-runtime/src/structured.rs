//! Structured generation: one model call constrained by a JSON schema

use agent_core::{Error, Result};
use agent_llm::{CompletionRequest, LLMProvider, Message, ResponseFormat, StopReason};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::UsageTracker;

/// Settings for structured generation requests
#[derive(Debug, Clone)]
pub struct StructuredConfig {
    /// Model to use
    pub model: String,
    /// Max tokens of the answer
    pub max_tokens: usize,
    /// Temperature
    pub temperature: Option<f32>,
    /// System prompt
    pub system_prompt: Option<String>,
}

impl Default for StructuredConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 4096,
            temperature: None,
            system_prompt: None,
        }
    }
}

/// Asks the model for a JSON object matching a schema.
///
/// No tools are offered and nothing is retried: an answer that does not
/// parse, or does not deserialize into the target type, is an
/// [`Error::SchemaViolation`].
pub struct StructuredGenerator {
    provider: Arc<dyn LLMProvider>,
    usage: Arc<UsageTracker>,
    config: StructuredConfig,
}

impl StructuredGenerator {
    /// Create a generator
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        usage: Arc<UsageTracker>,
        config: StructuredConfig,
    ) -> Self {
        Self {
            provider,
            usage,
            config,
        }
    }

    /// Generate and deserialize into `T`
    pub async fn generate<T: DeserializeOwned>(
        &self,
        messages: Vec<Message>,
        schema_name: &str,
        schema: Value,
    ) -> Result<T> {
        let value = self.generate_value(messages, schema_name, schema).await?;
        serde_json::from_value(value).map_err(|e| {
            Error::SchemaViolation(format!("`{schema_name}` does not match the schema: {e}"))
        })
    }

    /// Generate and return the raw JSON document
    pub async fn generate_value(
        &self,
        messages: Vec<Message>,
        schema_name: &str,
        schema: Value,
    ) -> Result<Value> {
        let mut builder = CompletionRequest::builder(&self.config.model)
            .messages(messages)
            .max_tokens(self.config.max_tokens)
            .response_format(ResponseFormat::json_schema(schema_name, schema));
        if let Some(system) = &self.config.system_prompt {
            builder = builder.system(system.clone());
        }
        if let Some(temperature) = self.config.temperature {
            builder = builder.temperature(temperature);
        }

        info!(model = %self.config.model, schema = %schema_name, "Requesting structured output");
        let response = self
            .provider
            .complete(builder.build())
            .await
            .map_err(|e| Error::ModelFailed(e.to_string()))?;
        self.usage.record(response.usage);

        if response.stop_reason == StopReason::MaxTokens {
            return Err(Error::SchemaViolation(format!(
                "`{schema_name}` output was truncated at {} tokens",
                self.config.max_tokens
            )));
        }

        let text = response.message.text().unwrap_or_default();
        debug!(schema = %schema_name, output_length = text.len(), "Structured output received");

        let value: Value = serde_json::from_str(strip_code_fence(&text)).map_err(|e| {
            Error::SchemaViolation(format!("`{schema_name}` output is not valid JSON: {e}"))
        })?;
        if !value.is_object() {
            return Err(Error::SchemaViolation(format!(
                "`{schema_name}` output is not a JSON object"
            )));
        }
        Ok(value)
    }
}

/// Compatible servers without native structured output sometimes wrap the
/// document in a markdown code fence.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use agent_llm::testing::ScriptedProvider;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    #[serde(rename_all = "snake_case")]
    enum Verdict {
        Buy,
        Sell,
    }

    #[derive(Debug, Deserialize)]
    struct Answer {
        verdict: Verdict,
    }

    fn generator(provider: Arc<ScriptedProvider>) -> StructuredGenerator {
        StructuredGenerator::new(
            provider,
            Arc::new(UsageTracker::new()),
            StructuredConfig::default(),
        )
    }

    #[test]
    fn test_strip_code_fence() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
    }

    #[tokio::test]
    async fn test_generate_typed() {
        let provider = Arc::new(ScriptedProvider::new().then_json(&json!({"verdict": "buy"})));
        let answer: Answer = generator(provider.clone())
            .generate(vec![Message::user("verdict?")], "verdict", json!({"type": "object"}))
            .await
            .unwrap();

        assert_eq!(answer.verdict, Verdict::Buy);
        let request = &provider.requests()[0];
        assert!(request.tools.is_none());
        assert!(matches!(
            request.response_format,
            Some(ResponseFormat::JsonSchema { ref name, strict: true, .. }) if name == "verdict"
        ));
    }

    #[tokio::test]
    async fn test_value_outside_enum_is_schema_violation() {
        let provider = Arc::new(ScriptedProvider::new().then_json(&json!({"verdict": "bullish"})));
        let err = generator(provider)
            .generate::<Answer>(vec![Message::user("verdict?")], "verdict", json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SchemaViolation(ref msg) if msg.contains("bullish")));
    }

    #[tokio::test]
    async fn test_non_json_is_schema_violation() {
        let provider = Arc::new(ScriptedProvider::new().then_text("I think you should buy"));
        let err = generator(provider)
            .generate_value(vec![Message::user("verdict?")], "verdict", json!({}))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::SchemaViolation(_)));
    }
}
