//! Scripted provider for tests

use crate::{
    CompletionRequest, CompletionResponse, ContentBlock, LLMError, LLMProvider, Message, Result,
    Role, StopReason, TokenUsage,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

/// Usage reported by every scripted response
pub const SCRIPTED_USAGE: TokenUsage = TokenUsage {
    input_tokens: 10,
    output_tokens: 5,
};

/// Provider that replays queued responses in order and records every request.
#[derive(Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<CompletionResponse>>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl ScriptedProvider {
    /// Create a provider with an empty script
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a final text answer
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.then_response(CompletionResponse {
            message: Message::blocks(
                Role::Assistant,
                vec![ContentBlock::Text { text: text.into() }],
            ),
            stop_reason: StopReason::EndTurn,
            usage: SCRIPTED_USAGE,
        })
    }

    /// Queue a final answer that is a JSON document
    pub fn then_json(self, value: &Value) -> Self {
        self.then_text(value.to_string())
    }

    /// Queue a turn requesting the given `(id, tool name, input)` calls
    pub fn then_tool_calls(self, calls: Vec<(&str, &str, Value)>) -> Self {
        let blocks = calls
            .into_iter()
            .map(|(id, name, input)| ContentBlock::tool_use(id, name, input))
            .collect();
        self.then_response(CompletionResponse {
            message: Message::blocks(Role::Assistant, blocks),
            stop_reason: StopReason::ToolUse,
            usage: SCRIPTED_USAGE,
        })
    }

    /// Queue an arbitrary response
    pub fn then_response(self, response: CompletionResponse) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Ok(response));
        self
    }

    /// Queue an error
    pub fn then_error(self, error: LLMError) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Err(error));
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of queued responses not consumed yet
    pub fn remaining(&self) -> usize {
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        self.responses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or_else(|| {
                Err(LLMError::UnexpectedResponse(
                    "scripted provider has no responses left".to_string(),
                ))
            })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
