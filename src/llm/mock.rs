//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns and records every
//! prompt it receives.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{Result, Text2SqlError};
use crate::llm::types::{Message, ModelResponse, Role};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Clones share the prompt log, so a test can keep one handle and pass the
/// other to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, ModelResponse)>,
    /// When set, every call fails with this message.
    failure: Option<String>,
    prompts: Arc<Mutex<Vec<Vec<Message>>>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom text response.
    ///
    /// When the last user message contains `pattern` (case-insensitive), the
    /// mock returns `response`.
    pub fn with_response(mut self, pattern: impl Into<String>, response: impl Into<String>) -> Self {
        self.custom_responses
            .push((pattern.into(), ModelResponse::Text(response.into())));
        self
    }

    /// Adds a custom structured response.
    pub fn with_json_response(
        mut self,
        pattern: impl Into<String>,
        response: serde_json::Value,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), ModelResponse::Json(response)));
        self
    }

    /// Makes every call fail with `message`.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    /// Returns every prompt received so far, oldest first.
    pub fn prompts(&self) -> Vec<Vec<Message>> {
        self.prompts
            .lock()
            .map(|p| p.clone())
            .unwrap_or_else(|e| e.into_inner().clone())
    }

    /// Generates a mock response based on the input.
    fn mock_response(&self, input: &str) -> ModelResponse {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        // Answer prompts carry the question and rendered results
        if let Some(rest) = input.strip_prefix("Question: ") {
            let question = rest.lines().next().unwrap_or_default();
            return ModelResponse::Text(format!(
                "{{\"answer\": \"Mock answer for: {}\"}}",
                question.replace('"', "'")
            ));
        }

        ModelResponse::Text("```sql\nSELECT 1 AS mock_value LIMIT 50;\n```".to_string())
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<ModelResponse> {
        match self.prompts.lock() {
            Ok(mut prompts) => prompts.push(messages.to_vec()),
            Err(e) => e.into_inner().push(messages.to_vec()),
        }

        if let Some(message) = &self.failure {
            return Err(Text2SqlError::llm(message.clone()));
        }

        let input = Self::extract_user_input(messages);
        Ok(self.mock_response(&input))
    }
}
