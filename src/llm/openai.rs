//! OpenAI-compatible LLM client implementation.
//!
//! Implements the LlmClient trait for the chat-completions API. The base URL is
//! configurable, so Groq and other compatible endpoints work unchanged.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, Text2SqlError};
use crate::llm::types::{Message, ModelResponse};
use crate::llm::LlmClient;

/// OpenAI API base URL.
pub const OPENAI_API_URL: &str = "https://api.openai.com/v1";

/// OpenAI client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for authentication.
    pub api_key: String,
    /// Model to use (e.g., "gpt-4o-mini", "llama-3.3-70b-versatile").
    pub model: String,
    /// API base URL, without the `/chat/completions` suffix.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Ask for a JSON-object response.
    pub json_output: bool,
}

impl OpenAiConfig {
    /// Creates a new config with the given API key and model.
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_API_URL.to_string(),
            timeout_secs: None,
            json_output: false,
        }
    }

    /// Sets the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = Some(timeout_secs);
        self
    }

    /// Requests JSON-formatted output.
    pub fn with_json_output(mut self, json_output: bool) -> Self {
        self.json_output = json_output;
        self
    }
}

/// OpenAI-compatible LLM client.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

impl OpenAiClient {
    /// Creates a new OpenAI client with the given configuration.
    pub fn new(config: OpenAiConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| Text2SqlError::llm(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    /// Returns the model name requests are sent for.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Converts internal messages to OpenAI API format.
    fn convert_messages(messages: &[Message]) -> Vec<OpenAiMessage> {
        messages
            .iter()
            .map(|m| OpenAiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    fn build_request(&self, messages: &[Message]) -> OpenAiRequest {
        OpenAiRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            temperature: 0.0,
            response_format: self.config.json_output.then(|| ResponseFormat {
                kind: "json_object".to_string(),
            }),
        }
    }

    /// Turns a non-success API response into an error.
    fn parse_error(status: reqwest::StatusCode, body: &str) -> Text2SqlError {
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Text2SqlError::llm("Authentication failed. Check your API key.");
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Text2SqlError::llm("Rate limited. Please wait and try again.");
        }

        if let Ok(error_response) = serde_json::from_str::<OpenAiErrorResponse>(body) {
            return Text2SqlError::llm(format!(
                "OpenAI API error: {}",
                error_response.error.message
            ));
        }

        Text2SqlError::llm(format!("OpenAI API error ({}): {}", status, body))
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn complete(&self, messages: &[Message]) -> Result<ModelResponse> {
        let request = self.build_request(messages);
        debug!("Sending {} messages to {}", messages.len(), self.completions_url());

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Text2SqlError::llm("Request timed out. Try again.")
                } else if e.is_connect() {
                    Text2SqlError::llm("Failed to connect to the API. Check your network.")
                } else {
                    Text2SqlError::llm(format!("Request failed: {}", e))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Text2SqlError::llm(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(Self::parse_error(status, &body));
        }

        let response: OpenAiResponse = serde_json::from_str(&body)
            .map_err(|e| Text2SqlError::llm(format!("Failed to parse response: {}", e)))?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| Text2SqlError::llm("No response from the model"))?;

        Ok(ModelResponse::from_content(content, self.config.json_output))
    }
}

// OpenAI API types

#[derive(Debug, Serialize)]
struct OpenAiRequest {
    model: String,
    messages: Vec<OpenAiMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Serialize)]
struct OpenAiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponse {
    choices: Vec<OpenAiChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChoice {
    message: OpenAiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorResponse {
    error: OpenAiError,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    message: String,
}
