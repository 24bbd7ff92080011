//! Ollama LLM client implementation.
//!
//! Implements the LlmClient trait for local Ollama instances via `/api/chat`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, Text2SqlError};
use crate::llm::types::{Message, ModelResponse};
use crate::llm::LlmClient;

/// Default Ollama API URL.
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama client configuration.
#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL for the Ollama API.
    pub base_url: String,
    /// Model to use (e.g., "gemma3:12b", "llama3.2:3b").
    pub model: String,
    /// Request timeout in seconds. `None` waits for as long as the server takes.
    pub timeout_secs: Option<u64>,
    /// Ask the server for a JSON-object response.
    pub json_output: bool,
}

impl OllamaConfig {
    /// Creates a new config with the given model.
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_OLLAMA_URL.to_string(),
            model: model.into(),
            timeout_secs: None,
            json_output: false,
        }
    }

    /// Sets the base URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
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

/// Ollama LLM client.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    config: OllamaConfig,
    client: Client,
}

impl OllamaClient {
    /// Creates a new Ollama client with the given configuration.
    pub fn new(config: OllamaConfig) -> Result<Self> {
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

    /// Converts internal messages to Ollama API format.
    fn convert_messages(messages: &[Message]) -> Vec<OllamaMessage> {
        messages
            .iter()
            .map(|m| OllamaMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect()
    }

    /// Returns the chat API endpoint URL.
    fn chat_url(&self) -> String {
        format!("{}/api/chat", self.config.base_url)
    }

    fn build_request(&self, messages: &[Message]) -> OllamaRequest {
        OllamaRequest {
            model: self.config.model.clone(),
            messages: Self::convert_messages(messages),
            stream: false,
            format: self.config.json_output.then(|| "json".to_string()),
            options: OllamaOptions { temperature: 0.0 },
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn complete(&self, messages: &[Message]) -> Result<ModelResponse> {
        let request = self.build_request(messages);
        debug!("Sending {} messages to Ollama model {}", messages.len(), self.config.model);

        let response = self
            .client
            .post(self.chat_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Text2SqlError::llm("Request timed out. Try again.")
                } else if e.is_connect() {
                    Text2SqlError::llm(
                        "Failed to connect to Ollama. Is it running? Try: ollama serve",
                    )
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
            return Err(Text2SqlError::llm(format!(
                "Ollama API error ({}): {}",
                status, body
            )));
        }

        let response: OllamaResponse = serde_json::from_str(&body)
            .map_err(|e| Text2SqlError::llm(format!("Failed to parse response: {}", e)))?;

        Ok(ModelResponse::from_content(
            response.message.content,
            self.config.json_output,
        ))
    }
}

// Ollama API types

#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<String>,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct OllamaResponse {
    message: OllamaMessage,
}
