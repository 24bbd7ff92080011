//! LLM integration for text2sql.
//!
//! Provides the client trait, provider implementations, and the helpers the
//! pipeline stages use to build prompts and clean up model output.

pub mod factory;
pub mod mock;
pub mod ollama;
pub mod openai;
pub mod parser;
pub mod prompt;
pub mod types;

pub use factory::{create_capability, create_client, LlmCapability};
pub use mock::MockLlmClient;
pub use ollama::{OllamaClient, OllamaConfig};
pub use openai::{OpenAiClient, OpenAiConfig};
pub use types::{Message, ModelResponse, Role};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::Result;

/// Trait for LLM clients that can generate completions.
///
/// Implementations must be thread-safe (Send + Sync) to support async operations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generates a completion for the given messages.
    ///
    /// Makes exactly one request; retries are left to the caller.
    async fn complete(&self, messages: &[Message]) -> Result<ModelResponse>;
}

/// LLM provider type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Local Ollama instance
    #[default]
    Ollama,
    /// OpenAI or any OpenAI-compatible endpoint (Groq, vLLM, ...)
    OpenAi,
    /// Mock client for testing (no model required)
    Mock,
}

impl LlmProvider {
    /// Returns the provider as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::OpenAi => "openai",
            Self::Mock => "mock",
        }
    }
}

impl FromStr for LlmProvider {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ollama" => Ok(Self::Ollama),
            "openai" | "groq" => Ok(Self::OpenAi),
            "mock" => Ok(Self::Mock),
            _ => Err(format!("Unknown LLM provider: {}", s)),
        }
    }
}

impl std::fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
