//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients. The pipeline
//! asks for an [`LlmCapability`], which is either a ready client or the reason
//! one could not be built.

use tracing::warn;

use crate::config::LlmConfig;
use crate::error::{Result, Text2SqlError};
use crate::llm::{
    LlmClient, LlmProvider, MockLlmClient, OllamaClient, OllamaConfig, OpenAiClient, OpenAiConfig,
};

/// Groq's OpenAI-compatible endpoint, used when only `GROQ_API_KEY` is set.
pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";

/// A language-model client, or the reason it is unavailable.
pub enum LlmCapability {
    /// A usable client.
    Ready(Box<dyn LlmClient>),
    /// The client could not be initialized.
    Unavailable(String),
}

impl LlmCapability {
    /// Returns true if a client is available.
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl std::fmt::Debug for LlmCapability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Ready"),
            Self::Unavailable(reason) => f.debug_tuple("Unavailable").field(reason).finish(),
        }
    }
}

impl From<Box<dyn LlmClient>> for LlmCapability {
    fn from(client: Box<dyn LlmClient>) -> Self {
        Self::Ready(client)
    }
}

/// Builds the capability for `config`, logging the reason once if the client
/// cannot be created.
pub fn create_capability(config: &LlmConfig) -> LlmCapability {
    match create_client(config) {
        Ok(client) => LlmCapability::Ready(client),
        Err(e) => {
            let reason = e.message().to_string();
            warn!("LLM unavailable ({}): {}", config.provider, reason);
            LlmCapability::Unavailable(reason)
        }
    }
}

/// Creates an LLM client for the configured provider.
///
/// For the OpenAI-compatible provider the API key is resolved in order:
/// 1. `api_key` from the configuration
/// 2. `OPENAI_API_KEY`
/// 3. `GROQ_API_KEY` (which also selects the Groq endpoint when no
///    `base_url` is configured)
pub fn create_client(config: &LlmConfig) -> Result<Box<dyn LlmClient>> {
    match config.provider {
        LlmProvider::OpenAi => {
            let (key, default_url) = resolve_api_key(config.api_key.clone())?;
            let mut openai = OpenAiConfig::new(key, config.model.clone())
                .with_json_output(config.json_output);
            if let Some(url) = config.base_url.as_deref().or(default_url) {
                openai = openai.with_base_url(url);
            }
            if let Some(secs) = config.timeout_secs {
                openai = openai.with_timeout(secs);
            }
            Ok(Box::new(OpenAiClient::new(openai)?))
        }
        LlmProvider::Ollama => {
            let mut ollama =
                OllamaConfig::new(config.model.clone()).with_json_output(config.json_output);
            if let Some(url) = config
                .base_url
                .clone()
                .or_else(|| std::env::var("OLLAMA_URL").ok())
            {
                ollama = ollama.with_url(url);
            }
            if let Some(secs) = config.timeout_secs {
                ollama = ollama.with_timeout(secs);
            }
            Ok(Box::new(OllamaClient::new(ollama)?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

fn resolve_api_key(configured: Option<String>) -> Result<(String, Option<&'static str>)> {
    if let Some(key) = configured.filter(|k| !k.is_empty()) {
        return Ok((key, None));
    }
    if let Ok(key) = std::env::var("OPENAI_API_KEY") {
        return Ok((key, None));
    }
    if let Ok(key) = std::env::var("GROQ_API_KEY") {
        return Ok((key, Some(GROQ_API_URL)));
    }
    Err(Text2SqlError::llm(
        "No API key configured. Set llm.api_key, OPENAI_API_KEY, or GROQ_API_KEY.",
    ))
}
