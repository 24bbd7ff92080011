//! Stage 3: rendered results to a natural-language answer.

use tracing::{error, info};

use crate::llm::parser::AnswerExtractor;
use crate::llm::prompt::build_answer_messages;
use crate::llm::{LlmCapability, ModelResponse};

/// Answer used when no language model could be initialized.
pub const LLM_UNAVAILABLE_ANSWER: &str =
    "Failed to generate response due to LLM initialization error";

/// Answer used when the model call fails.
pub const GENERATION_FAILED_ANSWER: &str =
    "Failed to generate response. Please clarify your query.";

/// Turns a question and its rendered results into an answer.
pub struct AnswerSynthesizer<'a> {
    llm: &'a LlmCapability,
    extractor: AnswerExtractor,
}

impl<'a> AnswerSynthesizer<'a> {
    /// Creates a synthesizer with the default extraction strategies.
    pub fn new(llm: &'a LlmCapability) -> Self {
        Self {
            llm,
            extractor: AnswerExtractor::new(),
        }
    }

    /// Returns the answer text. Never empty: a fixed message stands in when
    /// generation is impossible or fails.
    pub async fn synthesize(&self, question: &str, rendered_result: &str) -> String {
        info!("Generating natural language response");

        let client = match self.llm {
            LlmCapability::Ready(client) => client,
            LlmCapability::Unavailable(reason) => {
                error!("No LLM available for response generation: {}", reason);
                return LLM_UNAVAILABLE_ANSWER.to_string();
            }
        };

        let messages = build_answer_messages(question, rendered_result);
        let answer = match client.complete(&messages).await {
            Ok(ModelResponse::Text(text)) => self.extractor.extract(&text),
            Ok(structured) => structured.into_text("answer"),
            Err(e) => {
                error!("Response generation failed: {}", e);
                return GENERATION_FAILED_ANSWER.to_string();
            }
        };

        if answer.trim().is_empty() {
            error!("Model returned an empty answer");
            return GENERATION_FAILED_ANSWER.to_string();
        }
        answer
    }
}
