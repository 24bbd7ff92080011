//! Stage 1: natural language to SQL.

use tracing::{error, info};

use crate::db::TableDescriptor;
use crate::llm::parser::{clean_sql, normalize_question};
use crate::llm::prompt::build_sql_messages;
use crate::llm::{LlmCapability, ModelResponse};

/// Generates SQL for a question, scoped to one table.
pub struct QuerySynthesizer<'a> {
    llm: &'a LlmCapability,
    table_name: &'a str,
    descriptor: &'a TableDescriptor,
}

impl<'a> QuerySynthesizer<'a> {
    /// Creates a synthesizer for `table_name` described by `descriptor`.
    pub fn new(llm: &'a LlmCapability, table_name: &'a str, descriptor: &'a TableDescriptor) -> Self {
        Self {
            llm,
            table_name,
            descriptor,
        }
    }

    /// Returns cleaned SQL, or an empty string when generation fails.
    pub async fn synthesize(&self, question: &str) -> String {
        info!("Generating SQL query");

        let client = match self.llm {
            LlmCapability::Ready(client) => client,
            LlmCapability::Unavailable(reason) => {
                error!("No LLM available for query generation: {}", reason);
                return String::new();
            }
        };

        let question = normalize_question(question);
        let messages = build_sql_messages(self.table_name, self.descriptor, &question);

        let query = match client.complete(&messages).await {
            Ok(response) => clean_sql(&response_text(response)),
            Err(e) => {
                error!("SQL generation failed: {}", e);
                String::new()
            }
        };

        info!("Generated SQL query: {}", query);
        query
    }
}

fn response_text(response: ModelResponse) -> String {
    match response {
        ModelResponse::Text(text) => text,
        json @ ModelResponse::Json(_) => json.into_text("query"),
    }
}
