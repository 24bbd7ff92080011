//! Prompt construction for LLM requests.
//!
//! Builds the message lists for SQL generation (scoped to one table's
//! descriptor) and for answer generation.

use crate::db::TableDescriptor;
use crate::llm::types::Message;

/// System prompt template for SQL generation.
const SQL_SYSTEM_PROMPT_TEMPLATE: &str = r#"You are a SQL expert for PostgreSQL.
Only generate a valid SQL query for a table named {table}.
Write exactly one SQL statement using standard syntax (SELECT, FROM, WHERE, ...).
NEVER select all columns (*); only select the columns relevant to the question.
NEVER answer in natural language. ONLY write SQL for query purposes.
Limit query results to 50 rows only.
The table ({data_type}) has the following fields:
{fields}"#;

/// System prompt for answer generation.
const ANSWER_SYSTEM_PROMPT: &str = r#"You are an expert data analyst.
Given the query results, provide a clear, concise, and natural language response that answers the question using the queried results.
Use the query results to inform your answer and present the information in a user-friendly way.
If the results contain an error, explain it briefly instead of inventing data."#;

/// Builds the system prompt for SQL generation against `table`.
pub fn build_sql_system_prompt(table: &str, descriptor: &TableDescriptor) -> String {
    SQL_SYSTEM_PROMPT_TEMPLATE
        .replace("{table}", table)
        .replace("{data_type}", &descriptor.data_type)
        .replace("{fields}", &descriptor.format_for_llm())
}

/// Builds the SQL-generation messages: system instruction, then the question.
pub fn build_sql_messages(table: &str, descriptor: &TableDescriptor, question: &str) -> Vec<Message> {
    vec![
        Message::system(build_sql_system_prompt(table, descriptor)),
        Message::user(question),
    ]
}

/// Builds the answer-generation messages from the question and rendered results.
pub fn build_answer_messages(question: &str, rendered_result: &str) -> Vec<Message> {
    vec![
        Message::system(ANSWER_SYSTEM_PROMPT),
        Message::user(format!(
            "Question: {}\nQuery Results:\n{}",
            question, rendered_result
        )),
    ]
}
