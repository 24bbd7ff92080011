//! Per-question pipeline state.

use serde::Serialize;

/// The record threaded through the three stages for one question.
///
/// `question` and `table_name` are fixed at creation. Each later field has a
/// single writer: the query synthesizer sets `query`, the executor sets
/// `query_result`, and the answer synthesizer sets `final_answer`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineState {
    question: String,
    table_name: String,
    query: String,
    query_result: String,
    final_answer: String,
}

impl PipelineState {
    /// Creates a fresh state for `question` against `table_name`.
    pub fn new(question: impl Into<String>, table_name: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            table_name: table_name.into(),
            ..Self::default()
        }
    }

    /// The question as asked.
    pub fn question(&self) -> &str {
        &self.question
    }

    /// The table the question is scoped to.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The generated SQL; empty when generation failed or has not run.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The rendered execution result.
    pub fn query_result(&self) -> &str {
        &self.query_result
    }

    /// The natural-language answer.
    pub fn final_answer(&self) -> &str {
        &self.final_answer
    }

    pub(crate) fn set_query(&mut self, query: String) {
        self.query = query;
    }

    pub(crate) fn set_query_result(&mut self, query_result: String) {
        self.query_result = query_result;
    }

    pub(crate) fn set_final_answer(&mut self, final_answer: String) {
        self.final_answer = final_answer;
    }
}
