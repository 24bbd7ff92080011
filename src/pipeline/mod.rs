//! The three-stage question pipeline.
//!
//! Each question gets a fresh [`PipelineState`] that flows through SQL
//! generation, execution, and answer generation in order. Stages fail soft;
//! only setup and the table precondition can stop a run.

mod answer;
mod batch;
mod sql_gen;
mod state;

pub use answer::{AnswerSynthesizer, GENERATION_FAILED_ANSWER, LLM_UNAVAILABLE_ANSWER};
pub use batch::{parse_questions, BatchOptions, BatchSummary, NumberedQuestion};
pub use sql_gen::QuerySynthesizer;
pub use state::PipelineState;

use std::time::{Duration, Instant};

use tracing::{debug, error, info};

use crate::db::{DatabaseConnector, SchemaCatalog, TableDescriptor};
use crate::error::{Result, Text2SqlError};
use crate::llm::LlmCapability;
use crate::query::{missing_table_message, render, QueryExecutor};

/// Wall-clock time spent in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StageTimings {
    /// SQL generation.
    pub sql_generation: Duration,
    /// Existence check plus query execution.
    pub sql_execution: Duration,
    /// Answer generation.
    pub answer_generation: Duration,
}

impl StageTimings {
    /// Time spent waiting on the language model.
    pub fn nlp_generation(&self) -> Duration {
        self.sql_generation + self.answer_generation
    }

    /// Time spent in all stages.
    pub fn total(&self) -> Duration {
        self.nlp_generation() + self.sql_execution
    }
}

/// Outcome of one question: the final state and how long each stage took.
#[derive(Debug, Clone)]
pub struct QuestionReport {
    /// State after all three stages.
    pub state: PipelineState,
    /// Per-stage timings.
    pub timings: StageTimings,
}

/// A query generated without executing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedQuery {
    /// The question as asked.
    pub question: String,
    /// The generated SQL (possibly empty).
    pub query: String,
    /// Time spent generating it.
    pub generation_time: Duration,
}

/// Runs questions against one table.
pub struct Pipeline {
    table_name: String,
    descriptor: TableDescriptor,
    llm: LlmCapability,
    connector: Box<dyn DatabaseConnector>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("table_name", &self.table_name)
            .field("llm", &self.llm)
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Creates a pipeline for `table_name`.
    ///
    /// Fails with a configuration error if the table has no descriptor in
    /// `catalog`.
    pub fn new(
        table_name: impl Into<String>,
        catalog: &SchemaCatalog,
        llm: LlmCapability,
        connector: Box<dyn DatabaseConnector>,
    ) -> Result<Self> {
        let table_name = table_name.into();
        let descriptor = catalog.lookup(&table_name)?.clone();
        Ok(Self {
            table_name,
            descriptor,
            llm,
            connector,
        })
    }

    /// The table questions are scoped to.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Confirms the database is reachable and the table exists.
    ///
    /// Opens one connection and closes it before returning.
    pub async fn check_preconditions(&self) -> Result<()> {
        let mut client = self.connector.connect().await?;
        let exists = client.table_exists(&self.table_name).await;
        if let Err(e) = client.close().await {
            error!("Failed to close database connection: {}", e);
        }

        if exists? {
            info!("Table '{}' found", self.table_name);
            Ok(())
        } else {
            Err(Text2SqlError::precondition(missing_table_message(
                &self.table_name,
            )))
        }
    }

    /// Runs all three stages for one question. Never fails.
    pub async fn run_question(&self, question: &str) -> QuestionReport {
        let mut state = PipelineState::new(question, self.table_name.as_str());
        let mut timings = StageTimings::default();

        let start = Instant::now();
        let query = QuerySynthesizer::new(&self.llm, &self.table_name, &self.descriptor)
            .synthesize(state.question())
            .await;
        state.set_query(query);
        timings.sql_generation = start.elapsed();

        info!("Executing query");
        let start = Instant::now();
        let outcome = QueryExecutor::new(self.connector.as_ref())
            .execute(state.query(), state.table_name())
            .await;
        state.set_query_result(render(&outcome));
        timings.sql_execution = start.elapsed();

        let start = Instant::now();
        let answer = AnswerSynthesizer::new(&self.llm)
            .synthesize(state.question(), state.query_result())
            .await;
        state.set_final_answer(answer);
        timings.answer_generation = start.elapsed();

        debug!(
            table = %self.table_name,
            sql_generation_ms = timings.sql_generation.as_millis() as u64,
            sql_execution_ms = timings.sql_execution.as_millis() as u64,
            answer_generation_ms = timings.answer_generation.as_millis() as u64,
            "Question processed"
        );

        QuestionReport { state, timings }
    }

    /// Runs SQL generation only.
    pub async fn generate_query(&self, question: &str) -> GeneratedQuery {
        let start = Instant::now();
        let query = QuerySynthesizer::new(&self.llm, &self.table_name, &self.descriptor)
            .synthesize(question)
            .await;
        GeneratedQuery {
            question: question.to_string(),
            query,
            generation_time: start.elapsed(),
        }
    }
}
