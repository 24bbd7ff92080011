//! Sequential batch runs and question-file parsing.

use tracing::{error, info};

use crate::export::{ExportMode, Exporter};
use crate::pipeline::{GeneratedQuery, Pipeline, QuestionReport};

/// A question with the ordinal used for its export file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberedQuestion {
    /// Ordinal, starting at 1.
    pub ordinal: usize,
    /// The question text sent to the pipeline.
    pub text: String,
}

impl NumberedQuestion {
    /// Creates a numbered question.
    pub fn new(ordinal: usize, text: impl Into<String>) -> Self {
        Self {
            ordinal,
            text: text.into(),
        }
    }

    /// Numbers questions 1, 2, 3, ... in order.
    pub fn enumerate<I, S>(texts: I) -> Vec<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Self::new(i + 1, text))
            .collect()
    }
}

/// Parses a questions file.
///
/// One question per non-empty line; lines starting with `#` are skipped. A
/// leading `<n>|` sets the ordinal, otherwise the position among the parsed
/// questions is used.
pub fn parse_questions(content: &str) -> Vec<NumberedQuestion> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .enumerate()
        .map(|(i, line)| match line.split_once('|') {
            Some((prefix, rest)) => match prefix.trim().parse::<usize>() {
                Ok(n) => NumberedQuestion::new(n, rest.trim()),
                Err(_) => NumberedQuestion::new(i + 1, line),
            },
            None => NumberedQuestion::new(i + 1, line),
        })
        .collect()
}

/// What to persist during a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchOptions {
    /// Write `question_<n>.json` in this mode.
    pub export: Option<ExportMode>,
    /// Write a timestamped transcript per question.
    pub transcript: bool,
}

/// Counts from a finished batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Questions processed.
    pub processed: usize,
    /// Exports that could not be written.
    pub export_failures: usize,
}

impl Pipeline {
    /// Runs every question in order, each with a fresh state.
    ///
    /// `on_report` is called after each question. Export failures are logged
    /// and counted; they never stop the loop.
    pub async fn run_batch<F>(
        &self,
        questions: &[NumberedQuestion],
        exporter: &Exporter,
        options: BatchOptions,
        mut on_report: F,
    ) -> BatchSummary
    where
        F: FnMut(&NumberedQuestion, &QuestionReport),
    {
        let mut summary = BatchSummary::default();

        for question in questions {
            info!(ordinal = question.ordinal, question = %question.text, "Processing question");
            let report = self.run_question(&question.text).await;

            if let Some(mode) = options.export {
                if let Err(e) = exporter.write_ordinal(question.ordinal, &report, mode) {
                    error!("Failed to export question {}: {}", question.ordinal, e);
                    summary.export_failures += 1;
                }
            }
            if options.transcript {
                if let Err(e) = exporter.write_transcript(&report.state) {
                    error!("Failed to export JSON: {}", e);
                    summary.export_failures += 1;
                }
            }

            on_report(question, &report);
            summary.processed += 1;
        }

        summary
    }

    /// Generates SQL for every question without executing it, exporting each
    /// result when `export` is set.
    pub async fn run_sql_only_batch<F>(
        &self,
        questions: &[NumberedQuestion],
        exporter: &Exporter,
        export: bool,
        mut on_generated: F,
    ) -> BatchSummary
    where
        F: FnMut(&NumberedQuestion, &GeneratedQuery),
    {
        let mut summary = BatchSummary::default();

        for question in questions {
            info!("Processing question {}: {}", question.ordinal, question.text);
            let generated = self.generate_query(&question.text).await;
            info!(
                "Generation time for question {}: {:.2} seconds",
                question.ordinal,
                generated.generation_time.as_secs_f64()
            );

            if export {
                if let Err(e) = exporter.write_generated_query(question.ordinal, &generated) {
                    error!("Failed to export question {}: {}", question.ordinal, e);
                    summary.export_failures += 1;
                }
            }

            on_generated(question, &generated);
            summary.processed += 1;
        }

        summary
    }
}
