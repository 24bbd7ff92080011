//! JSON export of pipeline results.
//!
//! Writes one file per question (`question_<n>.json`), timestamped transcripts
//! (`query_results_<YYYYmmdd_HHMMSS>.json`), and SQL-only records. Every
//! failure is returned to the caller, which logs it and moves on.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::Local;
use serde::Serialize;
use tracing::info;

use crate::config::ExportConfig;
use crate::error::{Result, Text2SqlError};
use crate::pipeline::{GeneratedQuery, PipelineState, QuestionReport};

/// Shape of the per-question export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportMode {
    /// Question, query, and answer.
    #[default]
    Basic,
    /// Adds stage timings in seconds.
    Timed,
}

#[derive(Serialize)]
struct OrdinalRecord<'a> {
    question: &'a str,
    query: String,
    answer: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    sql_execution_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nlp_generation_time: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_time: Option<f64>,
}

#[derive(Serialize)]
struct TranscriptRecord<'a> {
    timestamp: String,
    question: &'a str,
    sql_query: &'a str,
    query_results: &'a str,
    natural_language_response: &'a str,
}

#[derive(Serialize)]
struct GeneratedQueryRecord<'a> {
    question: &'a str,
    query: String,
    generation_time: f64,
}

/// Writes export files under the configured directories.
#[derive(Debug, Clone)]
pub struct Exporter {
    dir: PathBuf,
    transcript_dir: PathBuf,
}

impl Exporter {
    /// Creates an exporter for the configured directories.
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            dir: config.dir.clone(),
            transcript_dir: config.transcript_dir.clone(),
        }
    }

    /// Writes `<dir>/question_<n>.json`.
    pub fn write_ordinal(&self, n: usize, report: &QuestionReport, mode: ExportMode) -> Result<PathBuf> {
        let state = &report.state;
        let timings = &report.timings;
        let timed = mode == ExportMode::Timed;

        let record = OrdinalRecord {
            question: state.question(),
            query: flatten_query(state.query()),
            answer: state.final_answer(),
            sql_execution_time: timed.then(|| round_secs(timings.sql_execution, 2)),
            nlp_generation_time: timed.then(|| round_secs(timings.nlp_generation(), 2)),
            total_time: timed.then(|| round_secs(timings.total(), 2)),
        };

        let path = self.dir.join(format!("question_{}.json", n));
        write_json(&path, &record, b"    ")?;
        info!("Saved: {}", path.display());
        Ok(path)
    }

    /// Writes `<dir>/question_<n>.json` for a SQL-only run.
    pub fn write_generated_query(&self, n: usize, generated: &GeneratedQuery) -> Result<PathBuf> {
        let record = GeneratedQueryRecord {
            question: &generated.question,
            query: flatten_query(&generated.query),
            generation_time: round_secs(generated.generation_time, 4),
        };

        let path = self.dir.join(format!("question_{}.json", n));
        write_json(&path, &record, b"    ")?;
        info!("Saved: {}", path.display());
        Ok(path)
    }

    /// Writes a timestamped transcript of the whole state.
    ///
    /// A numeric suffix is added when a transcript with the same timestamp
    /// already exists.
    pub fn write_transcript(&self, state: &PipelineState) -> Result<PathBuf> {
        let now = Local::now();
        let record = TranscriptRecord {
            timestamp: now.to_rfc3339(),
            question: state.question(),
            sql_query: state.query(),
            query_results: state.query_result(),
            natural_language_response: state.final_answer(),
        };

        let stem = format!("query_results_{}", now.format("%Y%m%d_%H%M%S"));
        let mut path = self.transcript_dir.join(format!("{}.json", stem));
        let mut suffix = 2;
        while path.exists() {
            path = self.transcript_dir.join(format!("{}_{}.json", stem, suffix));
            suffix += 1;
        }

        write_json(&path, &record, b"  ")?;
        info!("Query results exported to: {}", path.display());
        Ok(path)
    }
}

/// Replaces CR and LF with spaces and trims the result.
pub fn flatten_query(query: &str) -> String {
    query.replace(['\r', '\n'], " ").trim().to_string()
}

fn round_secs(duration: Duration, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (duration.as_secs_f64() * factor).round() / factor
}

fn write_json<T: Serialize>(path: &Path, value: &T, indent: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            Text2SqlError::export(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(indent);
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut serializer)
        .map_err(|e| Text2SqlError::export(format!("Failed to serialize export: {}", e)))?;

    fs::write(path, buf)
        .map_err(|e| Text2SqlError::export(format!("Failed to write {}: {}", path.display(), e)))
}
