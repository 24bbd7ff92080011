//! Normalization of model input and output.
//!
//! Rewrites `"<date>, <subject>"` questions, strips code fences from generated
//! SQL, and extracts the answer text from answer-stage output through an
//! ordered list of strategies.

use regex::Regex;
use std::sync::OnceLock;

/// Rewrites `"A, B"` as `"B on A"`, splitting at the first comma.
///
/// Questions without a comma are returned unchanged.
pub fn normalize_question(question: &str) -> String {
    match question.split_once(',') {
        Some((qualifier, subject)) => format!("{} on {}", subject.trim(), qualifier.trim()),
        None => question.to_string(),
    }
}

/// Removes surrounding whitespace and markdown fence markers from generated SQL.
///
/// Fences are only stripped when the trimmed text opens with one; the result
/// then contains no ``` markers and no `sql` language tag, in any case.
pub fn clean_sql(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("```") {
        sql_fence_regex()
            .replace_all(trimmed, "")
            .replace("```", "")
            .trim()
            .to_string()
    } else {
        trimmed.to_string()
    }
}

/// Cleans answer-stage output before extraction: trims whitespace, strips
/// backtick fences at both ends, and drops a leading `json` tag.
pub fn clean_answer_text(raw: &str) -> String {
    let stripped = raw.trim().trim_matches('`');
    json_tag_regex().replace(stripped, "").trim().to_string()
}

/// A way of pulling the answer out of cleaned model output.
pub trait AnswerStrategy: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Returns the answer, or `None` if this strategy does not apply.
    fn extract(&self, cleaned: &str) -> Option<String>;
}

/// Parses the text as a JSON object and reads its `answer` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonObjectStrategy;

impl AnswerStrategy for JsonObjectStrategy {
    fn name(&self) -> &'static str {
        "json"
    }

    fn extract(&self, cleaned: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(cleaned).ok()?;
        answer_field(&value)
    }
}

/// Searches for an embedded `"answer": "<text>"` pair.
#[derive(Debug, Clone, Copy, Default)]
pub struct AnswerPatternStrategy;

impl AnswerStrategy for AnswerPatternStrategy {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn extract(&self, cleaned: &str) -> Option<String> {
        answer_pattern_regex()
            .captures(cleaned)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

/// Ordered answer-extraction strategies with a plain-text fallback.
pub struct AnswerExtractor {
    strategies: Vec<Box<dyn AnswerStrategy>>,
}

impl Default for AnswerExtractor {
    fn default() -> Self {
        Self {
            strategies: vec![Box::new(JsonObjectStrategy), Box::new(AnswerPatternStrategy)],
        }
    }
}

impl AnswerExtractor {
    /// Creates an extractor with the JSON and pattern strategies.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extracts the answer from raw model text.
    ///
    /// Strategies are tried in order; the cleaned text itself is the result
    /// when none applies. Never fails.
    pub fn extract(&self, raw: &str) -> String {
        let cleaned = clean_answer_text(raw);
        for strategy in &self.strategies {
            if let Some(answer) = strategy.extract(&cleaned) {
                tracing::debug!("Answer extracted with the {} strategy", strategy.name());
                return answer;
            }
        }
        cleaned
    }
}

/// Reads the `answer` member of a JSON object, stringifying non-string values.
pub fn answer_field(value: &serde_json::Value) -> Option<String> {
    match value.as_object()?.get("answer")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn sql_fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)```sql").expect("sql fence pattern is valid"))
}

fn json_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^json\s*").expect("json tag pattern is valid"))
}

fn answer_pattern_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#""answer"\s*:\s*"([^"]+)""#).expect("answer pattern is valid")
    })
}
