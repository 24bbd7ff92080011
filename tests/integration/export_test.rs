//! Export files written during batch runs.

use pretty_assertions::assert_eq;
use std::path::Path;
use tempfile::TempDir;
use text2sql::config::ExportConfig;
use text2sql::db::{MockConnector, SchemaCatalog};
use text2sql::export::{ExportMode, Exporter};
use text2sql::llm::{LlmCapability, LlmClient, MockLlmClient};
use text2sql::pipeline::{parse_questions, BatchOptions, Pipeline};

const TABLE: &str = "world_happiness_report";

fn exporter(dir: &TempDir) -> Exporter {
    Exporter::new(&ExportConfig {
        dir: dir.path().join("outputs"),
        transcript_dir: dir.path().join("query_exports"),
    })
}

fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

fn mock_pipeline() -> Pipeline {
    let llm = MockLlmClient::new()
        .with_response("Query Results", "{\"answer\": \"The life ladder was 6.27.\"}")
        .with_response(
            "ladder",
            "```sql\nSELECT life_ladder\nFROM world_happiness_report\nLIMIT 50;\n```",
        );
    Pipeline::new(
        TABLE,
        &SchemaCatalog::builtin().unwrap(),
        LlmCapability::Ready(Box::new(llm) as Box<dyn LlmClient>),
        Box::new(MockConnector::new().with_table(TABLE)),
    )
    .unwrap()
}

#[tokio::test]
async fn test_timed_export_uses_question_ordinals() {
    let dir = TempDir::new().unwrap();
    let questions = parse_questions("12|What was the life ladder in 2021?");

    let summary = mock_pipeline()
        .run_batch(
            &questions,
            &exporter(&dir),
            BatchOptions {
                export: Some(ExportMode::Timed),
                transcript: false,
            },
            |_, _| {},
        )
        .await;

    assert_eq!(summary.export_failures, 0);
    let value = read_json(&dir.path().join("outputs/question_12.json"));
    assert_eq!(value["question"], "What was the life ladder in 2021?");
    assert_eq!(
        value["query"],
        "SELECT life_ladder FROM world_happiness_report LIMIT 50;"
    );
    assert_eq!(value["answer"], "The life ladder was 6.27.");

    let sql = value["sql_execution_time"].as_f64().unwrap();
    let nlp = value["nlp_generation_time"].as_f64().unwrap();
    let total = value["total_time"].as_f64().unwrap();
    assert!(sql >= 0.0 && nlp >= 0.0);
    assert!((total - (sql + nlp)).abs() <= 0.011);
}

#[tokio::test]
async fn test_transcript_contains_whole_state() {
    let dir = TempDir::new().unwrap();

    mock_pipeline()
        .run_batch(
            &parse_questions("Life ladder of Finland?"),
            &exporter(&dir),
            BatchOptions {
                export: None,
                transcript: true,
            },
            |_, _| {},
        )
        .await;

    let entries: Vec<_> = std::fs::read_dir(dir.path().join("query_exports"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    assert_eq!(entries.len(), 1);

    let value = read_json(&entries[0]);
    assert_eq!(value["question"], "Life ladder of Finland?");
    assert_eq!(
        value["sql_query"],
        "SELECT life_ladder\nFROM world_happiness_report\nLIMIT 50;"
    );
    assert!(value["query_results"]
        .as_str()
        .unwrap()
        .starts_with("| result |\n| --- |\n"));
    assert_eq!(value["natural_language_response"], "The life ladder was 6.27.");
    assert!(!dir.path().join("outputs").exists());
}
