//! End-to-end pipeline runs with the mock LLM and in-memory database.

use pretty_assertions::assert_eq;
use text2sql::db::{ColumnInfo, MockConnector, QueryResult, SchemaCatalog, Value};
use text2sql::error::Text2SqlError;
use text2sql::export::Exporter;
use text2sql::llm::{LlmCapability, LlmClient, MockLlmClient, Role};
use text2sql::pipeline::{
    BatchOptions, NumberedQuestion, Pipeline, GENERATION_FAILED_ANSWER, LLM_UNAVAILABLE_ANSWER,
};

const TABLE: &str = "global_development_indicators";

fn pipeline(llm: LlmCapability, connector: MockConnector) -> Pipeline {
    Pipeline::new(TABLE, &SchemaCatalog::builtin().unwrap(), llm, Box::new(connector)).unwrap()
}

fn ready(llm: MockLlmClient) -> LlmCapability {
    LlmCapability::Ready(Box::new(llm) as Box<dyn LlmClient>)
}

#[tokio::test]
async fn test_unavailable_llm_still_fills_every_field() {
    let connector = MockConnector::new().with_table(TABLE);
    let pipeline = pipeline(
        LlmCapability::Unavailable("connection refused".to_string()),
        connector.clone(),
    );

    let report = pipeline
        .run_question("What is the inflation rate of Vietnam in 2009?")
        .await;

    let state = &report.state;
    assert_eq!(state.query(), "");
    assert_eq!(state.query_result(), "Error: No query provided");
    assert_eq!(state.final_answer(), LLM_UNAVAILABLE_ANSWER);
    assert_eq!(connector.stats().opened, 0);
}

#[tokio::test]
async fn test_comma_question_is_normalized_before_prompting() {
    let llm = MockLlmClient::new();
    let pipeline = pipeline(ready(llm.clone()), MockConnector::new().with_table(TABLE));

    pipeline.run_question("2020-01-01, inflation rate").await;

    let prompts = llm.prompts();
    let sql_prompt = &prompts[0];
    assert_eq!(sql_prompt[0].role, Role::System);
    assert!(sql_prompt[0].content.contains(TABLE));
    assert_eq!(sql_prompt[1].role, Role::User);
    assert_eq!(sql_prompt[1].content, "inflation rate on 2020-01-01");

    // The answer stage still sees the question as asked
    let answer_prompt = &prompts[1];
    assert!(answer_prompt[1]
        .content
        .starts_with("Question: 2020-01-01, inflation rate\nQuery Results:\n"));
}

#[tokio::test]
async fn test_missing_table_stops_batch_before_any_question() {
    let connector = MockConnector::new();
    let llm = MockLlmClient::new();
    let pipeline = Pipeline::new(
        "country_income",
        &SchemaCatalog::builtin().unwrap(),
        ready(llm.clone()),
        Box::new(connector.clone()),
    )
    .unwrap();

    let err = pipeline.check_preconditions().await.unwrap_err();

    assert!(matches!(err, Text2SqlError::Precondition(_)));
    assert_eq!(
        err.message(),
        "Table 'country_income' does not exist. Please create the table and load the data."
    );
    assert!(llm.prompts().is_empty());
    assert!(connector.stats().executed.is_empty());
    assert_eq!(connector.stats().closed, 1);
}

#[tokio::test]
async fn test_query_error_is_rendered_and_answered() {
    let llm = MockLlmClient::new()
        .with_response("Query Results", "{\"answer\": \"The query failed.\"}")
        .with_response("hdi", "SELECT hdi FROM global_development_indicators LIMIT 50");
    let connector = MockConnector::new()
        .with_table(TABLE)
        .with_query_error("hdi", "column \"hdi\" does not exist");
    let pipeline = pipeline(ready(llm), connector.clone());

    let report = pipeline.run_question("hdi of Vietnam?").await;

    assert_eq!(
        report.state.query_result(),
        "Error: column \"hdi\" does not exist"
    );
    assert_eq!(report.state.final_answer(), "The query failed.");
    let stats = connector.stats();
    assert_eq!(stats.opened, stats.closed);
}

#[tokio::test]
async fn test_empty_answer_becomes_clarification_request() {
    let llm = MockLlmClient::new()
        .with_response("Query Results", "{\"answer\": \"\"}")
        .with_response("population", "SELECT country_name FROM t LIMIT 50");
    let connector = MockConnector::new().with_table(TABLE).with_result(
        "country_name",
        QueryResult::with_data(
            vec![ColumnInfo::new("country_name", "text")],
            vec![vec![Value::from("Vietnam")], vec![Value::from("Laos")]],
        ),
    );
    let pipeline = pipeline(ready(llm), connector);

    let report = pipeline.run_question("Which countries by population?").await;

    assert_eq!(
        report.state.query_result(),
        "| country_name |\n| --- |\n| Vietnam |\n| Laos |"
    );
    assert_eq!(report.state.final_answer(), GENERATION_FAILED_ANSWER);
}

#[tokio::test]
async fn test_batch_keeps_questions_isolated() {
    let dir = tempfile::TempDir::new().unwrap();
    let exporter = Exporter::new(&text2sql::config::ExportConfig {
        dir: dir.path().join("outputs"),
        transcript_dir: dir.path().join("query_exports"),
    });
    let llm = MockLlmClient::new()
        .with_response("Query Results", "{\"answer\": \"ok\"}")
        .with_response("first", "SELECT 1 AS first_value");
    let pipeline = pipeline(ready(llm), MockConnector::new().with_table(TABLE));

    let mut queries = Vec::new();
    pipeline
        .run_batch(
            &NumberedQuestion::enumerate(["first question", "second question"]),
            &exporter,
            BatchOptions::default(),
            |_, report| queries.push(report.state.query().to_string()),
        )
        .await;

    assert_eq!(
        queries,
        vec![
            "SELECT 1 AS first_value".to_string(),
            "SELECT 1 AS mock_value LIMIT 50;".to_string(),
        ]
    );
    assert!(!dir.path().join("outputs").exists());
}
