//! text2sql - answer natural-language questions about a PostgreSQL table.

use text2sql::cli::Cli;
use text2sql::config::{Config, ConnectionConfig, LlmConfig};
use text2sql::db::{DatabaseConnector, MockConnector, PostgresConnector, SchemaCatalog};
use text2sql::error::{Result, Text2SqlError};
use text2sql::export::Exporter;
use text2sql::llm::factory::GROQ_API_URL;
use text2sql::llm::{create_capability, LlmProvider};
use text2sql::logging::{init_file_logging, init_stderr_logging};
use text2sql::pipeline::Pipeline;
use tracing::{error, info, warn};

#[tokio::main(flavor = "current_thread")]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse_args();

    match &cli.log_file {
        Some(path) => init_file_logging(path),
        None => init_stderr_logging(),
    }

    if let Err(e) = run(cli).await {
        error!("{}: {} Exiting...", e.category(), e.message());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());
    let config = Config::load_from_file(&config_path)?;

    let table = cli
        .table
        .clone()
        .or_else(|| config.default_table.clone())
        .ok_or_else(|| {
            Text2SqlError::config("No table specified. Use --table or set default_table in config.")
        })?;

    let questions = cli.load_questions()?;
    if questions.is_empty() {
        return Err(Text2SqlError::config(
            "No question provided. Pass questions as arguments or use --questions-file.",
        ));
    }

    let mut catalog = SchemaCatalog::builtin()?;
    catalog.extend(config.tables.clone());

    let mut llm_config = config.llm.clone();
    apply_llm_overrides(&cli, &mut llm_config)?;
    let llm = create_capability(&llm_config);
    info!(
        provider = %llm_config.provider,
        model = %llm_config.model,
        ready = llm.is_ready(),
        "LLM configured"
    );

    let connector = build_connector(&cli, &config, &table)?;
    let pipeline = Pipeline::new(table, &catalog, llm, connector)?;

    let mut export_config = config.export.clone();
    if let Some(dir) = &cli.export_dir {
        export_config.dir = dir.clone();
    }
    let exporter = Exporter::new(&export_config);

    if cli.sql_only {
        let summary = pipeline
            .run_sql_only_batch(
                &questions,
                &exporter,
                cli.export || cli.timing,
                |question, generated| {
                    println!("{}|{}", question.ordinal, generated.query);
                },
            )
            .await;
        info!("Generated SQL for {} questions", summary.processed);
        return Ok(());
    }

    pipeline.check_preconditions().await?;

    let summary = pipeline
        .run_batch(&questions, &exporter, cli.batch_options(), |_, report| {
            let state = &report.state;
            println!("\n=== Results ===");
            println!("Query: {}", state.query());
            println!("Raw Results:");
            println!("{}", state.query_result());
            println!("\nFinal Answer:");
            println!("{}", state.final_answer());
        })
        .await;

    if summary.export_failures > 0 {
        warn!("{} exports could not be written", summary.export_failures);
    }
    info!("Processed {} questions", summary.processed);
    Ok(())
}

/// Applies `--llm` and `--model` on top of the configured LLM settings.
fn apply_llm_overrides(cli: &Cli, llm: &mut LlmConfig) -> Result<()> {
    if let Some(name) = &cli.llm {
        llm.provider = name.parse::<LlmProvider>().map_err(Text2SqlError::config)?;
        if name.eq_ignore_ascii_case("groq") && llm.base_url.is_none() {
            llm.base_url = Some(GROQ_API_URL.to_string());
        }
    }
    if let Some(model) = &cli.model {
        llm.model = model.clone();
    }
    Ok(())
}

/// Builds the database connector for this run.
fn build_connector(cli: &Cli, config: &Config, table: &str) -> Result<Box<dyn DatabaseConnector>> {
    if cli.mock_db {
        info!("Using in-memory database");
        return Ok(Box::new(MockConnector::new().with_table(table)));
    }

    match resolve_connection(cli, config)? {
        Some(connection) => {
            info!("Connection: {}", connection.display_string());
            Ok(Box::new(PostgresConnector::new(connection)))
        }
        // SQL-only runs never connect
        None if cli.sql_only => Ok(Box::new(MockConnector::new())),
        None => Err(Text2SqlError::config(
            "No database connection configured. Use --url, -H/-d/-U, or a [connections.default] entry.",
        )),
    }
}

/// Resolves the final connection configuration from CLI args, config file, and environment.
fn resolve_connection(cli: &Cli, config: &Config) -> Result<Option<ConnectionConfig>> {
    // Start with CLI connection config if provided
    let mut connection = cli.to_connection_config()?;

    // If no CLI connection, try named connection from config
    if connection.is_none() {
        if let Some(name) = cli.connection_name() {
            connection = config.get_connection(Some(name)).cloned();
            if connection.is_none() {
                return Err(Text2SqlError::config(format!(
                    "Connection '{}' not found in config file",
                    name
                )));
            }
        }
    }

    // If still no connection, try default from config
    if connection.is_none() {
        connection = config.get_connection(None).cloned();
    }

    // Fall back to PG* environment variables alone
    if connection.is_none() && std::env::var("PGDATABASE").is_ok() {
        connection = Some(ConnectionConfig::default());
    }

    if let Some(ref mut conn) = connection {
        conn.apply_env_defaults();
    }

    Ok(connection)
}
