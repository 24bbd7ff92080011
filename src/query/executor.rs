//! Query execution against the target table.
//!
//! Each call opens its own connection, checks that the table exists, runs the
//! statement, and closes the connection on every path. Failures never escape;
//! they become [`ExecutionOutcome::Failed`].

use tracing::{debug, error, info, warn};

use crate::db::{DatabaseClient, DatabaseConnector, QueryResult};

/// Message used when there is no generated query to run.
pub const NO_QUERY_MESSAGE: &str = "No query provided";

/// Result of executing one generated query.
#[derive(Debug, Clone)]
pub enum ExecutionOutcome {
    /// The statement described a result set (possibly with zero rows).
    Rows(QueryResult),
    /// The statement ran but described no result set.
    NoRecords,
    /// Execution did not happen or failed; the message says why.
    Failed(String),
}

/// Runs generated SQL through a database connector.
pub struct QueryExecutor<'a> {
    connector: &'a dyn DatabaseConnector,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(connector: &'a dyn DatabaseConnector) -> Self {
        Self { connector }
    }

    /// Executes `query` after confirming `table_name` exists.
    ///
    /// An empty query short-circuits without touching the database.
    pub async fn execute(&self, query: &str, table_name: &str) -> ExecutionOutcome {
        if query.is_empty() {
            return ExecutionOutcome::Failed(NO_QUERY_MESSAGE.to_string());
        }

        let mut client = match self.connector.connect().await {
            Ok(client) => client,
            Err(e) => {
                error!("Failed to connect to the database: {}", e);
                return ExecutionOutcome::Failed(format!(
                    "Database connection failed: {}",
                    e.message()
                ));
            }
        };

        let outcome = Self::run(client.as_mut(), query, table_name).await;

        if let Err(e) = client.close().await {
            warn!("Failed to close database connection: {}", e);
        } else {
            debug!("Database connection closed");
        }

        outcome
    }

    async fn run(client: &mut dyn DatabaseClient, query: &str, table_name: &str) -> ExecutionOutcome {
        match client.table_exists(table_name).await {
            Ok(true) => {}
            Ok(false) => {
                return ExecutionOutcome::Failed(missing_table_message(table_name));
            }
            Err(e) => {
                error!("Failed to check table existence: {}", e);
                return ExecutionOutcome::Failed(e.message().to_string());
            }
        }

        match client.execute_query(query).await {
            Ok(result) if result.has_columns() => {
                info!(
                    "Query returned {} rows in {:?}",
                    result.row_count(),
                    result.execution_time
                );
                ExecutionOutcome::Rows(result)
            }
            Ok(_) => ExecutionOutcome::NoRecords,
            Err(e) => {
                error!("Query execution failed: {}", e);
                ExecutionOutcome::Failed(e.message().to_string())
            }
        }
    }
}

/// Message for a target table that is absent from the database.
pub fn missing_table_message(table_name: &str) -> String {
    format!(
        "Table '{}' does not exist. Please create the table and load the data.",
        table_name
    )
}
