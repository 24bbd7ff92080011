//! Database abstraction layer for text2sql.
//!
//! Provides a trait-based interface for database operations, allowing the
//! pipeline to run against PostgreSQL or an in-memory mock interchangeably.
//! Connections are short-lived: one is opened per execution and closed before
//! the call returns.

mod mock;
mod postgres;
pub mod schema;
mod types;

pub use mock::{MockConnector, MockDatabaseClient, MockDatabaseStats};
pub use postgres::{PostgresClient, PostgresConnector};
pub use schema::{FieldDescription, SchemaCatalog, TableDescriptor};
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::error::Result;
use async_trait::async_trait;

/// Opens database connections.
///
/// Each call yields a fresh connection owned by the caller, who must close it.
#[async_trait]
pub trait DatabaseConnector: Send + Sync {
    /// Opens a new connection.
    async fn connect(&self) -> Result<Box<dyn DatabaseClient>>;
}

/// A single open database connection.
#[async_trait]
pub trait DatabaseClient: Send {
    /// Returns true if `table_name` exists in the active schema.
    ///
    /// This is a metadata lookup; the table itself is not read.
    async fn table_exists(&mut self, table_name: &str) -> Result<bool>;

    /// Executes a SQL statement and returns its results.
    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult>;

    /// Closes the connection. Further calls fail with a connection error.
    async fn close(&mut self) -> Result<()>;
}
