//! PostgreSQL database client implementation.
//!
//! Provides `PostgresConnector`, which opens one `PgConnection` per call, and
//! `PostgresClient`, the `DatabaseClient` wrapping that connection. No pool is
//! kept between executions.

use crate::config::ConnectionConfig;
use crate::db::{ColumnInfo, DatabaseClient, DatabaseConnector, QueryResult, Row, Value};
use crate::error::{Result, Text2SqlError};
use async_trait::async_trait;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgRow};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, JsonValue, Uuid};
use sqlx::{
    Column as SqlxColumn, Connection, Executor, Row as SqlxRow, Statement, TypeInfo, ValueRef,
};
use std::time::Instant;
use tracing::debug;

/// Opens PostgreSQL connections from a resolved connection config.
#[derive(Debug, Clone)]
pub struct PostgresConnector {
    config: ConnectionConfig,
}

impl PostgresConnector {
    /// Creates a connector for the given configuration.
    pub fn new(config: ConnectionConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration connections are opened with.
    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }
}

#[async_trait]
impl DatabaseConnector for PostgresConnector {
    async fn connect(&self) -> Result<Box<dyn DatabaseClient>> {
        let client = PostgresClient::connect(&self.config).await?;
        Ok(Box::new(client))
    }
}

/// A single open PostgreSQL connection.
#[derive(Debug)]
pub struct PostgresClient {
    conn: Option<PgConnection>,
}

impl PostgresClient {
    /// Opens a connection. A single attempt is made.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let conn_str = config.to_connection_string()?;
        let options: PgConnectOptions = conn_str
            .parse()
            .map_err(|e| Text2SqlError::config(format!("Invalid connection options: {e}")))?;

        let conn = PgConnection::connect_with(&options)
            .await
            .map_err(|e| map_connection_error(e, config))?;

        debug!("Database connection established: {}", config.display_string());
        Ok(Self { conn: Some(conn) })
    }

    fn connection(&mut self) -> Result<&mut PgConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| Text2SqlError::connection("Connection already closed"))
    }
}

#[async_trait]
impl DatabaseClient for PostgresClient {
    async fn table_exists(&mut self, table_name: &str) -> Result<bool> {
        let conn = self.connection()?;

        sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS (
                SELECT 1
                FROM information_schema.tables
                WHERE table_schema = current_schema() AND table_name = $1
            )
            "#,
        )
        .bind(table_name)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| Text2SqlError::query(format!("Failed to check table existence: {e}")))
    }

    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        let conn = self.connection()?;
        let start = Instant::now();

        let result: Vec<PgRow> = sqlx::query(sql)
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| Text2SqlError::query(format_query_error(e)))?;

        let execution_time = start.elapsed();

        // Without a row to inspect, recover the column list from the prepared
        // statement. Statements that return nothing describe no columns.
        let columns: Vec<ColumnInfo> = match result.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            None => match (&mut *conn).prepare(sql).await {
                Ok(statement) => statement
                    .columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect(),
                Err(e) => {
                    debug!("Could not describe empty result: {e}");
                    Vec::new()
                }
            },
        };

        let rows: Vec<Row> = result.iter().map(convert_row).collect();

        Ok(QueryResult::with_data(columns, rows).with_execution_time(execution_time))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|e| Text2SqlError::connection(format!("Failed to close connection: {e}")))?;
            debug!("Database connection closed");
        }
        Ok(())
    }
}

/// Converts a sqlx PgRow to our Row type.
fn convert_row(row: &PgRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value from a PgRow to our Value type.
///
/// Types without a native variant (numeric, temporal, uuid, json) become their
/// textual form. A value that cannot be decoded renders as a placeholder
/// naming its type; only SQL NULL becomes `Value::Null`.
fn convert_value(row: &PgRow, index: usize, type_name: &str) -> Value {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return Value::Null,
        Ok(_) => {}
        Err(e) => return undecodable(type_name, e),
    }

    let decoded = match type_name.to_uppercase().as_str() {
        "BOOL" | "BOOLEAN" => row.try_get::<bool, _>(index).map(Value::Bool),
        "INT2" | "SMALLINT" => row.try_get::<i16, _>(index).map(|v| Value::Int(v as i64)),
        "INT4" | "INT" | "INTEGER" => row.try_get::<i32, _>(index).map(|v| Value::Int(v as i64)),
        "INT8" | "BIGINT" => row.try_get::<i64, _>(index).map(Value::Int),
        "FLOAT4" | "REAL" => row.try_get::<f32, _>(index).map(|v| Value::Float(v as f64)),
        "FLOAT8" | "DOUBLE PRECISION" => row.try_get::<f64, _>(index).map(Value::Float),
        "NUMERIC" | "DECIMAL" => row
            .try_get::<Decimal, _>(index)
            .map(|v| Value::String(v.to_string())),
        "DATE" => row
            .try_get::<NaiveDate, _>(index)
            .map(|v| Value::String(v.to_string())),
        "TIME" => row
            .try_get::<NaiveTime, _>(index)
            .map(|v| Value::String(v.to_string())),
        "TIMESTAMP" => row
            .try_get::<NaiveDateTime, _>(index)
            .map(|v| Value::String(v.to_string())),
        "TIMESTAMPTZ" => row
            .try_get::<DateTime<Utc>, _>(index)
            .map(|v| Value::String(v.to_rfc3339())),
        "UUID" => row
            .try_get::<Uuid, _>(index)
            .map(|v| Value::String(v.to_string())),
        "JSON" | "JSONB" => row
            .try_get::<JsonValue, _>(index)
            .map(|v| Value::String(v.to_string())),
        "BYTEA" => row.try_get::<Vec<u8>, _>(index).map(Value::Bytes),
        // Text-like types (text, varchar, bpchar, name)
        _ => row.try_get::<String, _>(index).map(Value::String),
    };

    decoded.unwrap_or_else(|e| undecodable(type_name, e))
}

fn undecodable(type_name: &str, error: sqlx::Error) -> Value {
    debug!("Could not decode {type_name} value: {error}");
    Value::String(format!("<unsupported {type_name} value>"))
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, config: &ConnectionConfig) -> Text2SqlError {
    let host = config.host.as_deref().unwrap_or("localhost");
    let port = config.port;
    let user = config.user.as_deref().unwrap_or("unknown");
    let database = config.database.as_deref().unwrap_or("unknown");

    let error_str = error.to_string().to_lowercase();

    if error_str.contains("connection refused") || error_str.contains("could not connect") {
        Text2SqlError::connection(format!(
            "Cannot connect to {host}:{port}. Check that the server is running."
        ))
    } else if error_str.contains("password authentication failed")
        || error_str.contains("authentication failed")
    {
        Text2SqlError::connection(format!(
            "Authentication failed for user '{user}'. Check your credentials."
        ))
    } else if error_str.contains("does not exist") && error_str.contains("database") {
        Text2SqlError::connection(format!("Database '{database}' does not exist."))
    } else if error_str.contains("ssl") || error_str.contains("tls") {
        Text2SqlError::connection(
            "Server requires SSL. Add '?sslmode=require' to connection string.".to_string(),
        )
    } else if error_str.contains("timed out") || error_str.contains("timeout") {
        Text2SqlError::connection(format!(
            "Connection to {host}:{port} timed out. The server may be overloaded or unreachable."
        ))
    } else {
        Text2SqlError::connection(error.to_string())
    }
}

/// Formats a query error, appending Postgres DETAIL and HINT when present.
fn format_query_error(error: sqlx::Error) -> String {
    let Some(db_error) = error.as_database_error() else {
        return error.to_string();
    };

    let mut result = String::from(db_error.message());

    if let Some(pg_error) = db_error.try_downcast_ref::<sqlx::postgres::PgDatabaseError>() {
        if let Some(detail) = pg_error.detail() {
            result.push_str("\n  DETAIL: ");
            result.push_str(detail);
        }

        if let Some(hint) = pg_error.hint() {
            result.push_str("\n  HINT: ");
            result.push_str(hint);
        }
    }

    result
}
