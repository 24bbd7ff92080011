//! Mock database for testing.
//!
//! Provides an in-memory connector whose clients answer from registered
//! tables and canned results, and count how many connections were opened and
//! closed.

use super::{ColumnInfo, DatabaseClient, DatabaseConnector, QueryResult, Value};
use crate::error::{Result, Text2SqlError};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Connection and execution counters of a mock database.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockDatabaseStats {
    /// Connections handed out.
    pub opened: usize,
    /// Connections closed by their caller.
    pub closed: usize,
    /// Every statement passed to `execute_query`, in order.
    pub executed: Vec<String>,
}

#[derive(Debug, Default)]
struct MockState {
    tables: HashSet<String>,
    responses: Vec<(String, std::result::Result<QueryResult, String>)>,
    connect_error: Option<String>,
    stats: MockDatabaseStats,
}

/// Connector for an in-memory mock database.
///
/// Clones share the same state, so a test can keep a handle to inspect
/// statistics after handing the connector to the pipeline.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    state: Arc<Mutex<MockState>>,
}

impl MockConnector {
    /// Creates a connector for an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a table so existence checks succeed for it.
    pub fn with_table(self, name: impl Into<String>) -> Self {
        self.lock().tables.insert(name.into());
        self
    }

    /// Returns `result` for any statement containing `pattern` (case-insensitive).
    pub fn with_result(self, pattern: impl Into<String>, result: QueryResult) -> Self {
        self.lock().responses.push((pattern.into(), Ok(result)));
        self
    }

    /// Fails any statement containing `pattern` with `message`.
    pub fn with_query_error(self, pattern: impl Into<String>, message: impl Into<String>) -> Self {
        self.lock()
            .responses
            .push((pattern.into(), Err(message.into())));
        self
    }

    /// Makes every connection attempt fail with `message`.
    pub fn failing_connect(self, message: impl Into<String>) -> Self {
        self.lock().connect_error = Some(message.into());
        self
    }

    /// Returns a snapshot of the counters.
    pub fn stats(&self) -> MockDatabaseStats {
        self.lock().stats.clone()
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl DatabaseConnector for MockConnector {
    async fn connect(&self) -> Result<Box<dyn DatabaseClient>> {
        let mut state = self.lock();
        if let Some(message) = &state.connect_error {
            return Err(Text2SqlError::connection(message.clone()));
        }
        state.stats.opened += 1;
        Ok(Box::new(MockDatabaseClient {
            state: Arc::clone(&self.state),
            open: true,
        }))
    }
}

/// A connection to the mock database.
#[derive(Debug)]
pub struct MockDatabaseClient {
    state: Arc<Mutex<MockState>>,
    open: bool,
}

impl MockDatabaseClient {
    fn lock(&self) -> Result<MutexGuard<'_, MockState>> {
        if !self.open {
            return Err(Text2SqlError::connection("Connection already closed"));
        }
        Ok(self.state.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn table_exists(&mut self, table_name: &str) -> Result<bool> {
        Ok(self.lock()?.tables.contains(table_name))
    }

    async fn execute_query(&mut self, sql: &str) -> Result<QueryResult> {
        let mut state = self.lock()?;
        state.stats.executed.push(sql.to_string());

        let sql_lower = sql.to_lowercase();
        let canned = state
            .responses
            .iter()
            .find(|(pattern, _)| sql_lower.contains(&pattern.to_lowercase()))
            .map(|(_, response)| response.clone());

        match canned {
            Some(Ok(result)) => Ok(result.with_execution_time(Duration::from_millis(1))),
            Some(Err(message)) => Err(Text2SqlError::query(message)),
            None if sql_lower.trim_start().starts_with("select") => Ok(QueryResult::with_data(
                vec![ColumnInfo::new("result", "text")],
                vec![vec![Value::String(format!("Mock result for: {sql}"))]],
            )
            .with_execution_time(Duration::from_millis(1))),
            // Statements other than SELECT describe no result set
            None => Ok(QueryResult::new().with_execution_time(Duration::from_millis(1))),
        }
    }

    async fn close(&mut self) -> Result<()> {
        if self.open {
            self.open = false;
            self.state
                .lock()
                .unwrap_or_else(|e| e.into_inner())
                .stats
                .closed += 1;
        }
        Ok(())
    }
}
