//! Mock store clients for testing.
//!
//! `MockDatabaseClient` returns a canned result for every statement and ignores
//! any LIMIT clause, which makes it a stand-in for an engine that does not
//! honour the rewritten row cap.

use super::{ColumnInfo, DatabaseClient, QueryResult, Value};
use crate::error::{GuardError, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;

/// A mock store that returns a predefined result and records executed SQL.
#[derive(Debug, Default)]
pub struct MockDatabaseClient {
    result: QueryResult,
    executed: Mutex<Vec<String>>,
}

impl MockDatabaseClient {
    /// Creates a mock that returns an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that returns `result` for every statement.
    pub fn with_result(result: QueryResult) -> Self {
        Self {
            result,
            executed: Mutex::new(Vec::new()),
        }
    }

    /// Creates a mock returning `count` transaction rows of `(id, ccy)`.
    pub fn with_transaction_rows(count: usize) -> Self {
        let columns = vec![
            ColumnInfo::new("id", "INTEGER"),
            ColumnInfo::new("ccy", "TEXT"),
        ];
        let rows = (1..=count as i64)
            .map(|id| vec![Value::Int(id), Value::from("USD")])
            .collect();
        Self::with_result(QueryResult::with_data(columns, rows))
    }

    /// Returns every statement passed to `execute_query`, in order.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        self.executed
            .lock()
            .map_err(|_| GuardError::internal("mock execution log poisoned"))?
            .push(sql.to_string());

        Ok(self
            .result
            .clone()
            .with_execution_time(Duration::from_millis(1)))
    }

    fn describe(&self) -> String {
        "mock store".to_string()
    }
}

/// A mock store whose every statement fails with the given message.
#[derive(Debug, Clone)]
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a failing client.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(GuardError::query(self.message.clone()))
    }

    fn describe(&self) -> String {
        "failing mock store".to_string()
    }
}
