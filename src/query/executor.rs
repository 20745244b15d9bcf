//! Sandboxed statement execution.
//!
//! Runs a rewritten statement through a store client and enforces the row
//! ceiling on whatever comes back, independent of any LIMIT in the text.

use std::time::Instant;

use tracing::{debug, warn};

use crate::db::{DatabaseClient, QueryResult};

/// Executes accepted statements against a store.
pub struct QueryExecutor<'a> {
    db: &'a dyn DatabaseClient,
    max_result_rows: usize,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new executor with the given row ceiling.
    pub fn new(db: &'a dyn DatabaseClient, max_result_rows: usize) -> Self {
        Self {
            db,
            max_result_rows,
        }
    }

    /// Executes `sql` and truncates the rows to the ceiling.
    ///
    /// Store errors are captured as `ExecutionResult::Failure`; nothing
    /// propagates past this call.
    pub async fn execute(&self, sql: &str) -> ExecutionResult {
        let start = Instant::now();
        let result = self.db.execute_query(sql).await;
        let elapsed = start.elapsed();

        match result {
            Ok(query_result) => {
                let returned = query_result.row_count;
                let capped = query_result.truncate_to(self.max_result_rows);

                if capped.was_truncated {
                    warn!(
                        returned,
                        max_result_rows = self.max_result_rows,
                        "Result exceeded row ceiling and was truncated"
                    );
                }
                debug!(rows = capped.row_count, elapsed_ms = elapsed.as_millis() as u64, "Statement executed");

                ExecutionResult::Rows(capped)
            }
            Err(e) => {
                debug!(error = %e, elapsed_ms = elapsed.as_millis() as u64, "Statement failed");
                ExecutionResult::Failure {
                    message: e.message().to_string(),
                }
            }
        }
    }
}

/// Result of executing a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecutionResult {
    /// Rows returned by the store, already within the ceiling.
    Rows(QueryResult),
    /// The store reported an error.
    Failure { message: String },
}

impl ExecutionResult {
    /// Returns true if the statement produced rows (possibly zero).
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Rows(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FailingDatabaseClient, MockDatabaseClient};
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_rows_are_capped_when_engine_ignores_limit() {
        let mock_db = MockDatabaseClient::with_transaction_rows(500);
        let executor = QueryExecutor::new(&mock_db, 100);

        let result = executor
            .execute("SELECT id, ccy FROM transactions LIMIT 100;")
            .await;

        match result {
            ExecutionResult::Rows(rows) => {
                assert_eq!(rows.row_count, 100);
                assert_eq!(rows.rows.len(), 100);
                assert!(rows.was_truncated);
                assert_eq!(rows.total_rows, Some(500));
                assert_eq!(
                    rows.truncation_warning(),
                    Some("Result truncated: showing 100 of 500 rows".to_string())
                );
            }
            other => panic!("Expected rows, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_small_result_is_untouched() {
        let mock_db = MockDatabaseClient::with_transaction_rows(3);
        let executor = QueryExecutor::new(&mock_db, 100);

        let ExecutionResult::Rows(rows) = executor.execute("SELECT id, ccy FROM transactions;").await
        else {
            panic!("Expected rows");
        };
        assert_eq!(rows.row_count, 3);
        assert!(!rows.was_truncated);
        assert_eq!(rows.total_rows, Some(3));
    }

    #[tokio::test]
    async fn test_statement_is_forwarded_verbatim() {
        let mock_db = MockDatabaseClient::new();
        let executor = QueryExecutor::new(&mock_db, 10);

        executor.execute("SELECT ts FROM transactions LIMIT 100;").await;

        assert_eq!(mock_db.executed(), vec!["SELECT ts FROM transactions LIMIT 100;"]);
    }

    #[tokio::test]
    async fn test_store_error_becomes_failure() {
        let failing = FailingDatabaseClient::new("no such column: secret");
        let executor = QueryExecutor::new(&failing, 100);

        let result = executor.execute("SELECT secret FROM transactions;").await;

        assert_eq!(
            result,
            ExecutionResult::Failure {
                message: "no such column: secret".to_string()
            }
        );
        assert!(!result.is_success());
    }
}
