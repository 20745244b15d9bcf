//! Execution sandbox tests against a real store.
//!
//! These run statements directly, bypassing the validator, to check that the
//! store connection alone refuses mutation.

use super::seeded_store;
use std::time::{Duration, Instant};
use txn_sqlguard::db::{self, DatabaseClient, SqliteClient, Value};
use txn_sqlguard::error::GuardError;
use txn_sqlguard::query::{ExecutionResult, QueryExecutor};

async fn count_rows(client: &dyn DatabaseClient) -> Value {
    let result = client
        .execute_query("SELECT COUNT(*) FROM transactions;")
        .await
        .unwrap();
    result.rows[0][0].clone()
}

#[tokio::test]
async fn test_store_refuses_every_kind_of_write() {
    let (_dir, config) = seeded_store().await;
    let client = SqliteClient::open(&config).await.unwrap();

    let statements = [
        "DELETE FROM transactions;",
        "UPDATE transactions SET amount = 0;",
        "INSERT INTO transactions (id, ts, amount, ccy, counterparty, book) VALUES (999, '2025-09-01 09:00:00', 1.0, 'USD', 'X', 'Y');",
        "DROP TABLE transactions;",
        "CREATE TABLE shadow (id INTEGER);",
    ];

    for sql in statements {
        let result = client.execute_query(sql).await;
        assert!(
            matches!(result, Err(GuardError::Query(_))),
            "write succeeded: {}",
            sql
        );
    }

    assert_eq!(count_rows(&client).await, Value::Int(50));
}

#[tokio::test]
async fn test_connect_missing_store_reports_seed_hint() {
    let dir = tempfile::tempdir().unwrap();
    let config = txn_sqlguard::config::StoreConfig::at(dir.path().join("nope.db"));

    let err = db::connect(&config).await.err().unwrap();

    assert!(err.to_string().contains("--seed-demo"));
    assert!(!config.path.exists());
}

#[tokio::test]
async fn test_executor_caps_real_rows() {
    let (_dir, config) = seeded_store().await;
    let client = db::connect(&config).await.unwrap();
    let executor = QueryExecutor::new(client.as_ref(), 7);

    let ExecutionResult::Rows(rows) = executor
        .execute("SELECT id FROM transactions ORDER BY id;")
        .await
    else {
        panic!("Expected rows");
    };

    assert_eq!(rows.row_count, 7);
    assert!(rows.was_truncated);
    assert_eq!(rows.total_rows, Some(50));
    assert_eq!(rows.rows[6][0], Value::Int(7));
}

#[tokio::test]
async fn test_executor_reports_engine_errors() {
    let (_dir, config) = seeded_store().await;
    let client = db::connect(&config).await.unwrap();
    let executor = QueryExecutor::new(client.as_ref(), 100);

    let result = executor.execute("SELECT FROM WHERE;").await;

    assert!(matches!(result, ExecutionResult::Failure { .. }));
}

#[tokio::test]
async fn test_describe_mentions_read_only() {
    let (_dir, config) = seeded_store().await;
    let client = db::connect(&config).await.unwrap();
    assert!(client.describe().contains("read-only"));
}

#[tokio::test]
async fn test_statement_timeout_bounds_wall_time() {
    let (_dir, mut config) = seeded_store().await;
    config.statement_timeout_secs = 1;
    let client = db::connect(&config).await.unwrap();
    let executor = QueryExecutor::new(client.as_ref(), 100);

    let start = Instant::now();
    let result = executor
        .execute(
            "SELECT COUNT(*) FROM transactions AS a JOIN transactions AS b \
             JOIN transactions AS c JOIN transactions AS d JOIN transactions AS e \
             JOIN transactions AS f;",
        )
        .await;
    let elapsed = start.elapsed();

    match result {
        ExecutionResult::Failure { message } => {
            assert_eq!(message, "Query timed out after 1 seconds")
        }
        other => panic!("Expected a timeout, got {:?}", other),
    }
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
}
