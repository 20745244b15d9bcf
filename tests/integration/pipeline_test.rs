//! End-to-end pipeline tests: mock LLM, real read-only store.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use txn_sqlguard::config::GuardConfig;
use txn_sqlguard::db::{self, SchemaRegistry, Value};
use txn_sqlguard::error::PipelineError;
use txn_sqlguard::llm::{CandidateGenerator, MockLlmClient};
use txn_sqlguard::pipeline::Pipeline;
use txn_sqlguard::safety::RejectionReason;

use super::seeded_store;

fn pipeline(settings: GuardConfig) -> Pipeline {
    Pipeline::new(Arc::new(SchemaRegistry::transactions()), settings)
}

fn answering(sql: &str) -> CandidateGenerator {
    CandidateGenerator::new(Arc::new(MockLlmClient::new().with_response("", sql)))
}

#[tokio::test]
async fn test_count_question_end_to_end() {
    let (_dir, config) = seeded_store().await;
    let store = db::connect(&config).await.unwrap();
    let generator = CandidateGenerator::new(Arc::new(MockLlmClient::new()));

    let outcome = pipeline(GuardConfig::default())
        .run("How many trades are there?", &generator, store.as_ref())
        .await;

    assert_eq!(
        outcome.generated_sql(),
        Some("SELECT COUNT(*) FROM transactions;")
    );
    let rows = outcome.rows().unwrap();
    assert_eq!(rows.rows, vec![vec![Value::Int(50)]]);
}

#[tokio::test]
async fn test_aggregate_scenario_executes_unchanged() {
    let (_dir, config) = seeded_store().await;
    let store = db::connect(&config).await.unwrap();
    let generator = answering(
        "SELECT counterparty, SUM(amount) FROM transactions WHERE ccy='USD' GROUP BY counterparty",
    );

    let outcome = pipeline(GuardConfig::default())
        .run("USD totals per counterparty", &generator, store.as_ref())
        .await;

    assert_eq!(
        outcome.generated_sql(),
        Some("SELECT counterparty, SUM(amount) FROM transactions WHERE ccy='USD' GROUP BY counterparty;")
    );
    let rows = outcome.rows().unwrap();
    assert!(rows.row_count <= 5);
    assert_eq!(rows.columns[0].name, "counterparty");
    assert!(!rows.was_truncated);
}

#[tokio::test]
async fn test_default_limit_bounds_listing() {
    let (_dir, config) = seeded_store().await;
    let store = db::connect(&config).await.unwrap();
    let settings = GuardConfig {
        default_row_limit: 10,
        max_result_rows: 100,
    };

    let outcome = pipeline(settings)
        .run("List all trades", &answering("SELECT * FROM transactions"), store.as_ref())
        .await;

    assert_eq!(
        outcome.generated_sql(),
        Some("SELECT * FROM transactions LIMIT 10;")
    );
    let rows = outcome.rows().unwrap();
    assert_eq!(rows.row_count, 10);
    assert!(!rows.was_truncated);
    assert_eq!(rows.columns.len(), 6);
}

#[tokio::test]
async fn test_row_ceiling_overrides_generated_limit() {
    let (_dir, config) = seeded_store().await;
    let store = db::connect(&config).await.unwrap();
    let settings = GuardConfig {
        default_row_limit: 100,
        max_result_rows: 5,
    };

    let outcome = pipeline(settings)
        .run(
            "Twenty trades",
            &answering("SELECT id FROM transactions ORDER BY id LIMIT 20"),
            store.as_ref(),
        )
        .await;

    let rows = outcome.rows().unwrap();
    assert_eq!(rows.row_count, 5);
    assert!(rows.was_truncated);
    assert_eq!(rows.total_rows, Some(20));
}

#[tokio::test]
async fn test_smuggled_drop_is_blocked_and_store_intact() {
    let (_dir, config) = seeded_store().await;
    let store = db::connect(&config).await.unwrap();

    let outcome = pipeline(GuardConfig::default())
        .run(
            "drop it",
            &answering("SELECT * FROM transactions; DROP TABLE transactions;"),
            store.as_ref(),
        )
        .await;

    assert_eq!(
        outcome.error(),
        Some(&PipelineError::Rejected(RejectionReason::UnsafeKeyword(
            "DROP".to_string()
        )))
    );

    let check = pipeline(GuardConfig::default())
        .run(
            "How many trades?",
            &CandidateGenerator::new(Arc::new(MockLlmClient::new())),
            store.as_ref(),
        )
        .await;
    assert_eq!(check.rows().unwrap().rows, vec![vec![Value::Int(50)]]);
}

#[tokio::test]
async fn test_scenario_rejections() {
    let (_dir, config) = seeded_store().await;
    let store = db::connect(&config).await.unwrap();

    let cases = [
        (
            "SELECT t.id FROM other_table t",
            RejectionReason::UnknownTable(Some("other_table".to_string())),
        ),
        (
            "SELECT transactions.secret FROM transactions",
            RejectionReason::UnknownColumn("transactions.secret".to_string()),
        ),
        ("PRAGMA table_info(transactions)", RejectionReason::NotASelect),
    ];

    for (sql, reason) in cases {
        let outcome = pipeline(GuardConfig::default())
            .run("q", &answering(sql), store.as_ref())
            .await;
        assert_eq!(outcome.generated_sql(), Some(sql));
        assert_eq!(outcome.error(), Some(&PipelineError::Rejected(reason)));
    }
}

#[tokio::test]
async fn test_engine_catalog_is_unreachable() {
    let (_dir, config) = seeded_store().await;
    let store = db::connect(&config).await.unwrap();

    let cases = [
        (
            "SELECT sql FROM transactions, sqlite_master",
            RejectionReason::UnknownTable(Some("sqlite_master".to_string())),
        ),
        (
            "SELECT name FROM transactions, pragma_table_info('transactions')",
            RejectionReason::UnknownTable(Some("pragma_table_info".to_string())),
        ),
    ];

    for (sql, reason) in cases {
        let outcome = pipeline(GuardConfig::default())
            .run("show me the schema", &answering(sql), store.as_ref())
            .await;
        assert!(outcome.rows().is_none(), "rows returned for: {}", sql);
        assert_eq!(outcome.error(), Some(&PipelineError::Rejected(reason)));
    }
}

#[tokio::test]
async fn test_unqualified_unknown_column_fails_in_engine() {
    let (_dir, config) = seeded_store().await;
    let store = db::connect(&config).await.unwrap();

    let outcome = pipeline(GuardConfig::default())
        .run("secrets", &answering("SELECT secret FROM transactions"), store.as_ref())
        .await;

    let message = outcome.error_message().unwrap();
    assert!(message.starts_with("SQL execution error:"), "{}", message);
    assert!(message.contains("secret"));
    assert!(outcome.rows().is_none());
}

#[tokio::test]
async fn test_generator_failure_end_to_end() {
    let (_dir, config) = seeded_store().await;
    let store = db::connect(&config).await.unwrap();
    let generator = CandidateGenerator::new(Arc::new(MockLlmClient::failing("upstream 503")));

    let outcome = pipeline(GuardConfig::default())
        .run("anything", &generator, store.as_ref())
        .await;

    assert_eq!(outcome.generated_sql(), None);
    assert_eq!(
        outcome.error_message().as_deref(),
        Some("LLM error: upstream 503")
    );
}
