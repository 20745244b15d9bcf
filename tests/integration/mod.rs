//! Integration tests against a seeded SQLite store.

pub mod config_test;
pub mod pipeline_test;
pub mod store_test;

use tempfile::TempDir;
use txn_sqlguard::config::StoreConfig;
use txn_sqlguard::db::{seed_demo_store, SeedOptions};

/// Seeds the demo store (50 trades) into a fresh temp directory.
///
/// The directory must be kept alive for as long as the store is used.
pub async fn seeded_store() -> (TempDir, StoreConfig) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("transactions.db");
    seed_demo_store(&path, &SeedOptions::default())
        .await
        .unwrap();

    let config = StoreConfig {
        path,
        statement_timeout_secs: 5,
    };
    (dir, config)
}
