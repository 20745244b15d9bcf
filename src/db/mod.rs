//! Store abstraction layer.
//!
//! Provides a trait-based interface for executing statements against the
//! guarded store, so the execution sandbox can run against SQLite or an
//! in-memory mock interchangeably.

mod mock;
pub mod schema;
pub mod seed;
mod sqlite;
mod types;

pub use mock::{FailingDatabaseClient, MockDatabaseClient};
pub use schema::{Column, SchemaRegistry, TRANSACTIONS_TABLE};
pub use seed::{seed_demo_store, SeedOptions};
pub use sqlite::SqliteClient;
pub use types::{ColumnInfo, QueryResult, Row, Value};

use crate::config::StoreConfig;
use crate::error::Result;
use async_trait::async_trait;

/// Opens the configured store in read-only mode.
///
/// This is the central factory for store clients used by the pipeline.
pub async fn connect(config: &StoreConfig) -> Result<Box<dyn DatabaseClient>> {
    let client = SqliteClient::open(config).await?;
    Ok(Box::new(client))
}

/// Trait defining the interface for store clients.
///
/// Implementations own whatever connection they use for the duration of a
/// single call and release it before returning.
#[async_trait]
pub trait DatabaseClient: Send + Sync {
    /// Executes a SQL statement and returns every row the engine produced.
    async fn execute_query(&self, sql: &str) -> Result<QueryResult>;

    /// Returns a display-safe description of the store.
    fn describe(&self) -> String;
}
