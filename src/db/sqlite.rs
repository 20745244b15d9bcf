//! SQLite store client.
//!
//! Every call opens its own read-only connection, runs one statement under a
//! timeout and closes the connection before returning.

use crate::config::StoreConfig;
use crate::db::{ColumnInfo, DatabaseClient, QueryResult, Row, Value};
use crate::error::{GuardError, Result};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection, SqliteRow};
use sqlx::{
    Column as SqlxColumn, ConnectOptions, Connection, Executor, Row as SqlxRow, Statement,
    TypeInfo,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// How long SQLite waits on a locked database file before failing.
const BUSY_TIMEOUT_SECS: u64 = 5;

/// VM instructions between deadline checks.
const PROGRESS_CHECK_OPS: i32 = 1_000;

/// Read-only SQLite client.
#[derive(Debug, Clone)]
pub struct SqliteClient {
    options: SqliteConnectOptions,
    path: PathBuf,
    statement_timeout: Duration,
}

impl SqliteClient {
    /// Opens the store described by `config`.
    ///
    /// Fails if the file does not exist; the store is never created here.
    /// A probe connection is opened and closed to surface permission or
    /// corruption problems before the first request.
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        if !config.path.exists() {
            return Err(GuardError::connection(format!(
                "Database not found at {}. Run with --seed-demo first.",
                config.path.display()
            )));
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .read_only(true)
            .create_if_missing(false)
            .busy_timeout(Duration::from_secs(BUSY_TIMEOUT_SECS));

        let client = Self {
            options,
            path: config.path.clone(),
            statement_timeout: Duration::from_secs(config.statement_timeout_secs),
        };

        let probe = client.acquire().await?;
        client.release(probe).await;
        debug!(path = %client.path.display(), "Opened read-only store");

        Ok(client)
    }

    async fn acquire(&self) -> Result<SqliteConnection> {
        self.options
            .connect()
            .await
            .map_err(|e| map_connection_error(e, &self.path))
    }

    async fn release(&self, conn: SqliteConnection) {
        if let Err(e) = conn.close().await {
            warn!(error = %e, "Failed to close store connection cleanly");
        }
    }

    /// Makes the engine abort the running statement once the timeout elapses.
    ///
    /// Dropping the future is not enough: the SQLite worker keeps stepping
    /// the statement and `close()` waits for it.
    async fn arm_deadline(&self, conn: &mut SqliteConnection, start: Instant) -> Result<()> {
        let deadline = start + self.statement_timeout;
        let mut handle = conn
            .lock_handle()
            .await
            .map_err(|e| GuardError::connection(e.to_string()))?;
        handle.set_progress_handler(PROGRESS_CHECK_OPS, move || Instant::now() < deadline);
        Ok(())
    }

    fn timeout_error(&self) -> GuardError {
        GuardError::query(format!(
            "Query timed out after {} seconds",
            self.statement_timeout.as_secs()
        ))
    }

    async fn run(&self, conn: &mut SqliteConnection, sql: &str) -> Result<QueryResult> {
        let start = Instant::now();
        self.arm_deadline(conn, start).await?;

        let rows: Vec<SqliteRow> =
            tokio::time::timeout(self.statement_timeout, sqlx::query(sql).fetch_all(&mut *conn))
                .await
                .map_err(|_| self.timeout_error())?
                .map_err(|e| {
                    if start.elapsed() >= self.statement_timeout {
                        self.timeout_error()
                    } else {
                        GuardError::query(format_query_error(e))
                    }
                })?;

        let execution_time = start.elapsed();

        let columns: Vec<ColumnInfo> = match rows.first() {
            Some(first_row) => first_row
                .columns()
                .iter()
                .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                .collect(),
            // Empty result: the prepared statement still knows its columns.
            None => match (&mut *conn).prepare(sql).await {
                Ok(statement) => statement
                    .columns()
                    .iter()
                    .map(|col| ColumnInfo::new(col.name(), col.type_info().name()))
                    .collect(),
                Err(_) => Vec::new(),
            },
        };

        let converted: Vec<Row> = rows.iter().map(convert_row).collect();

        Ok(QueryResult::with_data(columns, converted).with_execution_time(execution_time))
    }
}

#[async_trait]
impl DatabaseClient for SqliteClient {
    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        let mut conn = self.acquire().await?;
        let result = self.run(&mut conn, sql).await;
        self.release(conn).await;
        result
    }

    fn describe(&self) -> String {
        format!("sqlite:{} (read-only)", self.path.display())
    }
}

/// Converts a SqliteRow to our Row type.
fn convert_row(row: &SqliteRow) -> Row {
    row.columns()
        .iter()
        .enumerate()
        .map(|(i, col)| convert_value(row, i, col.type_info().name()))
        .collect()
}

/// Converts a single column value, guided by the reported type name.
///
/// SQLite is dynamically typed, so a decode that does not match the declared
/// type falls back to the remaining representations.
fn convert_value(row: &SqliteRow, index: usize, type_name: &str) -> Value {
    let preferred = match type_name.to_uppercase().as_str() {
        "NULL" => return decode_any(row, index),
        "INTEGER" | "INT" | "INT8" | "BIGINT" | "BOOLEAN" => decode_int(row, index),
        "REAL" | "FLOAT" | "DOUBLE" | "NUMERIC" => decode_float(row, index),
        "BLOB" => decode_bytes(row, index),
        _ => decode_text(row, index),
    };

    preferred.unwrap_or_else(|| decode_any(row, index))
}

fn decode_any(row: &SqliteRow, index: usize) -> Value {
    decode_int(row, index)
        .or_else(|| decode_float(row, index))
        .or_else(|| decode_text(row, index))
        .or_else(|| decode_bytes(row, index))
        .unwrap_or(Value::Null)
}

fn decode_int(row: &SqliteRow, index: usize) -> Option<Value> {
    row.try_get::<Option<i64>, _>(index)
        .ok()
        .map(|v| v.map(Value::Int).unwrap_or(Value::Null))
}

fn decode_float(row: &SqliteRow, index: usize) -> Option<Value> {
    row.try_get::<Option<f64>, _>(index)
        .ok()
        .map(|v| v.map(Value::Float).unwrap_or(Value::Null))
}

fn decode_text(row: &SqliteRow, index: usize) -> Option<Value> {
    row.try_get::<Option<String>, _>(index)
        .ok()
        .map(|v| v.map(Value::String).unwrap_or(Value::Null))
}

fn decode_bytes(row: &SqliteRow, index: usize) -> Option<Value> {
    row.try_get::<Option<Vec<u8>>, _>(index)
        .ok()
        .map(|v| v.map(Value::Bytes).unwrap_or(Value::Null))
}

/// Maps sqlx connection errors to user-friendly messages.
fn map_connection_error(error: sqlx::Error, path: &Path) -> GuardError {
    let error_str = error.to_string().to_lowercase();

    if error_str.contains("unable to open") || error_str.contains("no such file") {
        GuardError::connection(format!("Cannot open database at {}.", path.display()))
    } else if error_str.contains("not a database") || error_str.contains("malformed") {
        GuardError::connection(format!(
            "File at {} is not a valid SQLite database.",
            path.display()
        ))
    } else if error_str.contains("locked") || error_str.contains("busy") {
        GuardError::connection(format!(
            "Database at {} is locked by another process.",
            path.display()
        ))
    } else {
        GuardError::connection(error.to_string())
    }
}

/// Formats a query error, preferring the engine's own message.
fn format_query_error(error: sqlx::Error) -> String {
    match error.as_database_error() {
        Some(db_error) => db_error.message().to_string(),
        None => error.to_string(),
    }
}
