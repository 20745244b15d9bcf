//! Demo store generation.
//!
//! Creates the `transactions` table and fills it with synthetic trades. This
//! is the only writable connection in the crate and is never used by the
//! query pipeline.

use crate::db::SchemaRegistry;
use crate::error::{GuardError, Result};
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use sqlx::sqlite::SqliteConnectOptions;
use sqlx::{ConnectOptions, Connection};
use std::path::Path;
use tracing::info;

const COUNTERPARTIES: &[&str] = &[
    "Acme Corp",
    "Beta Bank",
    "Gamma LLC",
    "Delta Ltd",
    "Omega Partners",
];
const CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "JPY"];
const BOOKS: &[&str] = &["Loans", "FX Desk", "Derivatives", "Equities"];

const MIN_AMOUNT: i64 = 50_000;
const MAX_AMOUNT: i64 = 10_000_000;

/// Parameters for the generated data set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedOptions {
    /// Number of consecutive trading days.
    pub days: u32,
    /// Trades generated per day.
    pub trades_per_day: u32,
    /// RNG seed, so repeated runs produce the same store.
    pub rng_seed: u64,
}

impl Default for SeedOptions {
    fn default() -> Self {
        Self {
            days: 10,
            trades_per_day: 5,
            rng_seed: 42,
        }
    }
}

/// A generated trade row.
#[derive(Debug, Clone, PartialEq)]
struct Trade {
    id: i64,
    ts: String,
    amount: f64,
    ccy: &'static str,
    counterparty: &'static str,
    book: &'static str,
}

fn base_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 9, 1)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .unwrap_or_default()
}

fn generate_trades(options: &SeedOptions) -> Vec<Trade> {
    let mut rng = StdRng::seed_from_u64(options.rng_seed);
    let base = base_timestamp();
    let mut trades = Vec::with_capacity((options.days * options.trades_per_day) as usize);

    for day in 0..options.days {
        for _ in 0..options.trades_per_day {
            let ts = base
                + ChronoDuration::days(day as i64)
                + ChronoDuration::hours(rng.gen_range(0..=8))
                + ChronoDuration::minutes(rng.gen_range(0..=59));

            trades.push(Trade {
                id: trades.len() as i64 + 1,
                ts: ts.format("%Y-%m-%d %H:%M:%S").to_string(),
                amount: rng.gen_range(MIN_AMOUNT..=MAX_AMOUNT) as f64,
                ccy: CURRENCIES.choose(&mut rng).copied().unwrap_or("USD"),
                counterparty: COUNTERPARTIES.choose(&mut rng).copied().unwrap_or("Acme Corp"),
                book: BOOKS.choose(&mut rng).copied().unwrap_or("Loans"),
            });
        }
    }

    trades
}

/// Creates (or resets) the demo store at `path`.
///
/// Existing rows are removed first, so the call is idempotent. Returns the
/// number of rows written.
pub async fn seed_demo_store(path: &Path, options: &SeedOptions) -> Result<usize> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            GuardError::connection(format!(
                "Failed to create directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    let mut conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .connect()
        .await
        .map_err(|e| GuardError::connection(format!("Failed to create demo store: {e}")))?;

    let registry = SchemaRegistry::transactions();
    let trades = generate_trades(options);

    let mut tx = conn
        .begin()
        .await
        .map_err(|e| GuardError::query(format!("Failed to start transaction: {e}")))?;

    sqlx::query(&registry.create_table_sql())
        .execute(&mut *tx)
        .await
        .map_err(|e| GuardError::query(format!("Failed to create table: {e}")))?;

    sqlx::query("DELETE FROM transactions")
        .execute(&mut *tx)
        .await
        .map_err(|e| GuardError::query(format!("Failed to reset table: {e}")))?;

    for trade in &trades {
        sqlx::query(
            "INSERT INTO transactions (id, ts, amount, ccy, counterparty, book) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(trade.id)
        .bind(&trade.ts)
        .bind(trade.amount)
        .bind(trade.ccy)
        .bind(trade.counterparty)
        .bind(trade.book)
        .execute(&mut *tx)
        .await
        .map_err(|e| GuardError::query(format!("Failed to insert trade {}: {e}", trade.id)))?;
    }

    tx.commit()
        .await
        .map_err(|e| GuardError::query(format!("Failed to commit demo data: {e}")))?;

    conn.close()
        .await
        .map_err(|e| GuardError::connection(format!("Failed to close demo store: {e}")))?;

    info!(path = %path.display(), rows = trades.len(), "Seeded demo store");
    Ok(trades.len())
}
