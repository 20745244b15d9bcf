//! Schema registry for the guarded store.
//!
//! Describes the one table the pipeline may query and its columns. The
//! registry is built once at startup and never derived from user or model
//! input.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Canonical name of the transactions table.
pub const TRANSACTIONS_TABLE: &str = "transactions";

/// A column in the allowed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, lower-cased.
    pub name: String,

    /// SQLite storage type (e.g., "INTEGER", "TEXT").
    pub data_type: String,

    /// Whether the column is the table's primary key.
    pub is_primary_key: bool,

    /// Human-readable hint included in the generator prompt.
    pub description: Option<String>,
}

impl Column {
    /// Creates a new column with the given name and type.
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into().to_lowercase(),
            data_type: data_type.into(),
            is_primary_key: false,
            description: None,
        }
    }

    /// Marks the column as the primary key.
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self
    }

    /// Sets the prompt description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Immutable description of the single queryable table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaRegistry {
    table_name: String,
    columns: Vec<Column>,
    allowed_columns: BTreeSet<String>,
}

impl SchemaRegistry {
    /// Creates a registry for `table_name` with the given columns.
    ///
    /// Names are stored in lower-cased canonical form.
    pub fn new(table_name: impl Into<String>, columns: Vec<Column>) -> Self {
        let allowed_columns = columns.iter().map(|c| c.name.to_lowercase()).collect();
        Self {
            table_name: table_name.into().to_lowercase(),
            columns,
            allowed_columns,
        }
    }

    /// The registry for the `transactions` store.
    pub fn transactions() -> Self {
        Self::new(
            TRANSACTIONS_TABLE,
            vec![
                Column::new("id", "INTEGER").primary_key(),
                Column::new("ts", "TEXT").description("timestamp as 'YYYY-MM-DD HH:MM:SS'"),
                Column::new("amount", "REAL"),
                Column::new("ccy", "TEXT").description("currency code: 'USD','EUR','GBP',..."),
                Column::new("counterparty", "TEXT"),
                Column::new("book", "TEXT"),
            ],
        )
    }

    /// Returns the allowed table name.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// Returns the columns in declaration order.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the allowed column names (lower-cased, sorted).
    pub fn allowed_columns(&self) -> &BTreeSet<String> {
        &self.allowed_columns
    }

    /// Returns true if `name` is the allowed table (case-insensitive).
    pub fn is_allowed_table(&self, name: &str) -> bool {
        name.eq_ignore_ascii_case(&self.table_name)
    }

    /// Returns true if `name` is an allowed column (case-insensitive).
    pub fn is_allowed_column(&self, name: &str) -> bool {
        self.allowed_columns.contains(&name.to_lowercase())
    }

    /// Formats the schema for inclusion in the generator prompt.
    pub fn format_for_llm(&self) -> String {
        let column_lines = self
            .columns
            .iter()
            .map(|column| {
                let mut annotation = column.data_type.clone();
                if column.is_primary_key {
                    annotation.push_str(" primary key");
                }
                match &column.description {
                    Some(description) => {
                        format!("- {} ({}, {})\n", column.name, annotation, description)
                    }
                    None => format!("- {} ({})\n", column.name, annotation),
                }
            })
            .collect::<String>();

        format!(
            "SQLite database with a single table '{}' (read-only).\nColumns:\n{}",
            self.table_name, column_lines
        )
    }

    /// Returns the DDL used to create the table in a fresh store.
    pub fn create_table_sql(&self) -> String {
        let column_defs = self
            .columns
            .iter()
            .map(|column| {
                if column.is_primary_key {
                    format!("  {} {} PRIMARY KEY", column.name, column.data_type)
                } else {
                    format!("  {} {}", column.name, column.data_type)
                }
            })
            .collect::<Vec<_>>()
            .join(",\n");

        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n)",
            self.table_name, column_defs
        )
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::transactions()
    }
}
