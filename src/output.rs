//! Output rendering for pipeline outcomes.
//!
//! Renders a `PipelineOutcome` either as plain text (SQL, a column-aligned
//! table and any warning or error) or as a single JSON document.

use serde::Serialize;

use crate::db::{QueryResult, Value};
use crate::pipeline::PipelineOutcome;

/// Output format for the CLI.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text.
    #[default]
    Text,
    /// One JSON object per run.
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "Invalid output format: {s}. Expected: text or json"
            )),
        }
    }
}

/// JSON view of an outcome.
#[derive(Debug, Serialize)]
struct JsonOutcome<'a> {
    generated_sql: Option<&'a str>,
    columns: Option<Vec<&'a str>>,
    rows: Option<&'a [Vec<Value>]>,
    row_count: Option<usize>,
    truncated: bool,
    total_rows: Option<usize>,
    error: Option<String>,
    error_kind: Option<&'static str>,
}

/// Renders an outcome in the requested format.
pub fn render(outcome: &PipelineOutcome, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => render_text(outcome),
        OutputFormat::Json => render_json(outcome),
    }
}

fn render_text(outcome: &PipelineOutcome) -> String {
    let mut sections = Vec::new();

    if let Some(sql) = outcome.generated_sql() {
        sections.push(format!("SQL: {sql}"));
    }

    if let Some(rows) = outcome.rows() {
        if rows.is_empty() {
            sections.push("(no rows)".to_string());
        } else {
            sections.push(format_result_table(rows));
        }
        let mut summary = format!(
            "{} row(s) in {} ms",
            rows.row_count,
            rows.execution_time.as_millis()
        );
        if let Some(warning) = rows.truncation_warning() {
            summary.push_str(&format!(" ({warning})"));
        }
        sections.push(summary);
    }

    if let Some(message) = outcome.error_message() {
        sections.push(format!("Error: {message}"));
    }

    sections.join("\n\n")
}

fn render_json(outcome: &PipelineOutcome) -> String {
    let rows = outcome.rows();
    let view = JsonOutcome {
        generated_sql: outcome.generated_sql(),
        columns: rows.map(QueryResult::column_names),
        rows: rows.map(|r| r.rows.as_slice()),
        row_count: rows.map(|r| r.row_count),
        truncated: rows.is_some_and(|r| r.was_truncated),
        total_rows: rows.and_then(|r| r.total_rows),
        error: outcome.error_message(),
        error_kind: outcome.error().map(|e| e.category()),
    };

    serde_json::to_string_pretty(&view)
        .unwrap_or_else(|e| format!(r#"{{"error":"Failed to serialize output: {e}"}}"#))
}

/// Formats a result set as a column-aligned table.
pub fn format_result_table(result: &QueryResult) -> String {
    let headers: Vec<String> = result.columns.iter().map(|c| c.name.clone()).collect();
    let rows: Vec<Vec<String>> = result
        .rows
        .iter()
        .map(|row| row.iter().map(Value::to_display_string).collect())
        .collect();
    format_table(&headers, &rows)
}

fn format_table(headers: &[String], rows: &[Vec<String>]) -> String {
    if headers.is_empty() {
        return String::new();
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let mut output = String::new();

    let header_line: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
        .collect();
    output.push_str(header_line.join(" │ ").trim_end());
    output.push('\n');

    let separator: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
    output.push_str(&separator.join("─┼─"));
    output.push('\n');

    for row in rows {
        let row_line: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let width = widths.get(i).copied().unwrap_or(0);
                format!("{:width$}", cell, width = width)
            })
            .collect();
        output.push_str(row_line.join(" │ ").trim_end());
        output.push('\n');
    }

    output.trim_end().to_string()
}
