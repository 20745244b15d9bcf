//! Row-cap injection for accepted statements.

use std::sync::LazyLock;

use regex::Regex;

use super::normalize_statement;

/// Row cap appended to non-aggregate statements without a LIMIT clause.
pub const DEFAULT_ROW_LIMIT: usize = 100;

static LIMIT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\s+\d+\b").expect("valid LIMIT pattern"));

static AGGREGATE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(COUNT|SUM|AVG|MIN|MAX)\b").expect("valid aggregate pattern")
});

/// Returns true if the statement already carries a `LIMIT <n>` clause.
pub fn has_limit(sql: &str) -> bool {
    LIMIT_PATTERN.is_match(sql)
}

/// Returns true if the statement calls an aggregate function.
pub fn is_aggregate(sql: &str) -> bool {
    AGGREGATE_PATTERN.is_match(sql)
}

/// Normalizes the terminator and appends `LIMIT <default_limit>` unless the
/// statement is aggregate or already limited.
///
/// `rewrite(&rewrite(x, n), n) == rewrite(x, n)` for any input.
pub fn rewrite(sql: &str, default_limit: usize) -> String {
    let normalized = normalize_statement(sql);
    if has_limit(&normalized) || is_aggregate(&normalized) {
        return normalized;
    }

    let body = normalized.trim_end_matches(';');
    // A trailing line comment would swallow a LIMIT appended on the same line.
    let separator = if ends_in_line_comment(body) { "\n" } else { " " };
    format!("{body}{separator}LIMIT {default_limit};")
}

fn ends_in_line_comment(body: &str) -> bool {
    body.lines().last().is_some_and(|line| line.contains("--"))
}
