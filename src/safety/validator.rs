//! Candidate SQL validation.
//!
//! A conservative textual filter for a single-table grammar: statement shape,
//! keyword denylist, table allow-list and qualified-column allow-list. Gates
//! run in order and the first failure decides the verdict.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use tracing::debug;

use crate::db::SchemaRegistry;

use super::{RejectionReason, ValidationVerdict};

/// Keywords that indicate data or schema mutation. Matched as whole words,
/// case-insensitively, anywhere in the text (comments and literals included).
pub const FORBIDDEN_KEYWORDS: &[&str] = &[
    "DROP", "DELETE", "UPDATE", "INSERT", "ALTER", "CREATE", "TRUNCATE", "ATTACH", "PRAGMA",
    "VACUUM",
];

static SELECT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^\s*SELECT\b").expect("valid SELECT pattern"));

static FORBIDDEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(?i)\b({})\b", FORBIDDEN_KEYWORDS.join("|")))
        .expect("valid denylist pattern")
});

static TABLE_CLAUSE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(FROM|JOIN)\b").expect("valid table clause pattern"));

/// A table item: a quoted or bare identifier.
static TABLE_ITEM_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?:"([^"]*)"|`([^`]*)`|\[([^\]]*)\]|'([^']*)'|([A-Za-z_][A-Za-z0-9_$]*))"#)
        .expect("valid table item pattern")
});

static TABLE_ALIAS_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^\s*(?:AS\s+)?(?:"[^"]*"|`[^`]*`|\[[^\]]*\]|'[^']*'|[A-Za-z_][A-Za-z0-9_$]*)"#)
        .expect("valid table alias pattern")
});

static SUBQUERY_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\(\s*(SELECT|WITH|VALUES)\b").expect("valid subquery pattern")
});

/// Engine-internal tables (`sqlite_master`, `sqlite_schema`, ...).
static SYSTEM_TABLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bsqlite_[A-Za-z0-9_]*").expect("valid system table pattern")
});

static QUALIFIED_COLUMN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)")
        .expect("valid qualified column pattern")
});

/// Validator bound to a schema registry.
#[derive(Debug, Clone)]
pub struct SqlValidator {
    registry: Arc<SchemaRegistry>,
}

impl SqlValidator {
    /// Creates a validator for the given registry.
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the registry this validator checks against.
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// Validates a raw candidate statement.
    pub fn validate(&self, raw: &str) -> ValidationVerdict {
        validate_sql(raw, &self.registry)
    }
}

/// Trims the text and collapses trailing terminators into exactly one `;`.
pub fn normalize_statement(sql: &str) -> String {
    let body = sql
        .trim()
        .trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    format!("{body};")
}

/// Validates a raw candidate statement against `registry`.
///
/// The single-statement check runs after the keyword gate so that smuggled
/// mutations (`SELECT ...; DROP ...`) are reported as unsafe rather than as
/// a shape error.
pub fn validate_sql(raw: &str, registry: &SchemaRegistry) -> ValidationVerdict {
    let sql = normalize_statement(raw);

    let verdict = check_starts_with_select(&sql)
        .and_then(|_| check_forbidden_keywords(&sql))
        .and_then(|_| check_single_statement(&sql))
        .and_then(|_| check_tables(&sql, registry))
        .and_then(|_| check_qualified_columns(&sql, registry));

    match verdict {
        Ok(()) => ValidationVerdict::Accepted { sql },
        Err(reason) => {
            debug!(reason = reason.code(), "Candidate SQL rejected");
            ValidationVerdict::Rejected(reason)
        }
    }
}

fn check_starts_with_select(sql: &str) -> Result<(), RejectionReason> {
    if SELECT_PATTERN.is_match(sql) {
        Ok(())
    } else {
        Err(RejectionReason::NotASelect)
    }
}

fn check_forbidden_keywords(sql: &str) -> Result<(), RejectionReason> {
    match FORBIDDEN_PATTERN.captures(sql) {
        Some(caps) => Err(RejectionReason::UnsafeKeyword(caps[1].to_uppercase())),
        None => Ok(()),
    }
}

/// Rejects a `;` outside quoted text and comments anywhere before the final
/// terminator.
fn check_single_statement(sql: &str) -> Result<(), RejectionReason> {
    let body = sql.strip_suffix(';').unwrap_or(sql);
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                for next in chars.by_ref() {
                    if next == c {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for next in chars.by_ref() {
                    if next == '\n' {
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for next in chars.by_ref() {
                    if prev == '*' && next == '/' {
                        break;
                    }
                    prev = next;
                }
            }
            ';' => return Err(RejectionReason::NotASelect),
            _ => {}
        }
    }

    Ok(())
}

/// Every item of every FROM and JOIN list must be an allowed table, at least
/// one FROM must name one, and engine-internal names may not appear at all.
fn check_tables(sql: &str, registry: &SchemaRegistry) -> Result<(), RejectionReason> {
    let mut has_from = false;

    for caps in TABLE_CLAUSE_PATTERN.captures_iter(sql) {
        let Some(clause) = caps.get(0) else {
            continue;
        };
        let tables = table_items(&sql[clause.end()..]);

        if let Some(table) = tables.iter().find(|t| !registry.is_allowed_table(t)) {
            return Err(RejectionReason::UnknownTable(Some(table.clone())));
        }
        if caps[1].eq_ignore_ascii_case("FROM") && !tables.is_empty() {
            has_from = true;
        }
    }

    if !has_from {
        return Err(RejectionReason::UnknownTable(None));
    }

    match SYSTEM_TABLE_PATTERN.find(sql) {
        Some(name) => Err(RejectionReason::UnknownTable(Some(name.as_str().to_string()))),
        None => Ok(()),
    }
}

/// Collects the table names in the list that starts at `clause`.
///
/// Follows comma-separated items, parenthesized join groups and aliases.
/// Subqueries are skipped; their own FROM clauses are matched separately.
/// Table-valued functions are reported by name.
fn table_items(clause: &str) -> Vec<String> {
    let mut tables = Vec::new();
    let mut rest = clause;
    let mut open_groups = 0usize;

    loop {
        rest = rest.trim_start();

        if SUBQUERY_PATTERN.is_match(rest) {
            rest = &rest[group_end(rest)..];
        } else if let Some(inner) = rest.strip_prefix('(') {
            open_groups += 1;
            rest = inner;
            continue;
        } else if let Some(caps) = TABLE_ITEM_PATTERN.captures(rest) {
            let name = (1..=5).find_map(|i| caps.get(i)).map_or("", |m| m.as_str());
            tables.push(name.to_string());
            rest = &rest[caps.get(0).map_or(0, |m| m.end())..];
            if rest.starts_with('(') {
                rest = &rest[group_end(rest)..];
            }
        } else {
            break;
        }

        loop {
            if let Some(alias) = TABLE_ALIAS_PATTERN.find(rest) {
                rest = &rest[alias.end()..];
            }
            rest = rest.trim_start();
            match rest.strip_prefix(')') {
                Some(after) if open_groups > 0 => {
                    open_groups -= 1;
                    rest = after;
                }
                _ => break,
            }
        }

        match rest.strip_prefix(',') {
            Some(next) => rest = next,
            None => break,
        }
    }

    tables
}

/// Returns the byte offset just past the parenthesis that closes the one
/// `text` starts with, or the text length if it never closes.
fn group_end(text: &str) -> usize {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '\'' | '"' => quote = Some(c),
                '(' => depth += 1,
                ')' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return i + 1;
                    }
                }
                _ => {}
            },
        }
    }

    text.len()
}

/// Unqualified column references are not checked here.
fn check_qualified_columns(sql: &str, registry: &SchemaRegistry) -> Result<(), RejectionReason> {
    for caps in QUALIFIED_COLUMN_PATTERN.captures_iter(sql) {
        let (table, column) = (&caps[1], &caps[2]);
        if !registry.is_allowed_table(table) || !registry.is_allowed_column(column) {
            return Err(RejectionReason::UnknownColumn(format!("{table}.{column}")));
        }
    }

    Ok(())
}
