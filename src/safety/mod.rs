//! Query safety gates.
//!
//! Validates untrusted candidate SQL against the schema registry and a fixed
//! keyword denylist, then rewrites accepted statements to carry a row cap.
//! Both steps are purely textual; the read-only store connection is the
//! independent layer underneath.

mod rewriter;
mod validator;

pub use rewriter::{has_limit, is_aggregate, rewrite, DEFAULT_ROW_LIMIT};
pub use validator::{normalize_statement, validate_sql, SqlValidator, FORBIDDEN_KEYWORDS};

use std::fmt;

/// Why a candidate statement was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// Not a single statement starting with SELECT.
    NotASelect,
    /// A denylisted keyword appears as a whole word (carries the keyword, upper-cased).
    UnsafeKeyword(String),
    /// A FROM/JOIN target is not the allowed table, or no FROM clause names one.
    UnknownTable(Option<String>),
    /// A `table.column` reference is outside the allow-list.
    UnknownColumn(String),
}

impl RejectionReason {
    /// Stable identifier for logs and machine-readable output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotASelect => "NotASelect",
            Self::UnsafeKeyword(_) => "UnsafeKeyword",
            Self::UnknownTable(_) => "UnknownTable",
            Self::UnknownColumn(_) => "UnknownColumn",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotASelect => write!(f, "Only SELECT queries are allowed."),
            Self::UnsafeKeyword(keyword) => write!(
                f,
                "Destructive or unsafe SQL detected (DDL/DML not allowed): {keyword}."
            ),
            Self::UnknownTable(Some(table)) => {
                write!(f, "Query references unknown or disallowed table '{table}'.")
            }
            Self::UnknownTable(None) => {
                write!(f, "Query does not select FROM the allowed table.")
            }
            Self::UnknownColumn(column) => {
                write!(f, "Query references unknown column '{column}' via dot notation.")
            }
        }
    }
}

/// Outcome of validating a candidate statement.
///
/// Exactly one variant holds; a verdict is never mutated after it is produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationVerdict {
    /// All gates passed. Carries the normalized statement.
    Accepted { sql: String },
    /// A gate failed.
    Rejected(RejectionReason),
}

impl ValidationVerdict {
    /// Returns true if the statement passed every gate.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Returns the normalized statement if accepted.
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Accepted { sql } => Some(sql),
            Self::Rejected(_) => None,
        }
    }

    /// Returns the rejection reason if rejected.
    pub fn rejection(&self) -> Option<&RejectionReason> {
        match self {
            Self::Accepted { .. } => None,
            Self::Rejected(reason) => Some(reason),
        }
    }
}
