//! Error types for txn-sqlguard.
//!
//! `GuardError` covers infrastructure failures (store, generator, config).
//! `PipelineError` is the caller-facing taxonomy produced by the pipeline.

use thiserror::Error;

use crate::safety::RejectionReason;

/// Main error type for infrastructure operations.
#[derive(Error, Debug)]
pub enum GuardError {
    /// Store connection errors (missing file, cannot open, etc.)
    #[error("Connection error: {0}")]
    Connection(String),

    /// Query execution errors (syntax errors, timeouts, etc.)
    #[error("Query error: {0}")]
    Query(String),

    /// LLM API errors (rate limits, auth, timeouts, etc.)
    #[error("LLM error: {0}")]
    Llm(String),

    /// Configuration errors (invalid config file, out-of-range values, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal application errors (unexpected states, bugs, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GuardError {
    /// Creates a connection error with the given message.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a query error with the given message.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Creates an LLM error with the given message.
    pub fn llm(msg: impl Into<String>) -> Self {
        Self::Llm(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Connection(_) => "Connection Error",
            Self::Query(_) => "Query Error",
            Self::Llm(_) => "LLM Error",
            Self::Config(_) => "Configuration Error",
            Self::Internal(_) => "Internal Error",
        }
    }

    /// Returns the message without the category prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::Connection(m)
            | Self::Query(m)
            | Self::Llm(m)
            | Self::Config(m)
            | Self::Internal(m) => m,
        }
    }
}

/// Result type alias using GuardError.
pub type Result<T> = std::result::Result<T, GuardError>;

/// Terminal failure of a single pipeline run.
///
/// Every variant ends the request; none is retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// The generator call failed before any SQL was produced.
    #[error("LLM error: {0}")]
    Generator(String),

    /// The candidate statement failed a validation gate and was not executed.
    #[error("Blocked query: {0}")]
    Rejected(RejectionReason),

    /// The store reported an error while executing the rewritten statement.
    #[error("SQL execution error: {0}")]
    Execution(String),
}

impl PipelineError {
    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Generator(_) => "Generator Failure",
            Self::Rejected(_) => "Validation Rejection",
            Self::Execution(_) => "Execution Failure",
        }
    }
}
