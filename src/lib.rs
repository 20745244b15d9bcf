//! txn-sqlguard - guarded natural-language-to-SQL over a read-only
//! transactions store.
//!
//! This library exposes the core modules for use by the binary and
//! integration tests.

pub mod cli;
pub mod config;
pub mod db;
pub mod error;
pub mod llm;
pub mod logging;
pub mod output;
pub mod pipeline;
pub mod query;
pub mod safety;

pub use pipeline::{Pipeline, PipelineOutcome};
