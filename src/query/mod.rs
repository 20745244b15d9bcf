//! Execution sandbox for accepted statements.
//!
//! Isolates store access and the row ceiling from the pipeline orchestrator.

pub mod executor;

pub use executor::{ExecutionResult, QueryExecutor};
