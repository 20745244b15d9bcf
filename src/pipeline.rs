//! Pipeline orchestrator.
//!
//! Sequences generation, validation, rewriting and execution for one
//! question. Every failure becomes part of the returned outcome; `run` never
//! returns an error or panics, and nothing is retried.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::GuardConfig;
use crate::db::{DatabaseClient, QueryResult, SchemaRegistry};
use crate::error::PipelineError;
use crate::llm::CandidateGenerator;
use crate::query::{ExecutionResult, QueryExecutor};
use crate::safety::{rewrite, SqlValidator, ValidationVerdict};

/// Stages a request moves through. Each stage may exit early to `Done`
/// except `Rewriting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Generating,
    Validating,
    Rewriting,
    Executing,
    Done,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Generating => "generating",
            Self::Validating => "validating",
            Self::Rewriting => "rewriting",
            Self::Executing => "executing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Final result of one pipeline run.
///
/// Exactly one of rows or error is present. `generated_sql` is absent only
/// when generation itself failed.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutcome {
    generated_sql: Option<String>,
    result: std::result::Result<QueryResult, PipelineError>,
}

impl PipelineOutcome {
    fn generator_failure(message: String) -> Self {
        Self {
            generated_sql: None,
            result: Err(PipelineError::Generator(message)),
        }
    }

    fn failure(sql: String, error: PipelineError) -> Self {
        Self {
            generated_sql: Some(sql),
            result: Err(error),
        }
    }

    fn success(sql: String, rows: QueryResult) -> Self {
        Self {
            generated_sql: Some(sql),
            result: Ok(rows),
        }
    }

    /// SQL shown to the caller: the raw candidate on rejection, the rewritten
    /// statement once execution was attempted.
    pub fn generated_sql(&self) -> Option<&str> {
        self.generated_sql.as_deref()
    }

    /// Rows, when the run succeeded.
    pub fn rows(&self) -> Option<&QueryResult> {
        self.result.as_ref().ok()
    }

    /// The terminal error, when the run failed.
    pub fn error(&self) -> Option<&PipelineError> {
        self.result.as_ref().err()
    }

    /// User-facing error text, when the run failed.
    pub fn error_message(&self) -> Option<String> {
        self.error().map(ToString::to_string)
    }

    /// Returns true if rows are present.
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    /// Splits the outcome into its caller-facing triple.
    pub fn into_parts(self) -> (Option<String>, Option<QueryResult>, Option<PipelineError>) {
        match self.result {
            Ok(rows) => (self.generated_sql, Some(rows), None),
            Err(error) => (self.generated_sql, None, Some(error)),
        }
    }
}

/// Guarded question-to-rows pipeline.
///
/// Holds only immutable state, so one instance can serve concurrent runs.
#[derive(Debug, Clone)]
pub struct Pipeline {
    validator: SqlValidator,
    settings: GuardConfig,
}

impl Pipeline {
    /// Creates a pipeline over `registry` with the given row caps.
    pub fn new(registry: Arc<SchemaRegistry>, settings: GuardConfig) -> Self {
        Self {
            validator: SqlValidator::new(registry),
            settings,
        }
    }

    /// Schema registry the validator checks against.
    pub fn registry(&self) -> &SchemaRegistry {
        self.validator.registry()
    }

    /// Row caps in effect.
    pub fn settings(&self) -> GuardConfig {
        self.settings
    }

    /// Runs one question through every stage.
    pub async fn run(
        &self,
        user_query: &str,
        generator: &CandidateGenerator,
        store: &dyn DatabaseClient,
    ) -> PipelineOutcome {
        enter(PipelineStage::Generating);
        let candidate = match generator.generate(user_query, self.registry()).await {
            Ok(sql) => sql,
            Err(e) => {
                warn!(error = %e, "Generator failed");
                return finish(PipelineOutcome::generator_failure(e.message().to_string()));
            }
        };

        enter(PipelineStage::Validating);
        let accepted = match self.validator.validate(&candidate) {
            ValidationVerdict::Accepted { sql } => sql,
            ValidationVerdict::Rejected(reason) => {
                warn!(reason = reason.code(), sql = %candidate, "Candidate SQL blocked");
                return finish(PipelineOutcome::failure(
                    candidate,
                    PipelineError::Rejected(reason),
                ));
            }
        };

        enter(PipelineStage::Rewriting);
        let rewritten = rewrite(&accepted, self.settings.default_row_limit);
        if rewritten != accepted {
            debug!(sql = %rewritten, "Row limit injected");
        }

        enter(PipelineStage::Executing);
        let executor = QueryExecutor::new(store, self.settings.max_result_rows);
        let outcome = match executor.execute(&rewritten).await {
            ExecutionResult::Rows(rows) => {
                info!(rows = rows.row_count, truncated = rows.was_truncated, "Query answered");
                PipelineOutcome::success(rewritten, rows)
            }
            ExecutionResult::Failure { message } => {
                warn!(error = %message, "Execution failed");
                PipelineOutcome::failure(rewritten, PipelineError::Execution(message))
            }
        };

        finish(outcome)
    }
}

fn enter(stage: PipelineStage) {
    debug!(%stage, "Pipeline stage");
}

fn finish(outcome: PipelineOutcome) -> PipelineOutcome {
    enter(PipelineStage::Done);
    outcome
}
