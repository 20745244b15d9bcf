//! Candidate SQL generator.
//!
//! Wraps an LLM client: builds the prompt for the question, makes exactly one
//! completion call and cleans the response into candidate SQL.

use std::sync::Arc;

use tracing::debug;

use crate::db::SchemaRegistry;
use crate::error::Result;
use crate::llm::{build_messages, extract_candidate_sql, LlmClient};

/// Generates candidate SQL for natural-language questions.
#[derive(Clone)]
pub struct CandidateGenerator {
    client: Arc<dyn LlmClient>,
}

impl std::fmt::Debug for CandidateGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CandidateGenerator")
            .field("model", &self.client.model())
            .finish()
    }
}

impl CandidateGenerator {
    /// Creates a generator over a shared client.
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    /// Creates a generator that owns `client`.
    pub fn from_client(client: Box<dyn LlmClient>) -> Self {
        Self {
            client: Arc::from(client),
        }
    }

    /// Model identifier used for generation.
    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Returns cleaned candidate SQL for `user_query`.
    ///
    /// The text is untrusted and may not be SQL at all.
    pub async fn generate(&self, user_query: &str, registry: &SchemaRegistry) -> Result<String> {
        let messages = build_messages(registry, user_query);
        let raw = self.client.complete(&messages).await?;
        let candidate = extract_candidate_sql(&raw);

        debug!(model = %self.model(), raw_len = raw.len(), candidate = %candidate, "Generated candidate SQL");
        Ok(candidate)
    }
}
