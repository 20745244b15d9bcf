//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on input patterns.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::{GuardError, Result};
use crate::llm::types::{last_user_content, Message};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Used for unit testing without making real API calls.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// When set, every call fails with this message.
    failure: Option<String>,
    calls: Arc<AtomicUsize>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock whose every call fails with `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Adds a custom response mapping.
    ///
    /// When the input contains `pattern`, the mock will return `response`.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Number of completions requested so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Generates a mock response based on the input.
    fn mock_response(&self, input: &str) -> String {
        let input_lower = input.to_lowercase();

        for (pattern, response) in &self.custom_responses {
            if input_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if input_lower.contains("how many") {
            return "```sql\nSELECT COUNT(*) FROM transactions;\n```".to_string();
        }

        if input_lower.contains("total") && input_lower.contains("per counterparty") {
            return "SELECT counterparty, SUM(amount) AS total_amount FROM transactions GROUP BY counterparty;"
                .to_string();
        }

        if input_lower.contains("largest") {
            return "SELECT * FROM transactions ORDER BY amount DESC LIMIT 5;".to_string();
        }

        if input_lower.contains("drop") || input_lower.contains("delete") {
            return "DROP TABLE transactions;".to_string();
        }

        if input_lower.contains("trades") {
            return "```sql\nSELECT * FROM transactions;\n```".to_string();
        }

        "I don't understand that question. Could you please rephrase it?".to_string()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = &self.failure {
            return Err(GuardError::llm(message.clone()));
        }

        let input = last_user_content(messages).unwrap_or_default();
        Ok(self.mock_response(input))
    }

    fn model(&self) -> &str {
        "mock"
    }
}
