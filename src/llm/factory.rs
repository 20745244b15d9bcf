//! LLM client factory.
//!
//! Centralizes provider-specific logic for creating LLM clients.

use crate::config::LlmConfig;
use crate::error::{GuardError, Result};
use crate::llm::{LlmClient, LlmProvider, MockLlmClient, OpenAiClient, OpenAiConfig};

/// Environment variable holding the OpenAI API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Creates an LLM client for the given provider.
///
/// For OpenAI the key is resolved from `api_key`, then `OPENAI_API_KEY`.
/// Model, timeout and sampling parameters come from `config`.
pub fn create_client(
    provider: LlmProvider,
    config: &LlmConfig,
    api_key: Option<String>,
) -> Result<Box<dyn LlmClient>> {
    match provider {
        LlmProvider::OpenAi => {
            let non_blank = |key: &String| !key.trim().is_empty();
            let key = api_key
                .filter(non_blank)
                .or_else(|| std::env::var(OPENAI_API_KEY_ENV).ok().filter(non_blank))
                .ok_or_else(|| {
                    GuardError::llm(format!(
                        "No API key configured. Set {OPENAI_API_KEY_ENV} or use --llm mock."
                    ))
                })?;
            Ok(Box::new(OpenAiClient::new(OpenAiConfig::from_llm_config(
                key, config,
            ))?))
        }
        LlmProvider::Mock => Ok(Box::new(MockLlmClient::new())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_mock_client() {
        let client = create_client(LlmProvider::Mock, &LlmConfig::default(), None).unwrap();
        assert_eq!(client.model(), "mock");
    }

    #[test]
    fn test_create_openai_with_provided_key() {
        let config = LlmConfig {
            model: "gpt-4o".to_string(),
            ..LlmConfig::default()
        };
        let client =
            create_client(LlmProvider::OpenAi, &config, Some("test-key".to_string())).unwrap();
        assert_eq!(client.model(), "gpt-4o");
    }

    #[test]
    fn test_create_openai_with_blank_key_fails() {
        let result = create_client(
            LlmProvider::OpenAi,
            &LlmConfig::default(),
            Some("   ".to_string()),
        );
        // A blank explicit key falls through to the environment, which may
        // hold a real key on a developer machine.
        if std::env::var(OPENAI_API_KEY_ENV).map_or(true, |k| k.trim().is_empty()) {
            let err = result.err().unwrap();
            assert!(err.to_string().contains("No API key configured"));
        }
    }
}
