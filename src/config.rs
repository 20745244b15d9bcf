//! Configuration management for txn-sqlguard.
//!
//! Handles loading configuration from a TOML file and environment variables.
//! The resulting value is immutable once the pipeline is built; CLI flags are
//! applied on top by the binary before that point.

use crate::error::{GuardError, Result};
use crate::safety::DEFAULT_ROW_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding `store.path`.
pub const DB_PATH_ENV: &str = "TXN_SQLGUARD_DB";

/// Environment variable overriding `llm.model`.
pub const MODEL_ENV: &str = "TXN_SQLGUARD_MODEL";

/// Main configuration structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Generator settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Row caps applied by the pipeline.
    #[serde(default)]
    pub guard: GuardConfig,

    /// Transactions store settings.
    #[serde(default)]
    pub store: StoreConfig,
}

/// LLM provider configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmConfig {
    /// LLM provider: "openai" or "mock".
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Model identifier passed to the provider.
    #[serde(default = "default_model")]
    pub model: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion token cap.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

fn default_provider() -> String {
    "openai".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_llm_timeout() -> u64 {
    30
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    200
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            timeout_secs: default_llm_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Row caps. Both must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardConfig {
    /// LIMIT appended to non-aggregate statements that have none.
    #[serde(default = "default_row_limit")]
    pub default_row_limit: usize,

    /// Hard ceiling on rows returned to the caller.
    #[serde(default = "default_max_result_rows")]
    pub max_result_rows: usize,
}

fn default_row_limit() -> usize {
    DEFAULT_ROW_LIMIT
}

fn default_max_result_rows() -> usize {
    100
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            default_row_limit: default_row_limit(),
            max_result_rows: default_max_result_rows(),
        }
    }
}

/// Transactions store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path to the SQLite file.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Per-statement timeout in seconds.
    #[serde(default = "default_statement_timeout")]
    pub statement_timeout_secs: u64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("data").join("transactions.db")
}

fn default_statement_timeout() -> u64 {
    30
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            statement_timeout_secs: default_statement_timeout(),
        }
    }
}

impl StoreConfig {
    /// Creates a store config for `path` with the default timeout.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("txn-sqlguard")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file. A missing file yields defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| GuardError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            GuardError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }

    /// Applies `TXN_SQLGUARD_DB` and `TXN_SQLGUARD_MODEL` from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_with(|key| std::env::var(key).ok());
    }

    /// Applies overrides from an arbitrary variable lookup. Empty values are ignored.
    pub fn apply_overrides_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = value(DB_PATH_ENV) {
            self.store.path = PathBuf::from(path);
        }
        if let Some(model) = value(MODEL_ENV) {
            self.llm.model = model;
        }
    }

    /// Checks that limits and timeouts are usable.
    pub fn validate(&self) -> Result<()> {
        if self.guard.default_row_limit == 0 {
            return Err(GuardError::config("guard.default_row_limit must be positive"));
        }
        if self.guard.max_result_rows == 0 {
            return Err(GuardError::config("guard.max_result_rows must be positive"));
        }
        if self.store.statement_timeout_secs == 0 {
            return Err(GuardError::config(
                "store.statement_timeout_secs must be positive",
            ));
        }
        if self.llm.timeout_secs == 0 {
            return Err(GuardError::config("llm.timeout_secs must be positive"));
        }
        if self.llm.model.trim().is_empty() {
            return Err(GuardError::config("llm.model must not be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use tempfile::tempdir;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
[llm]
provider = "mock"
model = "gpt-4o"
temperature = 0.0
max_tokens = 120

[guard]
default_row_limit = 50
max_result_rows = 500

[store]
path = "/var/lib/txn/transactions.db"
statement_timeout_secs = 5
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.llm.provider, "mock");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.temperature, 0.0);
        assert_eq!(config.llm.max_tokens, 120);
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.guard.default_row_limit, 50);
        assert_eq!(config.guard.max_result_rows, 500);
        assert_eq!(
            config.store.path,
            PathBuf::from("/var/lib/txn/transactions.db")
        );
        assert_eq!(config.store.statement_timeout_secs, 5);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[guard]\nmax_result_rows = 10\n").unwrap();

        assert_eq!(config.guard.max_result_rows, 10);
        assert_eq!(config.guard.default_row_limit, 100);
        assert_eq!(config.llm, LlmConfig::default());
        assert_eq!(config.store, StoreConfig::default());
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "openai");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.llm.max_tokens, 200);
        assert_eq!(config.guard.default_row_limit, 100);
        assert_eq!(config.guard.max_result_rows, 100);
        assert_eq!(config.store.path, PathBuf::from("data/transactions.db"));
        assert_eq!(config.store.statement_timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from_file(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_invalid_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[guard]\nmax_result_rows = \"many\"\n").unwrap();

        let err = Config::load_from_file(&path).unwrap_err();
        assert!(matches!(err, GuardError::Config(_)));
        assert!(err.to_string().contains("config.toml"));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (DB_PATH_ENV, "/tmp/other.db"),
            (MODEL_ENV, "gpt-4o"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_overrides_with(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.store.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(config.llm.model, "gpt-4o");
    }

    #[test]
    fn test_empty_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_overrides_with(|_| Some("  ".to_string()));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = Config::default();
        config.guard.default_row_limit = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.guard.max_result_rows = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.store.statement_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_path() {
        let path = Config::default_path();
        assert!(path.ends_with("txn-sqlguard/config.toml"));
    }

    #[test]
    fn test_store_config_at() {
        let store = StoreConfig::at("/data/t.db");
        assert_eq!(store.path, PathBuf::from("/data/t.db"));
        assert_eq!(store.statement_timeout_secs, 30);
    }
}
