//! Command-line argument parsing for txn-sqlguard.

use crate::config::Config;
use crate::output::OutputFormat;
use clap::Parser;
use std::path::PathBuf;

/// Ask questions about trades; only guarded, read-only SQL ever runs.
#[derive(Parser, Debug)]
#[command(name = "txn-sqlguard")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Natural-language question about the transactions table
    #[arg(value_name = "QUESTION")]
    pub question: Option<String>,

    /// Path to the SQLite transactions store
    #[arg(long, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Model identifier for the generator
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// LLM provider to use: openai or mock
    #[arg(long, value_name = "PROVIDER")]
    pub llm: Option<String>,

    /// Hard ceiling on rows returned
    #[arg(long, value_name = "N")]
    pub max_rows: Option<usize>,

    /// LIMIT appended to non-aggregate queries without one
    #[arg(long, value_name = "N")]
    pub default_limit: Option<usize>,

    /// Output format: text or json
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    pub output: String,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Write logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Create (or reset) the demo store at the configured path and exit
    #[arg(long)]
    pub seed_demo: bool,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config.clone().unwrap_or_else(Config::default_path)
    }

    /// Parses the `--output` value.
    pub fn output_format(&self) -> std::result::Result<OutputFormat, String> {
        self.output.parse()
    }

    /// Applies flag values on top of `config`. Flags take precedence over
    /// both the file and the environment.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(db) = &self.db {
            config.store.path = db.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(provider) = &self.llm {
            config.llm.provider = provider.clone();
        }
        if let Some(max_rows) = self.max_rows {
            config.guard.max_result_rows = max_rows;
        }
        if let Some(limit) = self.default_limit {
            config.guard.default_row_limit = limit;
        }
    }
}
