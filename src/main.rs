//! txn-sqlguard - ask questions about trades in plain language.

use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use txn_sqlguard::cli::Cli;
use txn_sqlguard::config::Config;
use txn_sqlguard::db::{self, seed_demo_store, SchemaRegistry, SeedOptions};
use txn_sqlguard::error::{GuardError, Result};
use txn_sqlguard::llm::{create_client, CandidateGenerator, LlmProvider};
use txn_sqlguard::logging::{init_file_logging, init_stderr_logging};
use txn_sqlguard::output::render;
use txn_sqlguard::pipeline::Pipeline;

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse_args();

    match &cli.log_file {
        Some(path) => init_file_logging(path),
        None => init_stderr_logging(),
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}: {}", e.category(), e);
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(&cli)?;

    if cli.seed_demo {
        let rows = seed_demo_store(&config.store.path, &SeedOptions::default()).await?;
        println!(
            "Seeded {} with {} trades.",
            config.store.path.display(),
            rows
        );
        return Ok(ExitCode::SUCCESS);
    }

    let question = cli
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| GuardError::config("A question is required (or use --seed-demo)."))?;
    let format = cli.output_format().map_err(GuardError::config)?;

    let store = db::connect(&config.store).await?;
    info!(store = %store.describe(), "Store ready");

    let provider: LlmProvider = config.llm.provider.parse().map_err(GuardError::config)?;
    let generator = CandidateGenerator::from_client(create_client(provider, &config.llm, None)?);

    let pipeline = Pipeline::new(Arc::new(SchemaRegistry::transactions()), config.guard);
    let outcome = pipeline.run(question, &generator, store.as_ref()).await;

    println!("{}", render(&outcome, format));

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Resolves configuration with precedence: flags, environment, file, defaults.
fn load_config(cli: &Cli) -> Result<Config> {
    let config_path = cli.config_path();
    info!("Loading config from: {}", config_path.display());

    let mut config = Config::load_from_file(&config_path)?;
    config.apply_env_overrides();
    cli.apply_to(&mut config);
    config.validate()?;

    Ok(config)
}
