//! Configuration loading from disk.

use std::path::PathBuf;

use txn_sqlguard::cli::Cli;
use txn_sqlguard::config::Config;

use clap::Parser;

#[test]
fn test_file_then_flags_precedence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
[llm]
provider = "mock"
model = "from-file"

[guard]
max_result_rows = 40

[store]
path = "file.db"
"#,
    )
    .unwrap();

    let mut config = Config::load_from_file(&path).unwrap();
    let cli = Cli::parse_from(["txn-sqlguard", "--max-rows", "7", "question"]);
    cli.apply_to(&mut config);

    assert_eq!(config.llm.provider, "mock");
    assert_eq!(config.llm.model, "from-file");
    assert_eq!(config.guard.max_result_rows, 7);
    assert_eq!(config.guard.default_row_limit, 100);
    assert_eq!(config.store.path, PathBuf::from("file.db"));
    assert!(config.validate().is_ok());
}

#[test]
fn test_zero_ceiling_from_flag_is_rejected() {
    let mut config = Config::default();
    let cli = Cli::parse_from(["txn-sqlguard", "--max-rows", "0", "question"]);
    cli.apply_to(&mut config);

    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("max_result_rows"));
}
