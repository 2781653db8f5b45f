//! Argument handling through the public CLI types.

use clap::Parser;
use icescan::cli::Cli;
use icescan::error::{CliError, ConfigError};
use std::io::Write;

#[tokio::test]
async fn conflicting_rescan_flags_exit_with_usage() {
    let cli = Cli::try_parse_from(["icescan", "scan", "--known-open", "--vuln-scan"]).unwrap();
    let err = cli.run().await.unwrap_err();

    assert!(matches!(err, CliError::Config(ConfigError::ConflictingModes)));
    assert!(err.wants_usage());
    assert_eq!(err.exit_code(), 2);
}

#[tokio::test]
async fn malformed_host_file_aborts_before_scanning() {
    let dir = tempfile::tempdir().unwrap();
    let hosts = dir.path().join("hosts.txt");
    let ports = dir.path().join("ports.txt");
    let database = dir.path().join("scan.db");
    writeln!(std::fs::File::create(&hosts).unwrap(), "10.0.0.1\n10.0.0.0/8/8").unwrap();
    writeln!(std::fs::File::create(&ports).unwrap(), "80").unwrap();

    let cli = Cli::try_parse_from([
        "icescan",
        "-q",
        "--db",
        database.to_str().unwrap(),
        "scan",
        "-H",
        hosts.to_str().unwrap(),
        "-p",
        ports.to_str().unwrap(),
    ])
    .unwrap();
    let err = cli.run().await.unwrap_err();

    assert!(matches!(err, CliError::Target(_)));
    assert_eq!(err.exit_code(), 1);
    assert!(!database.exists());
}

#[tokio::test]
async fn report_lists_nothing_after_empty_discovery() {
    let dir = tempfile::tempdir().unwrap();
    let hosts = dir.path().join("hosts.txt");
    let ports = dir.path().join("ports.txt");
    let database = dir.path().join("scan.db");
    let output = dir.path().join("open.json");
    writeln!(std::fs::File::create(&hosts).unwrap(), "# nothing to scan").unwrap();
    writeln!(std::fs::File::create(&ports).unwrap(), "1-3").unwrap();

    let db = database.to_str().unwrap();
    Cli::try_parse_from([
        "icescan",
        "-q",
        "--db",
        db,
        "scan",
        "-H",
        hosts.to_str().unwrap(),
        "-p",
        ports.to_str().unwrap(),
    ])
    .unwrap()
    .run()
    .await
    .unwrap();

    Cli::try_parse_from([
        "icescan",
        "--db",
        db,
        "report",
        "-f",
        "json",
        "-o",
        output.to_str().unwrap(),
    ])
    .unwrap()
    .run()
    .await
    .unwrap();

    assert_eq!(std::fs::read_to_string(output).unwrap(), "[]\n");
}
