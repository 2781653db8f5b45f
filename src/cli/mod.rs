//! CLI subcommand definitions and handlers.
//!
//! - `icescan scan` - probe targets and record the outcomes
//! - `icescan report` - list host:port pairs recorded open

mod report;
mod scan;

pub use report::ReportCommand;
pub use scan::ScanCommand;

use crate::config::Settings;
use crate::error::CliResult;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// icescan - a concurrent TCP reconnaissance scanner.
///
/// Finds which host:port combinations accept connections, re-probes hosts
/// seen open before, and runs vulnerability scripts against known-open
/// ports. Every outcome is stored in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "icescan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A concurrent TCP reconnaissance scanner", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to a JSON settings file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Results database (overrides the settings file)
    #[arg(long, global = true, value_name = "PATH", env = "ICESCAN_DB")]
    pub db: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Probe targets and record every outcome
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// List host:port pairs recorded open
    #[command(alias = "r")]
    Report(ReportCommand),
}

impl Cli {
    /// Default log filter when `RUST_LOG` is unset.
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }

    /// Load settings and apply the global overrides.
    pub fn settings(&self) -> CliResult<Settings> {
        let mut settings = Settings::load(self.config.as_deref())?;
        if let Some(ref db) = self.db {
            settings.database = db.clone();
        }
        Ok(settings)
    }

    /// Run the selected subcommand.
    pub async fn run(self) -> CliResult<()> {
        let settings = self.settings()?;
        match self.command {
            Commands::Scan(ref cmd) => cmd.execute(settings, self.quiet).await,
            Commands::Report(ref cmd) => cmd.execute(&settings),
        }
    }
}

/// Output format for reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    #[default]
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        let cli = Cli::try_parse_from(["icescan", "report"]).unwrap();
        assert_eq!(cli.log_level(), "info");

        let cli = Cli::try_parse_from(["icescan", "-vv", "report"]).unwrap();
        assert_eq!(cli.log_level(), "trace");

        let cli = Cli::try_parse_from(["icescan", "report", "-q"]).unwrap();
        assert_eq!(cli.log_level(), "warn");
    }

    #[test]
    fn test_db_override() {
        let cli = Cli::try_parse_from([
            "icescan",
            "--config",
            "/nonexistent/icescan.json",
            "report",
        ])
        .unwrap();
        assert!(cli.settings().is_err());

        let cli = Cli::try_parse_from(["icescan", "--db", "other.db", "report"]).unwrap();
        assert_eq!(cli.settings().unwrap().database, PathBuf::from("other.db"));
    }

    #[test]
    fn test_scan_flags_parse() {
        let cli = Cli::try_parse_from([
            "icescan", "scan", "-H", "hosts.txt", "-p", "ports.txt", "-c", "8",
        ])
        .unwrap();
        match cli.command {
            Commands::Scan(cmd) => {
                assert_eq!(cmd.hosts, Some(PathBuf::from("hosts.txt")));
                assert_eq!(cmd.concurrency, Some(8));
                assert!(!cmd.known_open);
            }
            Commands::Report(_) => panic!("expected scan"),
        }
    }
}
