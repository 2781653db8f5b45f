//! Report subcommand implementation.
//!
//! Handles `icescan report`, listing every host:port pair recorded open.

use crate::cli::OutputFormat;
use crate::config::Settings;
use crate::error::CliResult;
use crate::output::{self, OpenEndpoint};
use crate::storage::{ResultStore, SqliteStore};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

/// List host:port pairs recorded open.
#[derive(Parser, Debug)]
pub struct ReportCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,

    /// Output file path (prints to stdout if not specified)
    #[arg(short = 'o', long = "output")]
    pub output_file: Option<PathBuf>,
}

impl ReportCommand {
    /// Execute the report command.
    pub fn execute(&self, settings: &Settings) -> CliResult<()> {
        let store = SqliteStore::open(&settings.database)?;
        let endpoints: Vec<OpenEndpoint> = store
            .open_endpoints()?
            .into_iter()
            .map(OpenEndpoint::from)
            .collect();

        match self.output_file {
            Some(ref path) => {
                let mut out = BufWriter::new(File::create(path)?);
                output::render(&endpoints, self.format, &mut out)?;
                out.flush()?;
            }
            None => {
                let stdout = io::stdout();
                let mut out = stdout.lock();
                output::render(&endpoints, self.format, &mut out)?;
                out.flush()?;
            }
        }
        Ok(())
    }
}
