//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV listings of open
//! endpoints, plus the console messages printed around a scan.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::write_csv;
pub use json_format::write_json;
pub use plain::{print_error, print_scan_header, print_summary, write_plain};

use crate::cli::OutputFormat;
use crate::error::CliResult;
use serde::Serialize;
use std::io::Write;

/// A host:port pair recorded open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OpenEndpoint {
    pub host: String,
    pub port: u16,
}

impl From<(String, u16)> for OpenEndpoint {
    fn from((host, port): (String, u16)) -> Self {
        Self { host, port }
    }
}

/// Write `endpoints` to `out` in `format`.
pub fn render<W: Write>(endpoints: &[OpenEndpoint], format: OutputFormat, out: W) -> CliResult<()> {
    match format {
        OutputFormat::Plain => write_plain(endpoints, out)?,
        OutputFormat::Json => write_json(endpoints, out)?,
        OutputFormat::Csv => write_csv(endpoints, out)?,
    }
    Ok(())
}
