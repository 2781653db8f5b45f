//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use super::OpenEndpoint;
use crate::scanner::RunReport;
use crate::types::ScanMode;
use console::style;
use std::io::{self, Write};
use std::path::Path;

/// Write endpoints as an aligned table.
pub fn write_plain<W: Write>(endpoints: &[OpenEndpoint], mut out: W) -> io::Result<()> {
    if endpoints.is_empty() {
        writeln!(out, "  {}", style("No open ports recorded.").dim())?;
        return Ok(());
    }

    let width = endpoints
        .iter()
        .map(|e| e.host.len())
        .max()
        .unwrap_or(0)
        .max("HOST".len());

    writeln!(
        out,
        "  {:<width$}  {:>5}",
        style("HOST").bold(),
        style("PORT").bold(),
    )?;
    for endpoint in endpoints {
        writeln!(
            out,
            "  {:<width$}  {:>5}",
            endpoint.host,
            style(endpoint.port).green()
        )?;
    }
    writeln!(out)?;
    writeln!(
        out,
        "  {} open endpoints",
        style(endpoints.len()).green().bold()
    )?;
    Ok(())
}

/// Print a header before scanning begins.
pub fn print_scan_header(mode: ScanMode, database: &Path) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("icescan").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{} Mode: {}", style("•").dim(), style(mode).yellow());
    println!(
        "{} Results: {}",
        style("•").dim(),
        style(database.display()).white().bold()
    );
    println!();
}

/// Print the totals of a finished run.
pub fn print_summary(report: &RunReport) {
    println!();
    println!(
        "{} {} probes across {} hosts in {:.2}s",
        style("Done:").cyan().bold(),
        report.stats.probes,
        report.stats.hosts,
        report.duration_ms as f64 / 1000.0
    );
    println!(
        "      {} open, {} recorded, {} retries",
        style(report.stats.open).green().bold(),
        report.sink.persisted,
        style(report.stats.retries).yellow()
    );
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoint(host: &str, port: u16) -> OpenEndpoint {
        OpenEndpoint {
            host: host.to_string(),
            port,
        }
    }

    #[test]
    fn test_plain_table() {
        let mut buf = Vec::new();
        write_plain(
            &[endpoint("10.0.0.1", 22), endpoint("gateway.lan", 8443)],
            &mut buf,
        )
        .unwrap();

        let text = console::strip_ansi_codes(&String::from_utf8(buf).unwrap()).to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[0].contains("HOST"));
        assert!(lines[1].starts_with("  10.0.0.1"));
        assert!(lines[1].ends_with("22"));
        assert!(lines[2].contains("gateway.lan"));
        assert!(text.contains("2 open endpoints"));
    }

    #[test]
    fn test_plain_empty() {
        let mut buf = Vec::new();
        write_plain(&[], &mut buf).unwrap();
        let text = console::strip_ansi_codes(&String::from_utf8(buf).unwrap()).to_string();
        assert!(text.contains("No open ports recorded."));
    }
}
