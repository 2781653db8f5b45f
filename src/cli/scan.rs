//! Scan subcommand implementation.
//!
//! Handles `icescan scan`: mode selection, target expansion and the run
//! itself.

use crate::config::Settings;
use crate::error::{CliError, CliResult};
use crate::output;
use crate::scanner::{self, create_prober, ScanRequest};
use crate::storage::SqliteStore;
use crate::types::{expand_hosts, expand_ports, HostList, PortList, ScanMode};
use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Probe targets and record every outcome.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// File of host specs, one per line (hostname, IP, or IPv4 CIDR)
    #[arg(short = 'H', long, value_name = "FILE")]
    pub hosts: Option<PathBuf>,

    /// File of port specs, one per line (e.g. "22" or "8000-8100")
    #[arg(short, long, value_name = "FILE")]
    pub ports: Option<PathBuf>,

    /// Re-probe hosts previously recorded open on the given ports
    #[arg(long)]
    pub known_open: bool,

    /// Run the vulnerability scripts against every pair recorded open
    #[arg(long)]
    pub vuln_scan: bool,

    /// Maximum number of hosts scanned at once
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Connection timeout in milliseconds
    #[arg(short = 't', long, value_name = "MS")]
    pub timeout: Option<u64>,

    /// Minimum delay between ports on one host, in milliseconds
    #[arg(long, value_name = "MS")]
    pub min_delay: Option<u64>,

    /// Maximum delay between ports on one host, in milliseconds
    #[arg(long, value_name = "MS")]
    pub max_delay: Option<u64>,

    /// Pause before retrying when local sockets run out, in milliseconds
    #[arg(long, value_name = "MS")]
    pub retry_pause: Option<u64>,

    /// Path to the nmap executable used by --vuln-scan
    #[arg(long, value_name = "PATH")]
    pub nmap: Option<PathBuf>,

    /// Draw a progress bar instead of logging progress lines
    #[arg(long)]
    pub progress: bool,
}

impl ScanCommand {
    /// Execute the scan command.
    pub async fn execute(&self, settings: Settings, quiet: bool) -> CliResult<()> {
        let mode = ScanMode::from_flags(
            self.hosts.is_some(),
            self.ports.is_some(),
            self.known_open,
            self.vuln_scan,
        )?;

        let settings = self.apply_overrides(settings);
        let mut config = settings.scheduler_config(mode)?;
        if self.progress && !quiet {
            config = config.with_progress_bar();
        }

        self.warn_ignored(mode);
        let hosts = match self.hosts {
            Some(ref path) if mode.uses_hosts() => load_hosts(path)?,
            _ => HostList::new(),
        };
        let ports = match self.ports {
            Some(ref path) if mode.uses_ports() => load_ports(path)?,
            _ => PortList::new(),
        };
        if mode.uses_hosts() {
            info!(hosts = hosts.len(), ports = ports.len(), "expanded targets");
        }

        let store = SqliteStore::open(&settings.database)?;
        let prober = create_prober(mode, &settings);

        if !quiet {
            output::print_scan_header(mode, &settings.database);
        }

        let request = ScanRequest { mode, hosts, ports };
        let report = scanner::execute(request, store, prober, &config).await?;

        if !quiet {
            output::print_summary(&report);
        }
        Ok(())
    }

    fn apply_overrides(&self, mut settings: Settings) -> Settings {
        if let Some(concurrency) = self.concurrency {
            settings.concurrency = concurrency;
        }
        if let Some(timeout) = self.timeout {
            settings.connect_timeout_ms = timeout;
        }
        if let Some(min) = self.min_delay {
            settings.min_delay_ms = min;
        }
        if let Some(max) = self.max_delay {
            settings.max_delay_ms = max;
        }
        if let Some(pause) = self.retry_pause {
            settings.retry_pause_ms = pause;
        }
        if let Some(ref nmap) = self.nmap {
            settings.nmap_path = nmap.clone();
        }
        settings
    }

    fn warn_ignored(&self, mode: ScanMode) {
        if self.hosts.is_some() && !mode.uses_hosts() {
            warn!(%mode, "--hosts is ignored; targets come from previous results");
        }
        if self.ports.is_some() && !mode.uses_ports() {
            warn!(%mode, "--ports is ignored; ports come from previous results");
        }
    }
}

fn read_input(path: &Path) -> CliResult<String> {
    fs::read_to_string(path).map_err(|source| CliError::Input {
        path: path.to_path_buf(),
        source,
    })
}

fn load_hosts(path: &Path) -> CliResult<HostList> {
    let content = read_input(path)?;
    Ok(expand_hosts(content.lines())?)
}

fn load_ports(path: &Path) -> CliResult<PortList> {
    let content = read_input(path)?;
    Ok(expand_ports(content.lines())?)
}
