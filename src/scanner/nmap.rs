//! Diagnostic prober backed by an external vulnerability scanner.
//!
//! The tool runs once per host:port as an isolated subprocess. A zero exit
//! status is taken as "open" and its stdout kept as evidence. A failure to
//! run is taken as "closed", which is only an approximation: the tool can
//! fail for reasons unrelated to the port.

use crate::error::ProbeError;
use crate::scanner::traits::{ProbeMode, Prober};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// Where nmap is expected to live.
pub const DEFAULT_NMAP_PATH: &str = "/usr/bin/nmap";

/// Vulnerability scripts at a polite timing template.
pub const DEFAULT_NMAP_ARGS: &[&str] = &["--script", "vuln", "-T2"];

/// Runs `<program> <args..> <host> -p <port>` and captures its report.
#[derive(Debug, Clone)]
pub struct NmapProber {
    program: PathBuf,
    args: Vec<String>,
}

impl NmapProber {
    /// Create a prober for `program` with extra leading `args`.
    pub fn new(program: impl Into<PathBuf>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    fn tool_name(&self) -> String {
        self.program.display().to_string()
    }

    fn command(&self, host: &str, port: u16) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .arg(host)
            .arg("-p")
            .arg(port.to_string())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

impl Default for NmapProber {
    fn default() -> Self {
        Self::new(
            DEFAULT_NMAP_PATH,
            DEFAULT_NMAP_ARGS.iter().map(|a| a.to_string()).collect(),
        )
    }
}

#[async_trait]
impl Prober for NmapProber {
    fn mode(&self) -> ProbeMode {
        ProbeMode::Diagnostic
    }

    async fn attempt(&self, host: &str, port: u16) -> Result<Option<String>, ProbeError> {
        let output = self
            .command(host, port)
            .output()
            .await
            .map_err(|source| ProbeError::Spawn {
                tool: self.tool_name(),
                source,
            })?;

        if !output.status.success() {
            return Err(ProbeError::ToolExit {
                tool: self.tool_name(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }
}
