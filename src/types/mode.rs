//! Scan mode selection.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a run probes, chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// Connect to every supplied host on every supplied port.
    Discovery,
    /// Connect to hosts previously seen open on every supplied port.
    KnownOpenRescan,
    /// Run the diagnostic tool against host:port pairs previously seen open.
    VulnRescan,
}

impl ScanMode {
    /// Select a mode from command-line inputs.
    ///
    /// `--vuln-scan` wins over supplied hosts and ports; `--known-open` only
    /// needs ports. Both rescan flags at once is a configuration error.
    pub fn from_flags(
        has_hosts: bool,
        has_ports: bool,
        known_open: bool,
        vuln_scan: bool,
    ) -> Result<Self, ConfigError> {
        match (known_open, vuln_scan) {
            (true, true) => Err(ConfigError::ConflictingModes),
            (false, true) => Ok(Self::VulnRescan),
            (true, false) if has_ports => Ok(Self::KnownOpenRescan),
            (false, false) if has_hosts && has_ports => Ok(Self::Discovery),
            _ => Err(ConfigError::MissingInputs),
        }
    }

    /// Whether probes in this mode run the diagnostic tool.
    pub fn is_diagnostic(self) -> bool {
        matches!(self, Self::VulnRescan)
    }

    /// Whether this mode reads its targets from previous results.
    pub fn uses_store(self) -> bool {
        !matches!(self, Self::Discovery)
    }

    /// Whether the supplied host list is consulted.
    pub fn uses_hosts(self) -> bool {
        matches!(self, Self::Discovery)
    }

    /// Whether the supplied port list is consulted.
    pub fn uses_ports(self) -> bool {
        !matches!(self, Self::VulnRescan)
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Discovery => write!(f, "discovery"),
            Self::KnownOpenRescan => write!(f, "known-open rescan"),
            Self::VulnRescan => write!(f, "vulnerability rescan"),
        }
    }
}
