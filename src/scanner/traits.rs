//! Prober trait abstraction.
//!
//! A prober makes one attempt at one host:port. Retrying and classifying
//! failures is left to [`probe`](super::retry::probe), so that connectivity
//! and diagnostic probers share the same policy.

use crate::error::ProbeError;
use crate::types::ScanOutcome;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How a probe decides open/closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeMode {
    /// Bare TCP connection attempt.
    Connectivity,
    /// External tool run producing evidence text.
    Diagnostic,
}

impl fmt::Display for ProbeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connectivity => write!(f, "TCP connect"),
            Self::Diagnostic => write!(f, "diagnostic"),
        }
    }
}

/// Definitive answer for one host:port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeVerdict {
    /// Whether the port is considered open.
    pub open: bool,
    /// Evidence captured on success (diagnostic probes only).
    pub evidence: Option<String>,
    /// Attempts repeated because of local resource exhaustion.
    pub retries: u32,
}

impl ProbeVerdict {
    /// An open verdict.
    pub fn open(evidence: Option<String>) -> Self {
        Self {
            open: true,
            evidence,
            retries: 0,
        }
    }

    /// A closed verdict.
    pub fn closed() -> Self {
        Self {
            open: false,
            evidence: None,
            retries: 0,
        }
    }

    /// Record how many retries it took to reach this verdict.
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Turn the verdict into the outcome record for `host:port`.
    pub fn into_outcome(self, host: &str, port: u16) -> ScanOutcome {
        ScanOutcome::now(host, port, self.open).with_diagnostic(self.evidence)
    }
}

/// Trait for single-attempt probe implementations.
///
/// `Ok` means the probe succeeded and the port is open; the payload is any
/// evidence captured. `Err` is inspected by the retry policy.
#[async_trait]
pub trait Prober: Send + Sync {
    /// How this prober classifies ports.
    fn mode(&self) -> ProbeMode;

    /// Make one attempt against `host:port`.
    async fn attempt(&self, host: &str, port: u16) -> Result<Option<String>, ProbeError>;
}

/// A prober shared by every host task.
pub type SharedProber = Arc<dyn Prober>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_mode_display() {
        assert_eq!(ProbeMode::Connectivity.to_string(), "TCP connect");
        assert_eq!(ProbeMode::Diagnostic.to_string(), "diagnostic");
    }

    #[test]
    fn test_verdict_into_outcome() {
        let outcome = ProbeVerdict::open(Some("report".into()))
            .with_retries(2)
            .into_outcome("10.0.0.7", 8443);
        assert!(outcome.open);
        assert_eq!(outcome.host, "10.0.0.7");
        assert_eq!(outcome.port, 8443);
        assert_eq!(outcome.diagnostic.as_deref(), Some("report"));

        let outcome = ProbeVerdict::closed().into_outcome("10.0.0.7", 1);
        assert!(!outcome.open);
        assert_eq!(outcome.diagnostic, None);
    }
}
