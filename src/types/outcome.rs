//! The record produced by every dispatched probe.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of probing one host:port combination.
///
/// Created exactly once per dispatched probe and moved, never shared, from
/// the host task to the result sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    /// Host as it was probed (IP address or hostname).
    pub host: String,
    /// Port that was probed.
    pub port: u16,
    /// When the definitive answer was obtained.
    pub timestamp: DateTime<Utc>,
    /// Whether the port accepted the probe.
    pub open: bool,
    /// Evidence captured by a diagnostic probe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl ScanOutcome {
    /// Create an outcome stamped with the current time.
    pub fn now(host: impl Into<String>, port: u16, open: bool) -> Self {
        Self {
            host: host.into(),
            port,
            timestamp: Utc::now(),
            open,
            diagnostic: None,
        }
    }

    /// Attach diagnostic evidence.
    pub fn with_diagnostic(mut self, diagnostic: Option<String>) -> Self {
        self.diagnostic = diagnostic;
        self
    }

    /// `host:port`, bracketing IPv6 literals.
    pub fn endpoint(&self) -> String {
        if self.host.contains(':') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for ScanOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.open { "open" } else { "closed" };
        write!(f, "{} {} at {}", self.endpoint(), state, self.timestamp.to_rfc3339())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_display() {
        let outcome = ScanOutcome::now("10.0.0.1", 22, true);
        assert!(outcome.to_string().starts_with("10.0.0.1:22 open at "));
        assert_eq!(outcome.diagnostic, None);
    }

    #[test]
    fn test_ipv6_endpoint() {
        let outcome = ScanOutcome::now("::1", 443, false);
        assert_eq!(outcome.endpoint(), "[::1]:443");
    }

    #[test]
    fn test_zero_valued_outcome_is_ordinary_data() {
        let outcome = ScanOutcome {
            host: String::new(),
            port: 0,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            open: false,
            diagnostic: None,
        };
        let json = serde_json::to_string(&outcome).unwrap();
        let parsed: ScanOutcome = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, outcome);
    }
}
