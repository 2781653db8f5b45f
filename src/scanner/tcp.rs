//! TCP connect prober.
//!
//! Performs a standard TCP connect using the operating system's socket API.
//! A completed handshake means open; anything else means closed.

use crate::error::ProbeError;
use crate::scanner::traits::{ProbeMode, Prober};
use async_trait::async_trait;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Default bound on one connection attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Connectivity prober.
///
/// Hostnames are resolved as part of the attempt, inside the same timeout.
#[derive(Debug, Clone)]
pub struct TcpConnectProber {
    timeout: Duration,
}

impl TcpConnectProber {
    /// Create a prober with the given per-attempt timeout.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// The per-attempt timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn attempt_connect(&self, host: &str, port: u16) -> Result<TcpStream, ProbeError> {
        match timeout(self.timeout, TcpStream::connect((host, port))).await {
            Ok(Ok(stream)) => Ok(stream),
            Ok(Err(source)) => Err(ProbeError::Connect {
                target: host.to_string(),
                port,
                source,
            }),
            Err(_) => Err(ProbeError::Timeout {
                target: host.to_string(),
                port,
                timeout: self.timeout,
            }),
        }
    }
}

impl Default for TcpConnectProber {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

#[async_trait]
impl Prober for TcpConnectProber {
    fn mode(&self) -> ProbeMode {
        ProbeMode::Connectivity
    }

    async fn attempt(&self, host: &str, port: u16) -> Result<Option<String>, ProbeError> {
        let stream = self.attempt_connect(host, port).await?;
        drop(stream);
        Ok(None)
    }
}
