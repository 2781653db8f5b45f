//! Retry policy for probes that fail because of local resource exhaustion.
//!
//! Running out of file descriptors or ephemeral ports says nothing about the
//! target, so such failures are never recorded. The same probe is repeated
//! after a pause until it yields a definitive answer.

use crate::scanner::traits::{ProbeVerdict, Prober};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{trace, warn};

/// Default wait before repeating an exhausted probe.
pub const DEFAULT_RETRY_PAUSE: Duration = Duration::from_millis(500);

/// How long to back off before repeating an exhausted probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pause: Duration,
}

impl RetryPolicy {
    /// Create a policy with the given pause between attempts.
    pub const fn new(pause: Duration) -> Self {
        Self { pause }
    }

    /// Pause between attempts.
    pub const fn pause(&self) -> Duration {
        self.pause
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRY_PAUSE)
    }
}

/// Probe `host:port` until the answer is definitive.
///
/// Never gives up on local exhaustion; every other failure is a closed port.
pub async fn probe(
    prober: &dyn Prober,
    host: &str,
    port: u16,
    policy: &RetryPolicy,
) -> ProbeVerdict {
    let mut retries = 0u32;
    loop {
        match prober.attempt(host, port).await {
            Ok(evidence) => return ProbeVerdict::open(evidence).with_retries(retries),
            Err(err) if err.is_local_exhaustion() => {
                retries = retries.saturating_add(1);
                warn!(host, port, retries, error = %err, "local resources exhausted; retrying probe");
                sleep(policy.pause()).await;
            }
            Err(err) => {
                trace!(host, port, error = %err, "probe failed");
                return ProbeVerdict::closed().with_retries(retries);
            }
        }
    }
}
