//! Scanner module - coordinates probing, scheduling and result persistence.
//!
//! [`execute`] wires one run together: it plans the job against the store,
//! hands the store to the single result sink, and dispatches host units
//! through the scheduler.

pub mod nmap;
pub mod pacing;
pub mod progress;
pub mod retry;
pub mod scheduler;
pub mod tcp;
pub mod traits;

use crate::config::Settings;
use crate::error::{ScanError, ScanResult};
use crate::storage::{ResultSink, ResultStore, SinkReport};
use crate::types::{HostList, PortList, ScanMode};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub use nmap::NmapProber;
pub use pacing::Pacing;
pub use retry::{probe, RetryPolicy};
pub use scheduler::{run_scan, HostUnit, ScanJob, ScanStats, SchedulerConfig};
pub use tcp::TcpConnectProber;
pub use traits::{ProbeMode, ProbeVerdict, Prober, SharedProber};

/// Inputs for one run.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub mode: ScanMode,
    pub hosts: HostList,
    pub ports: PortList,
}

/// Summary of a finished run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub mode: ScanMode,
    pub stats: ScanStats,
    pub sink: SinkReport,
    pub duration_ms: u64,
}

/// Build the prober `mode` calls for.
pub fn create_prober(mode: ScanMode, settings: &Settings) -> SharedProber {
    if mode.is_diagnostic() {
        Arc::new(NmapProber::new(
            settings.nmap_path.clone(),
            settings.nmap_args.clone(),
        ))
    } else {
        Arc::new(TcpConnectProber::new(settings.connect_timeout()))
    }
}

/// Run a complete scan.
///
/// The store is read once to plan the job and then moved into the sink,
/// which is its only writer for the rest of the run. A sink failure is
/// reported in preference to a scheduler failure, since it is usually the
/// cause.
pub async fn execute<S>(
    request: ScanRequest,
    mut store: S,
    prober: SharedProber,
    config: &SchedulerConfig,
) -> ScanResult<RunReport>
where
    S: ResultStore + 'static,
{
    let start_time = Instant::now();
    let ScanRequest { mode, hosts, ports } = request;

    store.ensure_schema()?;
    let mut job = ScanJob::plan(mode, hosts, ports, &store)?;
    if job.is_empty() && mode.uses_store() {
        warn!(%mode, "no previously open targets recorded; nothing to rescan");
    }

    {
        let mut rng = rand::thread_rng();
        job.shuffle(&mut rng);
    }

    info!(
        %mode,
        probe = %prober.mode(),
        hosts = job.host_count(),
        probes = job.probe_count(),
        concurrency = config.concurrency,
        "starting scan"
    );

    let (tx, rx) = mpsc::channel(config.concurrency.max(1));
    let sink = ResultSink::new(store, rx).spawn();

    let scanned = run_scan(job, prober, config, tx).await;
    let sunk = sink
        .await
        .map_err(|e| ScanError::SinkFailed(e.to_string()))?;

    let sink = sunk?;
    let stats = scanned?;
    let duration_ms = start_time.elapsed().as_millis() as u64;

    info!(
        hosts = stats.hosts,
        probes = stats.probes,
        open = stats.open,
        retries = stats.retries,
        peak_active = stats.peak_active,
        persisted = sink.persisted,
        duration_ms,
        "scan complete"
    );

    Ok(RunReport {
        mode,
        stats,
        sink,
        duration_ms,
    })
}
