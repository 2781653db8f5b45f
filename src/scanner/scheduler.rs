//! Scan scheduler: turns a mode and target lists into host scan units and
//! dispatches them under admission control.
//!
//! Each admitted unit is one tokio task probing its ports strictly one at a
//! time, so the number of concurrent connection attempts never exceeds the
//! number of admission permits.

use crate::error::{ScanError, ScanResult, StorageResult};
use crate::scanner::pacing::Pacing;
use crate::scanner::progress::Progress;
use crate::scanner::retry::{probe, RetryPolicy};
use crate::scanner::traits::{ProbeVerdict, SharedProber};
use crate::storage::ResultStore;
use crate::types::{HostList, PortList, ScanMode, ScanOutcome};
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, warn};

/// Default number of host units admitted at once.
pub const DEFAULT_CONCURRENCY: usize = 256;

/// Default number of dispatched hosts between progress lines.
pub const DEFAULT_PROGRESS_INTERVAL: usize = 100;

/// One host and the ports to probe on it, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostUnit {
    pub host: String,
    pub ports: Arc<[u16]>,
}

/// Every host unit of a run, in dispatch order.
#[derive(Debug, Clone)]
pub struct ScanJob {
    mode: ScanMode,
    units: Vec<HostUnit>,
}

impl ScanJob {
    /// Build the units for `mode`.
    ///
    /// Rescan modes read their targets from `store` and ignore the supplied
    /// lists they do not use. Hosts left with no ports get no unit.
    pub fn plan<S>(
        mode: ScanMode,
        hosts: HostList,
        ports: PortList,
        store: &S,
    ) -> StorageResult<Self>
    where
        S: ResultStore + ?Sized,
    {
        let units = match mode {
            ScanMode::Discovery => cross(hosts, ports),
            ScanMode::KnownOpenRescan => cross(store.open_hosts()?, ports),
            ScanMode::VulnRescan => {
                let mut by_host: BTreeMap<String, Vec<u16>> = BTreeMap::new();
                for (host, port) in store.open_endpoints()? {
                    by_host.entry(host).or_default().push(port);
                }
                by_host
                    .into_iter()
                    .map(|(host, ports)| HostUnit {
                        host,
                        ports: ports.into(),
                    })
                    .collect()
            }
        };
        Ok(Self { mode, units })
    }

    /// Randomly permute host order and, outside vulnerability rescans, the
    /// shared port order.
    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.units.shuffle(rng);
        if self.mode == ScanMode::VulnRescan {
            return;
        }
        if let Some(first) = self.units.first() {
            let mut ports = first.ports.to_vec();
            ports.shuffle(rng);
            let shared: Arc<[u16]> = ports.into();
            for unit in &mut self.units {
                unit.ports = Arc::clone(&shared);
            }
        }
    }

    /// The mode this job was planned for.
    pub fn mode(&self) -> ScanMode {
        self.mode
    }

    /// Units in dispatch order.
    pub fn units(&self) -> &[HostUnit] {
        &self.units
    }

    /// Number of host units.
    pub fn host_count(&self) -> usize {
        self.units.len()
    }

    /// Number of probes the job will dispatch.
    pub fn probe_count(&self) -> usize {
        self.units.iter().map(|u| u.ports.len()).sum()
    }

    /// Whether there is nothing to probe.
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

fn cross(hosts: HostList, ports: PortList) -> Vec<HostUnit> {
    if ports.is_empty() {
        return Vec::new();
    }
    let ports: Arc<[u16]> = ports.into();
    hosts
        .into_iter()
        .map(|host| HostUnit {
            host,
            ports: Arc::clone(&ports),
        })
        .collect()
}

/// Dispatch settings.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub concurrency: usize,
    pub pacing: Pacing,
    pub retry: RetryPolicy,
    pub progress_interval: usize,
    pub show_progress: bool,
}

impl SchedulerConfig {
    /// Create a configuration admitting `concurrency` host units at once.
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            pacing: Pacing::default(),
            retry: RetryPolicy::default(),
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            show_progress: false,
        }
    }

    /// Set the inter-port delay.
    pub fn with_pacing(mut self, pacing: Pacing) -> Self {
        self.pacing = pacing;
        self
    }

    /// Set the exhaustion retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Log progress every `interval` hosts.
    pub fn with_progress_interval(mut self, interval: usize) -> Self {
        self.progress_interval = interval;
        self
    }

    /// Draw a progress bar instead of logging progress lines.
    pub fn with_progress_bar(mut self) -> Self {
        self.show_progress = true;
        self
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

/// Counts gathered while a job runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Host units dispatched.
    pub hosts: usize,
    /// Probes that reached a definitive answer.
    pub probes: usize,
    /// Of those, probes that found the port open.
    pub open: usize,
    /// Attempts repeated because of local resource exhaustion.
    pub retries: u64,
    /// Highest number of host units active at the same time.
    pub peak_active: usize,
}

#[derive(Debug, Default)]
struct Counters {
    hosts: AtomicUsize,
    probes: AtomicUsize,
    open: AtomicUsize,
    retries: AtomicU64,
    active: AtomicUsize,
    peak_active: AtomicUsize,
}

impl Counters {
    fn enter(self: &Arc<Self>) -> ActiveGuard {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_active.fetch_max(now, Ordering::SeqCst);
        ActiveGuard(Arc::clone(self))
    }

    fn record(&self, verdict: &ProbeVerdict) {
        self.probes.fetch_add(1, Ordering::Relaxed);
        self.retries
            .fetch_add(u64::from(verdict.retries), Ordering::Relaxed);
        if verdict.open {
            self.open.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn snapshot(&self) -> ScanStats {
        ScanStats {
            hosts: self.hosts.load(Ordering::SeqCst),
            probes: self.probes.load(Ordering::SeqCst),
            open: self.open.load(Ordering::SeqCst),
            retries: self.retries.load(Ordering::SeqCst),
            peak_active: self.peak_active.load(Ordering::SeqCst),
        }
    }
}

/// Marks a host unit as active until dropped.
struct ActiveGuard(Arc<Counters>);

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        self.0.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Everything a host task needs, moved into it by value.
struct UnitContext {
    prober: SharedProber,
    pacing: Pacing,
    retry: RetryPolicy,
    outcomes: mpsc::Sender<ScanOutcome>,
    counters: Arc<Counters>,
}

/// Dispatch every unit of `job` and wait for all of them to finish.
///
/// Outcomes are sent on `outcomes`; the sender is dropped before returning,
/// which ends the stream for the sink. If the sink goes away, dispatch stops
/// early and running units stop at their next send.
pub async fn run_scan(
    job: ScanJob,
    prober: SharedProber,
    config: &SchedulerConfig,
    outcomes: mpsc::Sender<ScanOutcome>,
) -> ScanResult<ScanStats> {
    let total = job.host_count();
    let admission = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let counters = Arc::new(Counters::default());
    let progress = Progress::new(total, config.progress_interval, config.show_progress);
    let mut tasks = JoinSet::new();

    for (idx, unit) in job.units.into_iter().enumerate() {
        if outcomes.is_closed() {
            warn!("result sink stopped; halting dispatch");
            break;
        }

        let permit = Arc::clone(&admission)
            .acquire_owned()
            .await
            .map_err(|e| ScanError::TaskFailed(e.to_string()))?;

        counters.hosts.fetch_add(1, Ordering::SeqCst);
        progress.host_dispatched(idx + 1);

        let ctx = UnitContext {
            prober: Arc::clone(&prober),
            pacing: config.pacing,
            retry: config.retry,
            outcomes: outcomes.clone(),
            counters: Arc::clone(&counters),
        };
        tasks.spawn(scan_host(unit, ctx, permit));

        while let Some(joined) = tasks.try_join_next() {
            check_join(joined)?;
        }
    }

    while let Some(joined) = tasks.join_next().await {
        check_join(joined)?;
    }
    drop(outcomes);
    progress.finish();

    Ok(counters.snapshot())
}

fn check_join(joined: Result<(), JoinError>) -> ScanResult<()> {
    joined.map_err(|e| ScanError::TaskFailed(e.to_string()))
}

/// Probe every port of one host, one after another.
async fn scan_host(unit: HostUnit, ctx: UnitContext, _permit: OwnedSemaphorePermit) {
    let _active = ctx.counters.enter();
    let HostUnit { host, ports } = unit;

    for (i, &port) in ports.iter().enumerate() {
        let verdict = probe(ctx.prober.as_ref(), &host, port, &ctx.retry).await;
        ctx.counters.record(&verdict);
        if verdict.open {
            info!(host = %host, port, "port open");
        }

        if ctx.outcomes.send(verdict.into_outcome(&host, port)).await.is_err() {
            debug!(host = %host, "result sink closed; abandoning host");
            return;
        }

        if i + 1 < ports.len() {
            ctx.pacing.pause().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded_store() -> MemoryStore {
        MemoryStore::with_outcomes([
            ScanOutcome::now("10.0.0.1", 22, true),
            ScanOutcome::now("10.0.0.1", 80, true),
            ScanOutcome::now("10.0.0.1", 81, false),
            ScanOutcome::now("10.0.0.2", 443, true),
            ScanOutcome::now("10.0.0.3", 22, false),
        ])
    }

    #[test]
    fn test_discovery_plan_is_cross_product() {
        let hosts = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        let job = ScanJob::plan(ScanMode::Discovery, hosts, vec![1, 2], &MemoryStore::new())
            .unwrap();
        assert_eq!(job.host_count(), 3);
        assert_eq!(job.probe_count(), 6);
    }

    #[test]
    fn test_known_open_plan_ignores_supplied_hosts() {
        let job = ScanJob::plan(
            ScanMode::KnownOpenRescan,
            vec!["ignored".to_string()],
            vec![8080, 8443, 9000],
            &seeded_store(),
        )
        .unwrap();
        let hosts: Vec<_> = job.units().iter().map(|u| u.host.as_str()).collect();
        assert_eq!(hosts, vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(job.probe_count(), 6);
    }

    #[test]
    fn test_known_open_plan_with_empty_store() {
        let mut store = MemoryStore::new();
        store.ensure_schema().unwrap();
        let job = ScanJob::plan(ScanMode::KnownOpenRescan, Vec::new(), vec![22], &store)
            .unwrap();
        assert!(job.is_empty());
        assert_eq!(job.probe_count(), 0);
    }

    #[test]
    fn test_vuln_plan_uses_only_open_pairs() {
        let job = ScanJob::plan(
            ScanMode::VulnRescan,
            vec!["ignored".to_string()],
            vec![1, 2, 3],
            &seeded_store(),
        )
        .unwrap();
        let pairs: Vec<(String, Vec<u16>)> = job
            .units()
            .iter()
            .map(|u| (u.host.clone(), u.ports.to_vec()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("10.0.0.1".to_string(), vec![22, 80]),
                ("10.0.0.2".to_string(), vec![443]),
            ]
        );
    }

    #[test]
    fn test_empty_port_list_yields_no_units() {
        let job = ScanJob::plan(
            ScanMode::Discovery,
            vec!["a".to_string()],
            Vec::new(),
            &MemoryStore::new(),
        )
        .unwrap();
        assert!(job.is_empty());
    }

    #[test]
    fn test_shuffle_permutes_without_losing_pairs() {
        let hosts: Vec<String> = (0..50).map(|i| format!("10.0.1.{i}")).collect();
        let ports: Vec<u16> = (1..=40).collect();
        let mut job =
            ScanJob::plan(ScanMode::Discovery, hosts.clone(), ports.clone(), &MemoryStore::new())
                .unwrap();
        job.shuffle(&mut StdRng::seed_from_u64(7));

        let mut shuffled_hosts: Vec<String> = job.units().iter().map(|u| u.host.clone()).collect();
        assert_ne!(shuffled_hosts, hosts);
        shuffled_hosts.sort();
        let mut expected = hosts;
        expected.sort();
        assert_eq!(shuffled_hosts, expected);

        let order = job.units()[0].ports.to_vec();
        assert_ne!(order, ports);
        assert!(job.units().iter().all(|u| *u.ports == *order));
        let mut sorted = order;
        sorted.sort_unstable();
        assert_eq!(sorted, ports);
    }

    #[test]
    fn test_vuln_shuffle_keeps_port_lists() {
        let mut job =
            ScanJob::plan(ScanMode::VulnRescan, Vec::new(), Vec::new(), &seeded_store()).unwrap();
        job.shuffle(&mut StdRng::seed_from_u64(1));
        for unit in job.units() {
            match unit.host.as_str() {
                "10.0.0.1" => assert_eq!(*unit.ports, [22, 80]),
                "10.0.0.2" => assert_eq!(*unit.ports, [443]),
                other => panic!("unexpected host {other}"),
            }
        }
    }

    #[test]
    fn test_config_builder() {
        let config = SchedulerConfig::new(0)
            .with_pacing(Pacing::none())
            .with_progress_interval(1)
            .with_progress_bar();
        assert_eq!(config.concurrency, 1);
        assert!(config.pacing.is_disabled());
        assert!(config.show_progress);
    }
}
