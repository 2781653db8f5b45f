//! # icescan - A Concurrent TCP Reconnaissance Scanner
//!
//! icescan finds which host:port pairs accept TCP connections, keeps every
//! outcome in a SQLite database, and uses that history for later runs.
//!
//! ## Features
//!
//! - **Discovery**: every host in a list of names, addresses and IPv4 CIDR
//!   blocks against every port in a list of ports and ranges
//! - **Known-open rescans**: re-probe only hosts previously seen open
//! - **Vulnerability rescans**: run `nmap --script vuln` against each
//!   host:port previously seen open
//! - **Bounded concurrency**: a fixed number of hosts in flight, ports on a
//!   host probed one at a time with randomized delays and order
//! - **Single writer**: all outcomes of a run are committed in one transaction
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use icescan::scanner::{execute, ScanRequest, SchedulerConfig, TcpConnectProber};
//! use icescan::storage::SqliteStore;
//! use icescan::types::ScanMode;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = SqliteStore::open(Path::new("scan.db")).unwrap();
//!     let request = ScanRequest {
//!         mode: ScanMode::Discovery,
//!         hosts: vec!["192.168.1.1".to_string()],
//!         ports: vec![22, 80, 443],
//!     };
//!     let prober = Arc::new(TcpConnectProber::default());
//!     let report = execute(request, store, prober, &SchedulerConfig::default())
//!         .await
//!         .unwrap();
//!
//!     println!("{} open of {} probes", report.stats.open, report.stats.probes);
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - target expansion, scan modes and the outcome record
//! - [`scanner`] - probers, retry, pacing and the scheduler
//! - [`storage`] - the result store trait, SQLite backend and result sink
//! - [`config`] - settings file and defaults
//! - [`error`] - error types
//! - [`output`] - report formatting

pub mod cli;
pub mod config;
pub mod error;
pub mod output;
pub mod scanner;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CliError, ScanError};
pub use scanner::{execute, Prober, RunReport, ScanRequest, ScanStats};
pub use storage::{ResultStore, SqliteStore};
pub use types::{ScanMode, ScanOutcome};
