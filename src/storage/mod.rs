//! Scan result persistence.
//!
//! The [`ResultStore`] trait is the narrow interface the scheduler reads
//! previous results through and the [`ResultSink`] writes new ones through.

mod memory;
mod sink;
mod sqlite;

pub use memory::MemoryStore;
pub use sink::{ResultSink, SinkReport};
pub use sqlite::{SqliteStore, DEFAULT_DATABASE_PATH};

use crate::error::StorageResult;
use crate::types::ScanOutcome;

/// Durable storage for scan outcomes.
///
/// Writes happen inside a single transaction opened with [`begin`] and
/// closed with [`commit`]; rows inserted after `begin` are not visible to
/// queries until committed.
///
/// [`begin`]: ResultStore::begin
/// [`commit`]: ResultStore::commit
pub trait ResultStore: Send {
    /// Create the results relation if it does not exist.
    fn ensure_schema(&mut self) -> StorageResult<()>;

    /// Open a write transaction.
    fn begin(&mut self) -> StorageResult<()>;

    /// Append one outcome to the open transaction.
    fn insert(&mut self, outcome: &ScanOutcome) -> StorageResult<()>;

    /// Commit the open transaction.
    fn commit(&mut self) -> StorageResult<()>;

    /// Distinct hosts with at least one recorded open outcome.
    fn open_hosts(&self) -> StorageResult<Vec<String>>;

    /// Distinct ports recorded open for `host`.
    fn open_ports(&self, host: &str) -> StorageResult<Vec<u16>>;

    /// Every distinct (host, port) pair recorded open.
    fn open_endpoints(&self) -> StorageResult<Vec<(String, u16)>> {
        let mut endpoints = Vec::new();
        for host in self.open_hosts()? {
            for port in self.open_ports(&host)? {
                endpoints.push((host.clone(), port));
            }
        }
        Ok(endpoints)
    }
}
