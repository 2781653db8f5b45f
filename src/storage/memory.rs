//! In-memory result storage.
//!
//! Mirrors the SQLite store's semantics without touching disk. Clones share
//! the same underlying rows, so a test can keep a handle while the sink owns
//! another.

use super::ResultStore;
use crate::error::{StorageError, StorageResult};
use crate::types::ScanOutcome;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Inner {
    has_schema: bool,
    committed: Vec<ScanOutcome>,
    pending: Option<Vec<ScanOutcome>>,
    insert_budget: Option<usize>,
}

/// Shared in-memory store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    /// Create an empty store without a schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with a schema and `outcomes` already committed.
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = ScanOutcome>) -> Self {
        let store = Self::new();
        if let Ok(mut inner) = store.inner.lock() {
            inner.has_schema = true;
            inner.committed.extend(outcomes);
        }
        store
    }

    /// Make every insert after the first `count` fail.
    pub fn fail_inserts_after(self, count: usize) -> Self {
        if let Ok(mut inner) = self.inner.lock() {
            inner.insert_budget = Some(count);
        }
        self
    }

    /// Snapshot of every committed outcome, in insertion order.
    pub fn committed(&self) -> StorageResult<Vec<ScanOutcome>> {
        Ok(self.lock()?.committed.clone())
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Inner>> {
        self.inner.lock().map_err(|_| StorageError::Poisoned)
    }

    fn checked(&self) -> StorageResult<MutexGuard<'_, Inner>> {
        let inner = self.lock()?;
        if !inner.has_schema {
            return Err(StorageError::MissingTable(":memory:".to_string()));
        }
        Ok(inner)
    }
}

impl ResultStore for MemoryStore {
    fn ensure_schema(&mut self) -> StorageResult<()> {
        self.lock()?.has_schema = true;
        Ok(())
    }

    fn begin(&mut self) -> StorageResult<()> {
        let mut inner = self.checked()?;
        if inner.pending.is_some() {
            return Err(StorageError::TransactionOpen);
        }
        inner.pending = Some(Vec::new());
        Ok(())
    }

    fn insert(&mut self, outcome: &ScanOutcome) -> StorageResult<()> {
        let mut inner = self.checked()?;
        if let Some(budget) = inner.insert_budget.as_mut() {
            if *budget == 0 {
                return Err(StorageError::Rejected(format!(
                    "insert of {}",
                    outcome.endpoint()
                )));
            }
            *budget -= 1;
        }
        inner
            .pending
            .as_mut()
            .ok_or(StorageError::NotInTransaction)?
            .push(outcome.clone());
        Ok(())
    }

    fn commit(&mut self) -> StorageResult<()> {
        let mut inner = self.checked()?;
        let pending = inner.pending.take().ok_or(StorageError::NotInTransaction)?;
        inner.committed.extend(pending);
        Ok(())
    }

    fn open_hosts(&self) -> StorageResult<Vec<String>> {
        let inner = self.checked()?;
        let hosts: BTreeSet<&str> = inner
            .committed
            .iter()
            .filter(|o| o.open)
            .map(|o| o.host.as_str())
            .collect();
        Ok(hosts.into_iter().map(str::to_string).collect())
    }

    fn open_ports(&self, host: &str) -> StorageResult<Vec<u16>> {
        let inner = self.checked()?;
        let ports: BTreeSet<u16> = inner
            .committed
            .iter()
            .filter(|o| o.open && o.host == host)
            .map(|o| o.port)
            .collect();
        Ok(ports.into_iter().collect())
    }
}
