//! The single writer.
//!
//! Every host task sends its outcomes into one channel; the sink is the only
//! consumer and the only code that writes to the store during a run. The
//! stream ends when every sender has been dropped.

use super::ResultStore;
use crate::error::StorageResult;
use crate::types::ScanOutcome;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// What the sink persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkReport {
    /// Rows committed.
    pub persisted: usize,
    /// Of those, rows marking an open port.
    pub open: usize,
}

/// Consumes the outcome stream and commits it in one transaction.
pub struct ResultSink<S> {
    store: S,
    receiver: mpsc::Receiver<ScanOutcome>,
}

impl<S: ResultStore> ResultSink<S> {
    /// Create a sink over `store` reading from `receiver`.
    pub fn new(store: S, receiver: mpsc::Receiver<ScanOutcome>) -> Self {
        Self { store, receiver }
    }

    /// Drain the stream into the store. Blocks the calling thread.
    ///
    /// The first storage error is returned immediately; rows inserted before
    /// it are never committed.
    pub fn run(mut self) -> StorageResult<SinkReport> {
        self.store.ensure_schema()?;
        self.store.begin()?;

        let mut report = SinkReport::default();
        while let Some(outcome) = self.receiver.blocking_recv() {
            self.store.insert(&outcome)?;
            debug!(%outcome, "recorded outcome");
            report.persisted += 1;
            if outcome.open {
                report.open += 1;
            }
        }

        self.store.commit()?;
        info!(
            persisted = report.persisted,
            open = report.open,
            "committed scan results"
        );
        Ok(report)
    }
}

impl<S: ResultStore + 'static> ResultSink<S> {
    /// Run the sink on tokio's blocking pool.
    pub fn spawn(self) -> JoinHandle<StorageResult<SinkReport>> {
        tokio::task::spawn_blocking(move || self.run())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use crate::storage::MemoryStore;

    #[tokio::test]
    async fn test_sink_commits_on_close() {
        let store = MemoryStore::new();
        let (tx, rx) = mpsc::channel(4);
        let handle = ResultSink::new(store.clone(), rx).spawn();

        tx.send(ScanOutcome::now("10.0.0.1", 22, true)).await.unwrap();
        tx.send(ScanOutcome::now("10.0.0.1", 23, false)).await.unwrap();
        drop(tx);

        let report = handle.await.unwrap().unwrap();
        assert_eq!(report, SinkReport { persisted: 2, open: 1 });
        assert_eq!(store.committed().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_zero_valued_outcome_is_persisted() {
        let store = MemoryStore::new();
        let (tx, rx) = mpsc::channel(1);
        let handle = ResultSink::new(store.clone(), rx).spawn();

        let zero = ScanOutcome {
            host: String::new(),
            port: 0,
            timestamp: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            open: false,
            diagnostic: None,
        };
        tx.send(zero.clone()).await.unwrap();
        tx.send(ScanOutcome::now("after", 1, false)).await.unwrap();
        drop(tx);

        assert_eq!(handle.await.unwrap().unwrap().persisted, 2);
        assert_eq!(store.committed().unwrap()[0], zero);
    }

    #[tokio::test]
    async fn test_empty_stream_commits_nothing() {
        let store = MemoryStore::new();
        let (tx, rx) = mpsc::channel(1);
        let handle = ResultSink::new(store.clone(), rx).spawn();
        drop(tx);

        assert_eq!(handle.await.unwrap().unwrap(), SinkReport::default());
        assert!(store.committed().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_insert_failure_aborts_without_commit() {
        let store = MemoryStore::new().fail_inserts_after(1);
        let (tx, rx) = mpsc::channel(4);
        let handle = ResultSink::new(store.clone(), rx).spawn();

        tx.send(ScanOutcome::now("a", 1, true)).await.unwrap();
        tx.send(ScanOutcome::now("a", 2, true)).await.unwrap();

        let result = handle.await.unwrap();
        assert!(matches!(result, Err(StorageError::Rejected(_))));
        assert!(store.committed().unwrap().is_empty());
        assert!(tx.is_closed());
    }
}
