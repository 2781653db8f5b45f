//! SQLite-backed result storage.
//!
//! One relation, `scan_results`, holds every outcome ever recorded. Rows
//! are only appended; rescans read the distinct open hosts and ports back.

use super::ResultStore;
use crate::error::{StorageError, StorageResult};
use crate::types::ScanOutcome;
use chrono::SecondsFormat;
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::debug;

/// Database used when no other path is configured.
pub const DEFAULT_DATABASE_PATH: &str = "./scan.db";

const CREATE_TABLE: &str = "
CREATE TABLE IF NOT EXISTS scan_results (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    host_ip TEXT NOT NULL,
    port_number INTEGER NOT NULL,
    timestamp DATETIME NOT NULL,
    open INTEGER NOT NULL,
    nmap_output TEXT
)";

const INSERT_ROW: &str = "
INSERT INTO scan_results (host_ip, port_number, timestamp, open, nmap_output)
VALUES (?1, ?2, ?3, ?4, ?5)";

const SELECT_OPEN_HOSTS: &str =
    "SELECT DISTINCT host_ip FROM scan_results WHERE open = 1 ORDER BY host_ip";

const SELECT_OPEN_PORTS: &str = "SELECT DISTINCT port_number FROM scan_results \
     WHERE open = 1 AND host_ip = ?1 ORDER BY port_number";

const SELECT_OPEN_ENDPOINTS: &str = "SELECT DISTINCT host_ip, port_number FROM scan_results \
     WHERE open = 1 ORDER BY host_ip, port_number";

/// Persistent scan database backed by SQLite.
pub struct SqliteStore {
    conn: Connection,
    location: String,
    in_transaction: bool,
}

impl SqliteStore {
    /// Open (or create) the database at `path`. The schema is not touched.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;
        debug!(path = %path.display(), "opened result database");
        Ok(Self {
            conn,
            location: path.display().to_string(),
            in_transaction: false,
        })
    }

    /// Open a private in-memory database.
    pub fn open_in_memory() -> StorageResult<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
            location: ":memory:".to_string(),
            in_transaction: false,
        })
    }

    /// Where this database lives, for messages.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Total number of committed rows.
    pub fn row_count(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM scan_results", [], |row| row.get(0))
            .map_err(|e| self.classify(e))?;
        Ok(count as u64)
    }

    /// Turn "no such table" into a hint that discovery has not run yet.
    fn classify(&self, err: rusqlite::Error) -> StorageError {
        if err.to_string().contains("no such table") {
            StorageError::MissingTable(self.location.clone())
        } else {
            StorageError::Sqlite(err)
        }
    }
}

impl ResultStore for SqliteStore {
    fn ensure_schema(&mut self) -> StorageResult<()> {
        self.conn.execute_batch(CREATE_TABLE)?;
        Ok(())
    }

    fn begin(&mut self) -> StorageResult<()> {
        if self.in_transaction {
            return Err(StorageError::TransactionOpen);
        }
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        self.in_transaction = true;
        Ok(())
    }

    fn insert(&mut self, outcome: &ScanOutcome) -> StorageResult<()> {
        if !self.in_transaction {
            return Err(StorageError::NotInTransaction);
        }
        let timestamp = outcome
            .timestamp
            .to_rfc3339_opts(SecondsFormat::Micros, true);
        let mut stmt = self
            .conn
            .prepare_cached(INSERT_ROW)
            .map_err(|e| self.classify(e))?;
        stmt.execute(params![
            outcome.host,
            outcome.port,
            timestamp,
            outcome.open,
            outcome.diagnostic,
        ])?;
        Ok(())
    }

    fn commit(&mut self) -> StorageResult<()> {
        if !self.in_transaction {
            return Err(StorageError::NotInTransaction);
        }
        self.conn.execute_batch("COMMIT")?;
        self.in_transaction = false;
        Ok(())
    }

    fn open_hosts(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(SELECT_OPEN_HOSTS)
            .map_err(|e| self.classify(e))?;
        let hosts = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(hosts)
    }

    fn open_ports(&self, host: &str) -> StorageResult<Vec<u16>> {
        let mut stmt = self
            .conn
            .prepare(SELECT_OPEN_PORTS)
            .map_err(|e| self.classify(e))?;
        let ports = stmt
            .query_map(params![host], |row| row.get(0))?
            .collect::<Result<Vec<u16>, _>>()?;
        Ok(ports)
    }

    fn open_endpoints(&self) -> StorageResult<Vec<(String, u16)>> {
        let mut stmt = self
            .conn
            .prepare(SELECT_OPEN_ENDPOINTS)
            .map_err(|e| self.classify(e))?;
        let endpoints = stmt
            .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<Result<Vec<(String, u16)>, _>>()?;
        Ok(endpoints)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(host: &str, port: u16, open: bool) -> ScanOutcome {
        ScanOutcome::now(host, port, open)
    }

    fn seeded(rows: &[(&str, u16, bool)]) -> SqliteStore {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store.begin().unwrap();
        for &(host, port, open) in rows {
            store.insert(&outcome(host, port, open)).unwrap();
        }
        store.commit().unwrap();
        store
    }

    #[test]
    fn test_schema_is_idempotent() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        store.ensure_schema().unwrap();
        assert_eq!(store.row_count().unwrap(), 0);
    }

    #[test]
    fn test_missing_table_hint() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert!(matches!(
            store.open_hosts(),
            Err(StorageError::MissingTable(_))
        ));
    }

    #[test]
    fn test_distinct_open_queries() {
        let store = seeded(&[
            ("10.0.0.2", 22, true),
            ("10.0.0.1", 80, true),
            ("10.0.0.1", 80, true),
            ("10.0.0.1", 443, true),
            ("10.0.0.1", 8080, false),
            ("10.0.0.3", 22, false),
        ]);

        assert_eq!(store.row_count().unwrap(), 6);
        assert_eq!(store.open_hosts().unwrap(), vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(store.open_ports("10.0.0.1").unwrap(), vec![80, 443]);
        assert!(store.open_ports("10.0.0.3").unwrap().is_empty());
        assert_eq!(
            store.open_endpoints().unwrap(),
            vec![
                ("10.0.0.1".to_string(), 80),
                ("10.0.0.1".to_string(), 443),
                ("10.0.0.2".to_string(), 22),
            ]
        );
    }

    #[test]
    fn test_insert_requires_transaction() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.ensure_schema().unwrap();
        assert!(matches!(
            store.insert(&outcome("10.0.0.1", 1, false)),
            Err(StorageError::NotInTransaction)
        ));
        assert!(matches!(store.commit(), Err(StorageError::NotInTransaction)));
    }

    #[test]
    fn test_uncommitted_rows_are_lost() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.ensure_schema().unwrap();
            store.begin().unwrap();
            store.insert(&outcome("10.0.0.1", 22, true)).unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.row_count().unwrap(), 0);
    }

    #[test]
    fn test_committed_rows_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.db");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.ensure_schema().unwrap();
            store.begin().unwrap();
            store
                .insert(&outcome("10.0.0.1", 22, true).with_diagnostic(Some("ok".into())))
                .unwrap();
            store.commit().unwrap();
        }

        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.open_ports("10.0.0.1").unwrap(), vec![22]);
        let output: Option<String> = store
            .conn
            .query_row("SELECT nmap_output FROM scan_results", [], |row| row.get(0))
            .unwrap();
        assert_eq!(output.as_deref(), Some("ok"));
    }
}
