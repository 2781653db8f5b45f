//! Error types for icescan.
//!
//! Uses `thiserror` for ergonomic error definitions. Library code returns
//! these; only the binary decides to abort and with which exit code.

use crate::types::{PortError, TargetError};
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;
use thiserror::Error;

/// A single failed probe attempt.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("connection to {target}:{port} failed: {source}")]
    Connect {
        target: String,
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("connection to {target}:{port} timed out after {timeout:?}")]
    Timeout {
        target: String,
        port: u16,
        timeout: Duration,
    },

    #[error("failed to launch {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },

    #[error("{tool} exited with {status}: {stderr}")]
    ToolExit {
        tool: String,
        status: ExitStatus,
        stderr: String,
    },
}

impl ProbeError {
    /// Whether this failure means *we* ran out of sockets or descriptors,
    /// as opposed to the target refusing or ignoring us.
    pub fn is_local_exhaustion(&self) -> bool {
        match self {
            Self::Connect { source, .. } | Self::Spawn { source, .. } => {
                io_error_is_exhaustion(source)
            }
            Self::ToolExit { stderr, .. } => message_is_exhaustion(stderr),
            Self::Timeout { .. } => false,
        }
    }
}

/// Message fragments emitted by the OS when local socket resources run out.
const EXHAUSTION_SIGNATURES: &[&str] = &[
    "too many open files",
    "an operation on a socket could not be performed",
];

fn io_error_is_exhaustion(err: &io::Error) -> bool {
    err.raw_os_error().is_some_and(errno_is_exhaustion) || message_is_exhaustion(&err.to_string())
}

#[cfg(unix)]
fn errno_is_exhaustion(code: i32) -> bool {
    matches!(
        code,
        libc::EMFILE | libc::ENFILE | libc::EADDRNOTAVAIL | libc::ENOBUFS
    )
}

#[cfg(not(unix))]
fn errno_is_exhaustion(_code: i32) -> bool {
    false
}

fn message_is_exhaustion(message: &str) -> bool {
    let message = message.to_lowercase();
    EXHAUSTION_SIGNATURES
        .iter()
        .any(|signature| message.contains(signature))
}

/// Errors raised by the persistent result store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("no scan results table in {0}; run a discovery scan first")]
    MissingTable(String),

    #[error("insert attempted outside of a write transaction")]
    NotInTransaction,

    #[error("a write transaction is already open")]
    TransactionOpen,

    #[error("write rejected: {0}")]
    Rejected(String),

    #[error("store lock poisoned")]
    Poisoned,
}

/// Result type alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("--known-open and --vuln-scan cannot be used together")]
    ConflictingModes,

    #[error("must provide either --hosts and --ports, --known-open and --ports, or --vuln-scan")]
    MissingInputs,

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("invalid config format: {0}")]
    InvalidFormat(String),

    #[error("could not determine config directory")]
    DirectoryNotFound,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidFormat(err.to_string())
    }
}

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that abort a scan run after dispatch has been planned.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("host scan task failed: {0}")]
    TaskFailed(String),

    #[error("result sink failed: {0}")]
    SinkFailed(String),
}

/// Result type alias for scan runs.
pub type ScanResult<T> = Result<T, ScanError>;

/// Top-level error surfaced by CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Target(#[from] TargetError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("failed to read {path}: {source}")]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output error: {0}")]
    Output(#[from] io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            _ => 1,
        }
    }

    /// Whether usage guidance should accompany the message.
    pub fn wants_usage(&self) -> bool {
        matches!(
            self,
            Self::Config(ConfigError::ConflictingModes | ConfigError::MissingInputs)
        )
    }
}

/// Result type alias for CLI operations.
pub type CliResult<T> = Result<T, CliError>;
