//! Scan settings and paths.
//!
//! Settings come from a JSON file, either named on the command line or found
//! in the XDG config directory, with every field defaulted.

use crate::error::{ConfigError, ConfigResult};
use crate::scanner::nmap::{DEFAULT_NMAP_ARGS, DEFAULT_NMAP_PATH};
use crate::scanner::scheduler::{DEFAULT_CONCURRENCY, DEFAULT_PROGRESS_INTERVAL};
use crate::scanner::{Pacing, RetryPolicy, SchedulerConfig};
use crate::storage::DEFAULT_DATABASE_PATH;
use crate::types::ScanMode;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::debug;

/// Global paths singleton.
static PATHS: OnceLock<Option<Paths>> = OnceLock::new();

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/icescan)
    pub config_dir: PathBuf,
}

impl Paths {
    /// Get the global paths instance, if a home directory can be found.
    pub fn get() -> Option<&'static Paths> {
        PATHS.get_or_init(|| Self::new().ok()).as_ref()
    }

    fn new() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "icescan", "icescan")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Ok(Self {
            config_dir: project.config_dir().to_path_buf(),
        })
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }
}

/// Tunables for a scan run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Host units admitted at once.
    pub concurrency: usize,
    /// TCP connect timeout in milliseconds.
    pub connect_timeout_ms: u64,
    /// Lower bound of the inter-port delay in milliseconds.
    pub min_delay_ms: u64,
    /// Upper bound of the inter-port delay in milliseconds.
    pub max_delay_ms: u64,
    /// Pause before retrying after local resource exhaustion, in milliseconds.
    pub retry_pause_ms: u64,
    /// Hosts dispatched between progress lines.
    pub progress_interval: usize,
    /// SQLite results database.
    pub database: PathBuf,
    /// Diagnostic tool executable.
    pub nmap_path: PathBuf,
    /// Diagnostic tool arguments placed before the host.
    pub nmap_args: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            connect_timeout_ms: 1000,
            min_delay_ms: 500,
            max_delay_ms: 1000,
            retry_pause_ms: 500,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            database: PathBuf::from(DEFAULT_DATABASE_PATH),
            nmap_path: PathBuf::from(DEFAULT_NMAP_PATH),
            nmap_args: DEFAULT_NMAP_ARGS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or from the default location when `None`.
    ///
    /// A missing default file is not an error; a missing explicit one is.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => match Paths::get().map(Paths::settings_file) {
                Some(file) if file.exists() => Self::load_from(&file),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let settings: Self = serde_json::from_str(&content)?;
        debug!(path = %path.display(), "loaded settings");
        Ok(settings)
    }

    /// Reject values no run can work with.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "concurrency",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.connect_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "connect_timeout_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.min_delay_ms > self.max_delay_ms {
            return Err(ConfigError::InvalidValue {
                field: "min_delay_ms",
                reason: format!(
                    "{} exceeds max_delay_ms {}",
                    self.min_delay_ms, self.max_delay_ms
                ),
            });
        }
        Ok(())
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn pacing(&self) -> ConfigResult<Pacing> {
        Pacing::new(
            Duration::from_millis(self.min_delay_ms),
            Duration::from_millis(self.max_delay_ms),
        )
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(Duration::from_millis(self.retry_pause_ms))
    }

    /// Scheduler settings for a run in `mode`.
    ///
    /// Vulnerability rescans are slow per host, so progress is reported for
    /// every host there.
    pub fn scheduler_config(&self, mode: ScanMode) -> ConfigResult<SchedulerConfig> {
        self.validate()?;
        let interval = if mode.is_diagnostic() {
            1
        } else {
            self.progress_interval
        };
        Ok(SchedulerConfig::new(self.concurrency)
            .with_pacing(self.pacing()?)
            .with_retry(self.retry_policy())
            .with_progress_interval(interval))
    }
}
