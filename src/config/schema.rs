//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files and
//! every field has a default, so an empty file is a valid configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::lifecycle::markers::DEFAULT_NOTIFY_SUFFIX;

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Lifecycle loop timing and marker naming.
    pub lifecycle: LifecycleConfig,

    /// Where the registrar keeps service records and unit files.
    pub registrar: RegistrarConfig,

    /// Logging settings.
    pub observability: ObservabilityConfig,
}

/// Lifecycle loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Duration of one unit of work in milliseconds.
    pub work_interval_ms: u64,

    /// Minimum time between marker checks in milliseconds.
    pub check_interval_ms: u64,

    /// Suffix appended to the executable path to form the notify base.
    pub notify_suffix: String,
}

impl LifecycleConfig {
    pub fn work_interval(&self) -> Duration {
        Duration::from_millis(self.work_interval_ms)
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            work_interval_ms: 1_000,
            check_interval_ms: 3_000,
            notify_suffix: DEFAULT_NOTIFY_SUFFIX.to_string(),
        }
    }
}

/// Service registrar configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RegistrarConfig {
    /// Directory holding one service record per installed service.
    pub storage_dir: PathBuf,

    /// Directory the systemd unit file is written to.
    pub unit_dir: PathBuf,
}

impl Default for RegistrarConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("/var/lib/sentinel-service"),
            unit_dir: PathBuf::from("/etc/systemd/system"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` takes precedence.
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json: false,
        }
    }
}
