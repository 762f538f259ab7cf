//! Service registration subsystem.
//!
//! # Data Flow
//! ```text
//! CLI install/uninstall/dumpconfig
//!     → ServiceRegistrar trait
//!     → systemd.rs (service record + unit file on disk)
//!
//! Service record (record.rs):
//!     <storage_dir>/<name>   key=value lines
//!     notify, dir, cmd, pid, log, wait, nix_user, nix_group
//! ```
//!
//! # Design Decisions
//! - The CLI only talks to the trait; the backend is swappable
//! - Errors carry a stable code so scripts can match on them
//! - Records are flat text so operators can edit them by hand

pub mod args;
pub mod record;
pub mod systemd;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub use record::ServiceRecord;
pub use systemd::SystemdRegistrar;

/// Errors surfaced by a registrar.
#[derive(Debug, Error)]
pub enum RegistrarError {
    #[error("Invalid service name {0:?}")]
    InvalidName(String),

    #[error("The '{0}' service is already installed")]
    AlreadyInstalled(String),

    #[error("The '{0}' service is not installed")]
    NotInstalled(String),

    #[error("The '{key}' value {value:?} contains a line break")]
    InvalidValue { key: String, value: String },

    #[error("Malformed service record '{}' at line {line}", .path.display())]
    MalformedRecord { path: PathBuf, line: usize },

    #[error("Missing '{key}' in service record '{}'", .path.display())]
    MissingKey { path: PathBuf, key: String },

    #[error("Unable to {action} '{}': {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl RegistrarError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            RegistrarError::InvalidName(_) => "invalid_name",
            RegistrarError::AlreadyInstalled(_) => "already_installed",
            RegistrarError::NotInstalled(_) => "not_installed",
            RegistrarError::InvalidValue { .. } => "invalid_value",
            RegistrarError::MalformedRecord { .. } => "malformed_record",
            RegistrarError::MissingKey { .. } => "missing_key",
            RegistrarError::Io { .. } => "io_error",
        }
    }

    /// Optional diagnostic payload.
    pub fn info(&self) -> Option<String> {
        match self {
            RegistrarError::Io { source, .. } => Some(format!("{:?}", source.kind())),
            _ => None,
        }
    }

    pub(crate) fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        RegistrarError::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Result type for registrar operations.
pub type RegistrarResult<T> = Result<T, RegistrarError>;

/// Optional settings recorded alongside the command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallOptions {
    /// Notify base for stop/reload markers. Defaults to `<executable>.notify`.
    pub notify: Option<PathBuf>,
    /// Working directory for the service.
    pub dir: Option<PathBuf>,
    /// PID file, for services that write one.
    pub pid: Option<PathBuf>,
    /// Log file.
    pub log: Option<PathBuf>,
    /// Seconds to wait for a clean stop.
    pub wait: Option<u32>,
    pub nix_user: Option<String>,
    pub nix_group: Option<String>,
}

/// What to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub executable: PathBuf,
    pub args: Vec<String>,
    pub options: InstallOptions,
}

impl ServiceSpec {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            args: Vec::new(),
            options: InstallOptions::default(),
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn options(mut self, options: InstallOptions) -> Self {
        self.options = options;
        self
    }

    /// Executable followed by its arguments, as strings.
    pub fn command_line(&self) -> Vec<String> {
        std::iter::once(self.executable.to_string_lossy().into_owned())
            .chain(self.args.iter().cloned())
            .collect()
    }

    /// Every value ends up on a single line of the record, so none may
    /// contain a line break.
    pub fn validate(&self) -> RegistrarResult<()> {
        let path = |p: &Option<PathBuf>| p.as_deref().map(|p| p.to_string_lossy().into_owned());
        let options = &self.options;

        let values = std::iter::once(("cmd", Some(self.executable.to_string_lossy().into_owned())))
            .chain(self.args.iter().map(|arg| ("cmd", Some(arg.clone()))))
            .chain([
                ("notify", path(&options.notify)),
                ("dir", path(&options.dir)),
                ("pid", path(&options.pid)),
                ("log", path(&options.log)),
                ("nix_user", options.nix_user.clone()),
                ("nix_group", options.nix_group.clone()),
            ]);

        for (key, value) in values {
            if let Some(value) = value.filter(|v| v.contains(['\n', '\r'])) {
                return Err(RegistrarError::InvalidValue {
                    key: key.to_string(),
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Files written by a successful install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub record_path: PathBuf,
    pub unit_path: PathBuf,
}

/// Registers programs as OS-managed services.
pub trait ServiceRegistrar {
    /// Human-readable description of the backend and where it writes.
    fn describe(&self) -> String;

    fn install(&self, name: &str, spec: &ServiceSpec) -> RegistrarResult<InstallReport>;

    fn uninstall(&self, name: &str) -> RegistrarResult<()>;

    /// Read back the stored record for a service.
    fn get_config(&self, name: &str) -> RegistrarResult<ServiceRecord>;
}

/// Reject names that would escape the storage directory or break the unit.
pub fn validate_service_name(name: &str) -> RegistrarResult<()> {
    let valid = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | '@'));

    if valid {
        Ok(())
    } else {
        Err(RegistrarError::InvalidName(name.to_string()))
    }
}
