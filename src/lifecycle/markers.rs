//! Stop and reload marker files.
//!
//! A marker is a path whose existence is the signal. Both markers share a
//! notify base (`<executable><notify suffix>`), with `.stop` and `.reload`
//! appended.

use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub const DEFAULT_NOTIFY_SUFFIX: &str = ".notify";
pub const STOP_SUFFIX: &str = ".stop";
pub const RELOAD_SUFFIX: &str = ".reload";

/// Errors from touching marker files.
#[derive(Debug, Error)]
pub enum MarkerError {
    #[error("Unable to create marker '{}': {source}", .path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to remove marker '{}': {source}", .path.display())]
    Remove {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// The pair of marker paths watched by the lifecycle loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPaths {
    stop: PathBuf,
    reload: PathBuf,
}

impl MarkerPaths {
    /// Build marker paths from a notify base such as `/opt/app/bin.notify`.
    pub fn from_notify_base(base: &Path) -> Self {
        Self {
            stop: append_suffix(base, STOP_SUFFIX),
            reload: append_suffix(base, RELOAD_SUFFIX),
        }
    }

    /// Build marker paths that sit alongside an executable.
    pub fn for_executable(executable: &Path, notify_suffix: &str) -> Self {
        Self::from_notify_base(&notify_base(executable, notify_suffix))
    }

    pub fn stop(&self) -> &Path {
        &self.stop
    }

    pub fn reload(&self) -> &Path {
        &self.reload
    }
}

/// The notify base for an executable: its path with the suffix appended.
pub fn notify_base(executable: &Path, notify_suffix: &str) -> PathBuf {
    append_suffix(executable, notify_suffix)
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Access to marker files.
///
/// The lifecycle loop only reads and removes; operator commands create.
pub trait MarkerStore {
    fn exists(&self, path: &Path) -> bool;

    fn remove(&self, path: &Path) -> Result<(), MarkerError>;

    fn create(&self, path: &Path) -> Result<(), MarkerError>;
}

/// Markers backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsMarkerStore;

impl MarkerStore for FsMarkerStore {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn remove(&self, path: &Path) -> Result<(), MarkerError> {
        std::fs::remove_file(path).map_err(|source| MarkerError::Remove {
            path: path.to_path_buf(),
            source,
        })
    }

    fn create(&self, path: &Path) -> Result<(), MarkerError> {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map(|_| ())
            .map_err(|source| MarkerError::Create {
                path: path.to_path_buf(),
                source,
            })
    }
}
