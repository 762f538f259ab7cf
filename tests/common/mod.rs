//! Shared helpers for integration tests.

use std::path::{Path, PathBuf};

use sentinel_service::lifecycle::MarkerPaths;
use tempfile::TempDir;

/// A scratch directory holding a fake executable's marker files.
pub struct MarkerFixture {
    pub dir: TempDir,
    pub executable: PathBuf,
    pub markers: MarkerPaths,
}

impl MarkerFixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let executable = dir.path().join("sentinel-service");
        let markers = MarkerPaths::for_executable(&executable, ".notify");
        Self {
            dir,
            executable,
            markers,
        }
    }

    pub fn touch(&self, path: &Path) {
        std::fs::write(path, b"").expect("create marker");
    }

    #[allow(dead_code)]
    pub fn write_config(&self, content: &str) -> PathBuf {
        let path = self.dir.path().join("sentinel.toml");
        std::fs::write(&path, content).expect("write config");
        path
    }
}
