//! The service body: idle work plus periodic marker checks.
//!
//! # States
//! ```text
//! Running → Stopped: stop marker observed at a check
//! Running → Running: reload marker observed, config reloaded, marker removed
//! ```
//!
//! Detection latency is bounded by `check_interval + work_interval`.

use std::path::PathBuf;

use tokio::time::{sleep, Instant};

use crate::config::{load_config, LifecycleConfig};
use crate::lifecycle::markers::{MarkerPaths, MarkerStore};

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Running,
    Stopped,
}

/// Counters describing what the loop has done so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoopReport {
    /// Units of work performed.
    pub iterations: u64,
    /// Marker checks performed.
    pub checks: u64,
    /// Reload requests honored.
    pub reloads: u64,
    pub state: LoopState,
}

/// Result of a single marker check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckOutcome {
    Idle,
    Reloaded,
    Stop,
}

/// Sequential lifecycle loop over a marker store.
pub struct ServiceLoop<S> {
    markers: MarkerPaths,
    store: S,
    config: LifecycleConfig,
    config_path: Option<PathBuf>,
    report: LoopReport,
}

impl<S: MarkerStore> ServiceLoop<S> {
    pub fn new(markers: MarkerPaths, store: S, config: LifecycleConfig) -> Self {
        Self {
            markers,
            store,
            config,
            config_path: None,
            report: LoopReport::default(),
        }
    }

    /// Re-read this file whenever a reload is requested.
    pub fn with_config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    pub fn markers(&self) -> &MarkerPaths {
        &self.markers
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Counters so far. Still valid if `run` was cancelled mid-flight.
    pub fn report(&self) -> &LoopReport {
        &self.report
    }

    /// Run until the stop marker is observed.
    pub async fn run(&mut self) -> LoopReport {
        tracing::info!(
            stop_marker = %self.markers.stop().display(),
            reload_marker = %self.markers.reload().display(),
            work_interval_ms = self.config.work_interval_ms,
            check_interval_ms = self.config.check_interval_ms,
            "Service loop started"
        );

        let mut last_check = Instant::now();

        while self.report.state == LoopState::Running {
            // Placeholder for real work.
            sleep(self.config.work_interval()).await;
            self.report.iterations += 1;

            if last_check.elapsed() >= self.config.check_interval() {
                if self.check_markers() == CheckOutcome::Stop {
                    self.report.state = LoopState::Stopped;
                }
                last_check = Instant::now();
            }
        }

        tracing::info!(
            iterations = self.report.iterations,
            checks = self.report.checks,
            reloads = self.report.reloads,
            "Service loop stopped"
        );
        self.report.clone()
    }

    /// Look at the markers once. Stop wins over reload.
    pub fn check_markers(&mut self) -> CheckOutcome {
        self.report.checks += 1;

        if self.store.exists(self.markers.stop()) {
            tracing::info!("Stop requested");
            return CheckOutcome::Stop;
        }

        if self.store.exists(self.markers.reload()) {
            tracing::info!("Reload config requested");
            self.reload_config();
            self.report.reloads += 1;

            // A marker left behind just triggers another reload next check.
            if let Err(e) = self.store.remove(self.markers.reload()) {
                tracing::warn!(error = %e, "Reload marker not removed");
            }
            return CheckOutcome::Reloaded;
        }

        CheckOutcome::Idle
    }

    fn reload_config(&mut self) {
        let Some(path) = &self.config_path else {
            tracing::debug!("No configuration file, nothing to reload");
            return;
        };

        match load_config(path) {
            Ok(new_config) => {
                self.config = new_config.lifecycle;
                tracing::info!(
                    path = %path.display(),
                    work_interval_ms = self.config.work_interval_ms,
                    check_interval_ms = self.config.check_interval_ms,
                    "Configuration reloaded"
                );
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    "Failed to reload config: {}. Keeping current configuration.",
                    e
                );
            }
        }
    }
}
