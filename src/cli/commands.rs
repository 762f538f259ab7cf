//! Command handlers.
//!
//! Handlers write user-facing output to `out` and return `CliError` on
//! failure; `main` decides how to report it and which exit code to use.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::cli::error::CliError;
use crate::lifecycle::markers::notify_base;
use crate::lifecycle::{MarkerPaths, MarkerStore};
use crate::registrar::{InstallOptions, ServiceRegistrar, ServiceSpec};

/// Name the service is registered under.
pub const SERVICE_NAME: &str = "sentinel-service-test";

/// How often `reload` looks for the marker to disappear.
pub const RELOAD_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// What `install` registers: this executable, plus the config file if any.
pub fn install_spec(executable: &Path, config_path: Option<&Path>, notify_suffix: &str) -> ServiceSpec {
    let args: Vec<String> = match config_path {
        Some(path) => vec!["--config".into(), path.to_string_lossy().into_owned()],
        None => Vec::new(),
    };

    ServiceSpec::new(executable)
        .args(args)
        .options(InstallOptions {
            notify: Some(notify_base(executable, notify_suffix)),
            ..Default::default()
        })
}

pub fn install(
    registrar: &dyn ServiceRegistrar,
    spec: &ServiceSpec,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let report = registrar.install(SERVICE_NAME, spec).map_err(|e| {
        CliError::registrar(
            format!("Unable to install the '{}' service.", SERVICE_NAME),
            e,
        )
    })?;

    writeln!(out, "Service successfully installed.")?;
    writeln!(out, "  record: {}", report.record_path.display())?;
    writeln!(out, "  unit:   {}", report.unit_path.display())?;
    Ok(())
}

pub fn uninstall(registrar: &dyn ServiceRegistrar, out: &mut impl Write) -> Result<(), CliError> {
    registrar.uninstall(SERVICE_NAME).map_err(|e| {
        CliError::registrar(
            format!("Unable to uninstall the '{}' service.", SERVICE_NAME),
            e,
        )
    })?;

    writeln!(out, "Service successfully uninstalled.")?;
    Ok(())
}

pub fn dump_config(
    registrar: &dyn ServiceRegistrar,
    json: bool,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let record = registrar.get_config(SERVICE_NAME).map_err(|e| {
        CliError::registrar(
            format!(
                "Unable to retrieve the configuration for the '{}' service.",
                SERVICE_NAME
            ),
            e,
        )
    })?;

    if json {
        let text = serde_json::to_string_pretty(&record.to_json())
            .map_err(std::io::Error::from)?;
        writeln!(out, "{}", text)?;
        return Ok(());
    }

    writeln!(out, "Service configuration:  {}", record.filename.display())?;
    writeln!(out)?;
    writeln!(out, "Current service configuration:")?;
    writeln!(out)?;
    for (key, value) in &record.options {
        writeln!(out, "  {} = {}", key, value)?;
    }
    Ok(())
}

/// Marker paths recorded for the installed service.
fn recorded_markers(registrar: &dyn ServiceRegistrar) -> Result<MarkerPaths, CliError> {
    let intro = || format!("Unable to locate the markers for the '{}' service.", SERVICE_NAME);

    let record = registrar
        .get_config(SERVICE_NAME)
        .map_err(|e| CliError::registrar(intro(), e))?;
    let notify = record
        .require("notify")
        .map_err(|e| CliError::registrar(intro(), e))?;

    Ok(MarkerPaths::from_notify_base(&PathBuf::from(notify)))
}

pub fn stop(
    registrar: &dyn ServiceRegistrar,
    store: &impl MarkerStore,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let markers = recorded_markers(registrar)?;
    store.create(markers.stop())?;

    writeln!(out, "Stop requested via '{}'.", markers.stop().display())?;
    Ok(())
}

/// Create the reload marker and wait for the service to consume it.
pub async fn reload(
    registrar: &dyn ServiceRegistrar,
    store: &impl MarkerStore,
    timeout: Duration,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let markers = recorded_markers(registrar)?;
    store.create(markers.reload())?;

    write!(out, "Service reloading...")?;
    out.flush()?;

    // A timeout too large to represent means wait indefinitely.
    let deadline = Instant::now().checked_add(timeout);
    while store.exists(markers.reload()) {
        if deadline.is_some_and(|deadline| Instant::now() >= deadline) {
            writeln!(out)?;
            return Err(CliError::ReloadTimeout(timeout));
        }
        sleep(RELOAD_POLL_INTERVAL).await;
        write!(out, ".")?;
        out.flush()?;
    }

    writeln!(out)?;
    writeln!(out, "Service successfully reloaded.")?;
    Ok(())
}

pub fn status(
    registrar: &dyn ServiceRegistrar,
    store: &impl MarkerStore,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let record = match registrar.get_config(SERVICE_NAME) {
        Ok(record) => record,
        Err(crate::registrar::RegistrarError::NotInstalled(_)) => {
            writeln!(out, "Service '{}' is not installed.", SERVICE_NAME)?;
            return Ok(());
        }
        Err(e) => {
            return Err(CliError::registrar(
                format!("Unable to read the status of the '{}' service.", SERVICE_NAME),
                e,
            ))
        }
    };

    writeln!(
        out,
        "Service '{}' is installed ({}).",
        SERVICE_NAME,
        record.filename.display()
    )?;

    if let Some(notify) = record.get("notify").filter(|n| !n.is_empty()) {
        let markers = MarkerPaths::from_notify_base(Path::new(notify));
        let pending = |path: &Path| if store.exists(path) { "yes" } else { "no" };
        writeln!(out, "Stop pending:    {}", pending(markers.stop()))?;
        writeln!(out, "Reload pending:  {}", pending(markers.reload()))?;
    }
    Ok(())
}

pub fn unrecognized(args: &[String], out: &mut impl Write) -> Result<(), CliError> {
    let command = args.first().map(String::as_str).unwrap_or_default();
    writeln!(
        out,
        "Command '{}' not recognized.  Supported commands: install, uninstall, dumpconfig, stop, reload, status.",
        command
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::FsMarkerStore;
    use crate::registrar::SystemdRegistrar;
    use std::fs;

    struct Fixture {
        _dir: tempfile::TempDir,
        registrar: SystemdRegistrar,
        executable: PathBuf,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("units")).unwrap();
        let registrar =
            SystemdRegistrar::new(dir.path().join("records"), dir.path().join("units"));
        let executable = dir.path().join("sentinel-service");
        Fixture {
            registrar,
            executable,
            _dir: dir,
        }
    }

    fn installed() -> Fixture {
        let fx = fixture();
        let spec = install_spec(&fx.executable, None, ".notify");
        install(&fx.registrar, &spec, &mut Vec::new()).unwrap();
        fx
    }

    #[test]
    fn test_install_spec_without_config_has_no_args() {
        let spec = install_spec(Path::new("/opt/s"), None, ".notify");
        assert!(spec.args.is_empty());
        assert_eq!(spec.options.notify.as_deref(), Some(Path::new("/opt/s.notify")));

        let spec = install_spec(Path::new("/opt/s"), Some(Path::new("/etc/s.toml")), ".sig");
        assert_eq!(spec.args, vec!["--config", "/etc/s.toml"]);
        assert_eq!(spec.options.notify.as_deref(), Some(Path::new("/opt/s.sig")));
    }

    #[test]
    fn test_install_then_dumpconfig() {
        let fx = installed();

        let mut out = Vec::new();
        dump_config(&fx.registrar, false, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.starts_with("Service configuration:  "));
        assert!(text.contains("\nCurrent service configuration:\n\n"));
        assert!(text.contains(&format!("  notify = {}.notify\n", fx.executable.display())));
        assert!(text.contains("  nix_group = \n"));
    }

    #[test]
    fn test_dumpconfig_json() {
        let fx = installed();

        let mut out = Vec::new();
        dump_config(&fx.registrar, true, &mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["options"]["dir"], "");
    }

    #[test]
    fn test_install_twice_reports_code() {
        let fx = installed();
        let spec = install_spec(&fx.executable, None, ".notify");

        let err = install(&fx.registrar, &spec, &mut Vec::new()).unwrap_err();
        assert_eq!(err.code(), Some("already_installed"));
        assert!(err.to_string().contains("Unable to install"));
    }

    #[test]
    fn test_uninstall_not_installed() {
        let fx = fixture();
        let err = uninstall(&fx.registrar, &mut Vec::new()).unwrap_err();
        assert_eq!(err.code(), Some("not_installed"));
    }

    #[test]
    fn test_stop_creates_recorded_marker() {
        let fx = installed();

        stop(&fx.registrar, &FsMarkerStore, &mut Vec::new()).unwrap();

        let markers = MarkerPaths::for_executable(&fx.executable, ".notify");
        assert!(markers.stop().exists());
        assert!(!markers.reload().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_times_out_without_a_running_service() {
        let fx = installed();

        let mut out = Vec::new();
        let err = reload(&fx.registrar, &FsMarkerStore, Duration::from_secs(3), &mut out)
            .await
            .unwrap_err();

        assert!(matches!(err, CliError::ReloadTimeout(_)));
        let markers = MarkerPaths::for_executable(&fx.executable, ".notify");
        assert!(markers.reload().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_with_unbounded_timeout_keeps_waiting() {
        let fx = installed();

        let waited = tokio::time::timeout(
            Duration::from_secs(10),
            reload(&fx.registrar, &FsMarkerStore, Duration::from_secs(u64::MAX), &mut Vec::new()),
        )
        .await;

        assert!(waited.is_err());
        let markers = MarkerPaths::for_executable(&fx.executable, ".notify");
        assert!(markers.reload().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_returns_once_marker_is_consumed() {
        let fx = installed();
        let markers = MarkerPaths::for_executable(&fx.executable, ".notify");

        let consumer = async {
            sleep(Duration::from_millis(2_500)).await;
            FsMarkerStore.remove(markers.reload()).unwrap();
        };
        let mut out = Vec::new();
        let (result, ()) = tokio::join!(
            reload(&fx.registrar, &FsMarkerStore, Duration::from_secs(u64::MAX), &mut out),
            consumer
        );

        result.unwrap();
        assert!(String::from_utf8(out).unwrap().ends_with("Service successfully reloaded.\n"));
    }

    #[test]
    fn test_status_reports_pending_markers() {
        let fx = installed();
        let markers = MarkerPaths::for_executable(&fx.executable, ".notify");
        FsMarkerStore.create(markers.reload()).unwrap();

        let mut out = Vec::new();
        status(&fx.registrar, &FsMarkerStore, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("is installed"));
        assert!(text.contains("Stop pending:    no"));
        assert!(text.contains("Reload pending:  yes"));
    }

    #[test]
    fn test_status_not_installed_is_not_an_error() {
        let fx = fixture();
        let mut out = Vec::new();
        status(&fx.registrar, &FsMarkerStore, &mut out).unwrap();
        assert!(String::from_utf8(out).unwrap().contains("is not installed"));
    }

    #[test]
    fn test_unrecognized_command() {
        let mut out = Vec::new();
        unrecognized(&["frobnicate".to_string()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Command 'frobnicate' not recognized."));
    }
}
