//! Sentinel service.
//!
//! A do-nothing service body plus the commands to install it.
//!
//! # Architecture Overview
//!
//! ```text
//!   sentinel-service            (no args)
//!        │
//!        ▼
//!   ┌──────────────┐   every check interval   ┌──────────────────────┐
//!   │ service loop │ ───────────────────────▶ │ <exe>.notify.stop    │ → exit
//!   │  idle work   │                          │ <exe>.notify.reload  │ → reload, delete
//!   └──────────────┘                          └──────────────────────┘
//!
//!   sentinel-service install | uninstall | dumpconfig | stop | reload | status
//!        │
//!        ▼
//!   ┌──────────────┐        ┌─────────────────────────────────────────┐
//!   │  registrar   │ ─────▶ │ <storage_dir>/<name>, <unit_dir>/*.service │
//!   └──────────────┘        └─────────────────────────────────────────┘
//! ```

use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Duration;

use sentinel_service::cli::{commands, Cli, CliError, Command};
use sentinel_service::config::load_or_default;
use sentinel_service::lifecycle::{FsMarkerStore, MarkerPaths, ServiceLoop};
use sentinel_service::observability::init_logging;
use sentinel_service::registrar::{ServiceRegistrar, SystemdRegistrar};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse_lenient(std::env::args_os()).unwrap_or_else(|e| e.exit());

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(dir) = cli.storage_dir {
        config.registrar.storage_dir = dir;
    }
    if let Some(dir) = cli.unit_dir {
        config.registrar.unit_dir = dir;
    }

    init_logging(&config.observability);

    let executable = std::env::current_exe()?;

    let Some(command) = cli.command else {
        let markers = MarkerPaths::for_executable(&executable, &config.lifecycle.notify_suffix);
        let mut service = ServiceLoop::new(markers, FsMarkerStore, config.lifecycle);
        if let Some(path) = cli.config {
            service = service.with_config_path(path);
        }

        tracing::info!(executable = %executable.display(), "sentinel-service starting");
        service.run().await;
        tracing::info!("Shutdown complete");
        return Ok(ExitCode::SUCCESS);
    };

    let registrar = SystemdRegistrar::from_config(&config.registrar);
    let mut out = io::stdout().lock();

    if !matches!(
        command,
        Command::Unrecognized(_) | Command::DumpConfig { json: true }
    ) {
        writeln!(out, "Service registrar:  {}", registrar.describe())?;
        writeln!(out)?;
    }

    let result = match command {
        Command::Install => {
            let config_path = cli.config.as_deref().map(std::path::absolute).transpose()?;
            let spec = commands::install_spec(
                &executable,
                config_path.as_deref(),
                &config.lifecycle.notify_suffix,
            );
            commands::install(&registrar, &spec, &mut out)
        }
        Command::Uninstall => commands::uninstall(&registrar, &mut out),
        Command::DumpConfig { json } => commands::dump_config(&registrar, json, &mut out),
        Command::Stop => commands::stop(&registrar, &FsMarkerStore, &mut out),
        Command::Reload { timeout_secs } => {
            commands::reload(
                &registrar,
                &FsMarkerStore,
                Duration::from_secs(timeout_secs),
                &mut out,
            )
            .await
        }
        Command::Status => commands::status(&registrar, &FsMarkerStore, &mut out),
        Command::Unrecognized(args) => commands::unrecognized(&args, &mut out),
    };

    Ok(exit_code(result))
}

fn exit_code(result: Result<(), CliError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!(error = ?e, code = ?e.code(), "Command failed");
            let _ = e.report(&mut io::stderr().lock());
            ExitCode::FAILURE
        }
    }
}
