//! Registrar backed by a service record plus a systemd unit file.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RegistrarConfig;
use crate::lifecycle::markers::{notify_base, MarkerPaths, DEFAULT_NOTIFY_SUFFIX};
use crate::registrar::args::{join_args, quote_arg};
use crate::registrar::{
    validate_service_name, InstallReport, RegistrarError, RegistrarResult, ServiceRecord,
    ServiceRegistrar, ServiceSpec,
};

const UNIT_TEMPLATE: &str = r#"[Unit]
Description=@SERVICENAME@
After=network.target

[Service]
Type=simple
ExecStartPre=/bin/rm -f @STOPMARKER@ @RELOADMARKER@
ExecStart=@EXECSTART@
ExecReload=/bin/touch @RELOADMARKER@
@EXTRA@Restart=on-failure
RestartSec=10

[Install]
WantedBy=multi-user.target
"#;

/// Writes `<storage_dir>/<name>` and `<unit_dir>/<name>.service`.
#[derive(Debug, Clone)]
pub struct SystemdRegistrar {
    storage_dir: PathBuf,
    unit_dir: PathBuf,
}

impl SystemdRegistrar {
    pub fn new(storage_dir: impl Into<PathBuf>, unit_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            unit_dir: unit_dir.into(),
        }
    }

    pub fn from_config(config: &RegistrarConfig) -> Self {
        Self::new(&config.storage_dir, &config.unit_dir)
    }

    pub fn record_path(&self, name: &str) -> PathBuf {
        self.storage_dir.join(name)
    }

    pub fn unit_path(&self, name: &str) -> PathBuf {
        self.unit_dir.join(format!("{}.service", name))
    }

    fn build_record(&self, name: &str, spec: &ServiceSpec) -> ServiceRecord {
        let record_path = self.record_path(name);
        let options = &spec.options;
        let display = |p: &Option<PathBuf>| {
            p.as_deref()
                .map(|p| p.to_string_lossy().into_owned())
                .unwrap_or_default()
        };

        let notify = options
            .notify
            .clone()
            .unwrap_or_else(|| notify_base(&spec.executable, DEFAULT_NOTIFY_SUFFIX));

        let mut record = ServiceRecord::new(record_path);
        record.push("notify", notify.to_string_lossy());
        record.push("dir", display(&options.dir));
        record.push("cmd", join_args(spec.command_line()));
        record.push("pid", display(&options.pid));
        record.push("log", display(&options.log));
        record.push(
            "wait",
            options.wait.map(|w| w.to_string()).unwrap_or_default(),
        );
        record.push("nix_user", options.nix_user.clone().unwrap_or_default());
        record.push("nix_group", options.nix_group.clone().unwrap_or_default());
        record
    }

    fn render_unit(name: &str, record: &ServiceRecord) -> String {
        let mut extra = String::new();
        for (key, directive) in [
            ("dir", "WorkingDirectory"),
            ("pid", "PIDFile"),
            ("nix_user", "User"),
            ("nix_group", "Group"),
            ("wait", "TimeoutStopSec"),
        ] {
            if let Some(value) = record.get(key).filter(|v| !v.is_empty()) {
                extra.push_str(&format!("{}={}\n", directive, escape_specifiers(value)));
            }
        }

        let markers = MarkerPaths::from_notify_base(Path::new(
            record.get("notify").unwrap_or_default(),
        ));
        let quote_path = |p: &Path| escape_command(&quote_arg(&p.to_string_lossy()));

        UNIT_TEMPLATE
            .replace("@SERVICENAME@", name)
            .replace("@EXECSTART@", &escape_command(record.get("cmd").unwrap_or_default()))
            .replace("@STOPMARKER@", &quote_path(markers.stop()))
            .replace("@RELOADMARKER@", &quote_path(markers.reload()))
            .replace("@EXTRA@", &extra)
    }
}

impl ServiceRegistrar for SystemdRegistrar {
    fn describe(&self) -> String {
        format!(
            "systemd (records in '{}', units in '{}')",
            self.storage_dir.display(),
            self.unit_dir.display()
        )
    }

    fn install(&self, name: &str, spec: &ServiceSpec) -> RegistrarResult<InstallReport> {
        validate_service_name(name)?;
        spec.validate()?;

        let record_path = self.record_path(name);
        let unit_path = self.unit_path(name);
        if record_path.exists() || unit_path.exists() {
            return Err(RegistrarError::AlreadyInstalled(name.to_string()));
        }

        fs::create_dir_all(&self.storage_dir)
            .map_err(|e| RegistrarError::io("create", &self.storage_dir, e))?;

        let record = self.build_record(name, spec);
        fs::write(&record_path, record.render())
            .map_err(|e| RegistrarError::io("create", &record_path, e))?;

        if let Err(e) = fs::write(&unit_path, Self::render_unit(name, &record)) {
            // Don't leave a record without a unit.
            let _ = fs::remove_file(&record_path);
            return Err(RegistrarError::io("create", &unit_path, e));
        }

        tracing::info!(
            service = name,
            record = %record_path.display(),
            unit = %unit_path.display(),
            "Service installed"
        );

        Ok(InstallReport {
            record_path,
            unit_path,
        })
    }

    fn uninstall(&self, name: &str) -> RegistrarResult<()> {
        validate_service_name(name)?;

        let record_path = self.record_path(name);
        let unit_path = self.unit_path(name);
        if !record_path.exists() && !unit_path.exists() {
            return Err(RegistrarError::NotInstalled(name.to_string()));
        }

        remove_if_present(&unit_path)?;
        remove_if_present(&record_path)?;

        tracing::info!(service = name, "Service uninstalled");
        Ok(())
    }

    fn get_config(&self, name: &str) -> RegistrarResult<ServiceRecord> {
        validate_service_name(name)?;

        let record_path = self.record_path(name);
        let content = match fs::read_to_string(&record_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(RegistrarError::NotInstalled(name.to_string()));
            }
            Err(e) => return Err(RegistrarError::io("read", &record_path, e)),
        };

        ServiceRecord::parse(&record_path, &content)
    }
}

/// Keep systemd from expanding `%` specifiers in a directive value.
fn escape_specifiers(value: &str) -> String {
    value.replace('%', "%%")
}

/// Command lines also expand `$VAR`, so escape both.
fn escape_command(value: &str) -> String {
    escape_specifiers(value).replace('$', "$$")
}

fn remove_if_present(path: &Path) -> RegistrarResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(RegistrarError::io("delete", path, e)),
    }
}
