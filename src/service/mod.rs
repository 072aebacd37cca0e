//! systemd service management for the bouheki agent.
//!
//! [`UnitSpec`] renders the unit file. [`SystemdService`] installs it, runs
//! `daemon-reload` when it changed, and starts or stops the service. All
//! privileged steps go through [`PrivilegedExec`].

use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::exec::PrivilegedExec;

/// The contents of the agent's systemd unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitSpec {
    pub description: String,
    pub binary: PathBuf,
    pub config_file: PathBuf,
    pub restart_sec: u32,
}

impl UnitSpec {
    pub fn new(description: impl Into<String>, binary: &Path, config_file: &Path) -> Self {
        Self {
            description: description.into(),
            binary: binary.to_path_buf(),
            config_file: config_file.to_path_buf(),
            restart_sec: 10,
        }
    }

    /// Render the unit file text.
    pub fn render(&self) -> String {
        format!(
            "[Unit]\n\
             Description={description}\n\
             After=network.target\n\
             \n\
             [Service]\n\
             Type=simple\n\
             User=root\n\
             Group=root\n\
             ExecStart={binary} --config {config}\n\
             Restart=always\n\
             RestartSec={restart_sec}\n\
             [Install]\n\
             WantedBy=multi-user.target\n",
            description = self.description,
            binary = self.binary.display(),
            config = self.config_file.display(),
            restart_sec = self.restart_sec,
        )
    }
}

/// Registers and drives the agent's background service.
pub trait ServiceControl {
    /// Install the unit, leaving an identical existing unit untouched.
    fn install_service(&self, unit: &UnitSpec) -> Result<()>;
    /// Start the service, or restart it if it is already running.
    fn start(&self) -> Result<()>;
    fn stop(&self) -> Result<()>;
    fn is_active(&self) -> Result<bool>;
}

impl<T: ServiceControl + ?Sized> ServiceControl for &T {
    fn install_service(&self, unit: &UnitSpec) -> Result<()> {
        (**self).install_service(unit)
    }

    fn start(&self) -> Result<()> {
        (**self).start()
    }

    fn stop(&self) -> Result<()> {
        (**self).stop()
    }

    fn is_active(&self) -> Result<bool> {
        (**self).is_active()
    }
}

/// [`ServiceControl`] backed by `systemctl`.
pub struct SystemdService<E> {
    exec: E,
    name: String,
    unit_path: PathBuf,
    staging_dir: PathBuf,
}

impl<E: PrivilegedExec> SystemdService<E> {
    pub fn new(
        exec: E,
        name: impl Into<String>,
        unit_path: impl Into<PathBuf>,
        staging_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            exec,
            name: name.into(),
            unit_path: unit_path.into(),
            staging_dir: staging_dir.into(),
        }
    }

    /// Whether the installed unit already has exactly this content.
    pub fn unit_is_current(&self, unit: &UnitSpec) -> bool {
        std::fs::read_to_string(&self.unit_path)
            .map(|installed| installed == unit.render())
            .unwrap_or(false)
    }

    fn systemctl(&self, verb: &str) -> Result<()> {
        self.exec.run("systemctl", &[verb, &self.name])
    }
}

impl<E: PrivilegedExec> ServiceControl for SystemdService<E> {
    fn install_service(&self, unit: &UnitSpec) -> Result<()> {
        if self.unit_is_current(unit) {
            info!("{} is up to date", self.unit_path.display());
            return Ok(());
        }

        std::fs::create_dir_all(&self.staging_dir)?;
        let staged = self.staging_dir.join(format!("{}.service", self.name));
        std::fs::write(&staged, unit.render())?;

        let src = staged.to_string_lossy().to_string();
        let dst = self.unit_path.to_string_lossy().to_string();
        self.exec.run("cp", &[&src, &dst])?;
        self.exec.run("systemctl", &["daemon-reload"])?;

        info!("Installed unit {}", self.unit_path.display());
        Ok(())
    }

    fn start(&self) -> Result<()> {
        if self.is_active()? {
            info!("{} is running, restarting", self.name);
            self.systemctl("restart")
        } else {
            info!("Starting {}", self.name);
            self.systemctl("start")
        }
    }

    fn stop(&self) -> Result<()> {
        info!("Stopping {}", self.name);
        self.systemctl("stop")
    }

    fn is_active(&self) -> Result<bool> {
        self.exec
            .probe("systemctl", &["is-active", "--quiet", &self.name])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    struct FakeExec {
        active: Cell<bool>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeExec {
        fn new(active: bool) -> Self {
            Self {
                active: Cell::new(active),
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl PrivilegedExec for FakeExec {
        fn run(&self, program: &str, args: &[&str]) -> Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("{} {}", program, args.join(" ")));
            // Emulate the copy so a second install sees the new unit.
            if program == "cp" {
                std::fs::copy(args[0], args[1])?;
            }
            Ok(())
        }

        fn probe(&self, _program: &str, _args: &[&str]) -> Result<bool> {
            Ok(self.active.get())
        }
    }

    fn unit() -> UnitSpec {
        UnitSpec::new(
            "bouheki",
            Path::new("/usr/local/bin/bouheki"),
            Path::new("/tmp/bouheki/hardening-github-actions.yaml"),
        )
    }

    #[test]
    fn render_matches_expected_unit() {
        let expected = "[Unit]
Description=bouheki
After=network.target

[Service]
Type=simple
User=root
Group=root
ExecStart=/usr/local/bin/bouheki --config /tmp/bouheki/hardening-github-actions.yaml
Restart=always
RestartSec=10
[Install]
WantedBy=multi-user.target
";
        assert_eq!(unit().render(), expected);
    }

    #[test]
    fn install_copies_unit_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let unit_path = dir.path().join("bouheki.service");
        let exec = FakeExec::new(false);
        let service = SystemdService::new(&exec, "bouheki", &unit_path, dir.path().join("staging"));

        service.install_service(&unit()).unwrap();

        let calls = exec.calls.borrow();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].starts_with("cp "));
        assert_eq!(calls[1], "systemctl daemon-reload");
        assert_eq!(std::fs::read_to_string(&unit_path).unwrap(), unit().render());
    }

    #[test]
    fn identical_unit_is_not_reinstalled() {
        let dir = tempfile::tempdir().unwrap();
        let unit_path = dir.path().join("bouheki.service");
        std::fs::write(&unit_path, unit().render()).unwrap();
        let exec = FakeExec::new(false);
        let service = SystemdService::new(&exec, "bouheki", &unit_path, dir.path());

        service.install_service(&unit()).unwrap();
        assert!(exec.calls.borrow().is_empty());
    }

    #[test]
    fn changed_unit_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let unit_path = dir.path().join("bouheki.service");
        std::fs::write(&unit_path, "[Unit]\nDescription=old\n").unwrap();
        let exec = FakeExec::new(false);
        let service = SystemdService::new(&exec, "bouheki", &unit_path, dir.path().join("staging"));

        service.install_service(&unit()).unwrap();
        assert!(service.unit_is_current(&unit()));
        assert_eq!(exec.calls.borrow().len(), 2);
    }

    #[test]
    fn start_when_inactive() {
        let exec = FakeExec::new(false);
        let service = SystemdService::new(&exec, "bouheki", "/unused", "/unused");
        service.start().unwrap();
        assert_eq!(*exec.calls.borrow(), vec!["systemctl start bouheki"]);
    }

    #[test]
    fn restart_when_already_active() {
        let exec = FakeExec::new(true);
        let service = SystemdService::new(&exec, "bouheki", "/unused", "/unused");
        service.start().unwrap();
        assert_eq!(*exec.calls.borrow(), vec!["systemctl restart bouheki"]);
    }

    #[test]
    fn stop_calls_systemctl_stop() {
        let exec = FakeExec::new(true);
        let service = SystemdService::new(&exec, "bouheki", "/unused", "/unused");
        service.stop().unwrap();
        assert_eq!(*exec.calls.borrow(), vec!["systemctl stop bouheki"]);
    }
}
